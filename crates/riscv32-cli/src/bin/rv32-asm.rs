//! Assembler driver: translate one source file into a raw binary image.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use riscv32_asm::{Assembler, Image};

#[derive(Parser, Debug)]
#[command(version, about = "Assemble RV32I source into a raw binary image")]
struct Args {
    /// Print the resolved label table and section layout.
    #[arg(long)]
    debug: bool,

    /// Assembly source file.
    input: String,

    /// Output binary image.
    output: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", args.input);
            return ExitCode::FAILURE;
        }
    };

    let mut assembler = Assembler::new();
    let image = match run_passes(&mut assembler, &source) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if args.debug {
        println!("Sections:");
        for section in assembler.sections() {
            println!(
                "  {:<12} {:5} bytes at {:#010x}",
                section.name, section.size, section.base_addr
            );
        }
        println!("Labels:");
        for (name, label) in assembler.labels() {
            println!("  {name:<20} {:#010x} ({})", label.offset, label.section);
        }
    }

    if let Err(err) = fs::write(&args.output, image.as_bytes()) {
        eprintln!("error: cannot write {}: {err}", args.output);
        return ExitCode::FAILURE;
    }

    println!("Assembled successfully.");
    println!(
        "Text: {} bytes, Data: {} bytes, Labels: {}",
        assembler.text_size(),
        assembler.data_size(),
        assembler.label_count()
    );
    ExitCode::SUCCESS
}

fn run_passes(assembler: &mut Assembler, source: &str) -> Result<Image, riscv32_asm::AsmError> {
    assembler.first_pass(source)?;
    assembler.relocate();
    let mut image = Image::with_len(assembler.total_size());
    assembler.second_pass(source, &mut image)?;
    Ok(image)
}
