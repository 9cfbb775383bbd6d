//! Emulator driver: load a raw image and run it to completion.
//!
//! The process exit code is the guest's `a0` on a normal `exit` syscall,
//! and 1 on any emulator error.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use riscv32_emu::{Machine, RunOutcome, TraceLevel, DEFAULT_MAX_STEPS, MEMORY_SIZE};

#[derive(Parser, Debug)]
#[command(version, about = "Run a raw RV32I binary image")]
struct Args {
    /// Print a per-step disassembly trace and a final register dump.
    #[arg(long)]
    debug: bool,

    /// Memory image size in bytes. The default 16 MiB image does not back
    /// the stack region at 0x80000000; pass a larger size if the guest
    /// uses the stack.
    #[arg(long, default_value_t = MEMORY_SIZE, value_parser = parse_u32)]
    memory_size: u32,

    /// Maximum number of steps before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: u64,

    /// Raw binary image produced by the assembler.
    program: String,

    /// Load address (and initial PC); `0x` hex accepted.
    #[arg(default_value = "0", value_parser = parse_u32)]
    load_address: u32,
}

fn parse_u32(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|err| format!("invalid number `{text}`: {err}"))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let image = match fs::read(&args.program) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", args.program);
            return ExitCode::FAILURE;
        }
    };

    let mut machine = Machine::with_memory_size(args.memory_size);
    if let Err(err) = machine.load_image(&image, args.load_address) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    machine.cpu_mut().set_pc(args.load_address);
    if args.debug {
        machine.set_trace_level(TraceLevel::Steps);
        eprintln!(
            "Loaded {} bytes at {:#010x}, sp = {:#010x}",
            image.len(),
            args.load_address,
            machine.cpu().get_register(2)
        );
    }

    let outcome = machine.run(args.max_steps);

    if args.debug {
        eprint!("{}", machine.trace().format());
        eprint!("{}", machine.cpu().dump_state());
    }

    match outcome {
        RunOutcome::Exited { code, .. } => {
            if args.debug {
                eprintln!("Program exited with status: {code}");
            }
            ExitCode::from(code as u8)
        }
        RunOutcome::Faulted { status, steps } => {
            eprintln!("error: {status} after {steps} steps (pc = {:#010x})", machine.cpu().get_pc());
            if !args.debug {
                eprint!("{}", machine.cpu().dump_state());
            }
            ExitCode::FAILURE
        }
        RunOutcome::StepLimit { steps } => {
            eprintln!("error: step limit of {steps} reached");
            ExitCode::FAILURE
        }
    }
}
