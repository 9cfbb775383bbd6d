//! Shared helpers for end-to-end tests: assemble source text, load it at
//! address 0, and run it.

use riscv32_asm::assemble;
use riscv32_emu::{Machine, RunOutcome, DEFAULT_MAX_STEPS};

pub fn run_asm(source: &str) -> (Machine, RunOutcome) {
    let image = assemble(source).expect("assembly failed");
    let mut machine = Machine::new();
    machine.load_image(image.as_bytes(), 0).expect("image too large");
    machine.cpu_mut().set_pc(0);
    let outcome = machine.run(DEFAULT_MAX_STEPS);
    (machine, outcome)
}

/// Run a program and require a normal exit with the given code.
pub fn expect_exit(source: &str, code: u32) -> Machine {
    let (machine, outcome) = run_asm(source);
    match outcome {
        RunOutcome::Exited { code: actual, .. } => {
            assert_eq!(
                actual, code,
                "expected exit code {code}, got {actual}\n{}",
                machine.cpu().dump_state()
            );
        }
        other => panic!("expected exit, got {other:?}\n{}", machine.cpu().dump_state()),
    }
    machine
}
