//! RV32I fetch-decode-execute emulator.
//!
//! A flat byte-addressable little-endian [`Memory`], a [`Cpu`] stepping
//! one instruction at a time, a minimal Linux-style syscall surface, and
//! the [`Machine`] glue that loads a raw image and runs the step loop.
//!
//! The conceptual stack region `[STACK_BASE, STACK_TOP)` is *not* backed
//! by the default 16 MiB image even though `sp` starts at [`STACK_TOP`];
//! programs that use the stack need [`Machine::with_memory_size`] with at
//! least `STACK_TOP` bytes, or must point `sp` somewhere inside the
//! image.

mod cpu;
mod machine;
mod memory;
mod syscall;
mod trace;

pub use cpu::{Cpu, StepStatus, STACK_BASE, STACK_SIZE, STACK_TOP};
pub use machine::{LoadError, Machine, RunOutcome, DEFAULT_MAX_STEPS};
pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use trace::{StepTrace, TraceBuffer, TraceLevel, TRACE_CAPACITY};
