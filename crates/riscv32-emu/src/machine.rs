//! Integration glue: one CPU plus one memory image, a loader, and the
//! step loop.

use thiserror::Error;

use crate::cpu::{Cpu, StepStatus};
use crate::memory::Memory;
use crate::trace::{StepTrace, TraceBuffer, TraceLevel};

/// Default cap on the number of steps a [`Machine::run`] call will take.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Failure to place a program image into memory.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    #[error(
        "program of {size} bytes does not fit at {load_addr:#010x} (memory is {memory_size} bytes)"
    )]
    TooLarge {
        size: u64,
        load_addr: u32,
        memory_size: u32,
    },
}

/// How a bounded run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The guest called `exit`; `code` is its `a0`.
    Exited { code: u32, steps: u64 },
    /// A step returned a non-ok status.
    Faulted { status: StepStatus, steps: u64 },
    /// The step cap was reached with the guest still running.
    StepLimit { steps: u64 },
}

/// A complete emulator instance.
pub struct Machine {
    cpu: Cpu,
    memory: Memory,
    trace_level: TraceLevel,
    trace: TraceBuffer,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// A machine with the default 16 MiB image.
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            memory: Memory::new(),
            trace_level: TraceLevel::Off,
            trace: TraceBuffer::new(),
        }
    }

    /// A machine with a caller-chosen memory size.
    pub fn with_memory_size(size: u32) -> Self {
        Self {
            cpu: Cpu::new(),
            memory: Memory::with_size(size),
            trace_level: TraceLevel::Off,
            trace: TraceBuffer::new(),
        }
    }

    pub fn set_trace_level(&mut self, level: TraceLevel) {
        self.trace_level = level;
    }

    /// The recorded step traces (bounded; oldest entries are dropped).
    pub fn trace(&self) -> &TraceBuffer {
        &self.trace
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Copy an assembled image into memory at `load_addr`.
    pub fn load_image(&mut self, image: &[u8], load_addr: u32) -> Result<(), LoadError> {
        let end = load_addr as u64 + image.len() as u64;
        if end > self.memory.size() as u64 {
            return Err(LoadError::TooLarge {
                size: image.len() as u64,
                load_addr,
                memory_size: self.memory.size(),
            });
        }
        let start = load_addr as usize;
        self.memory.data_mut()[start..start + image.len()].copy_from_slice(image);
        Ok(())
    }

    /// One step, recording a trace entry when tracing is enabled.
    pub fn step(&mut self) -> StepStatus {
        let pc = self.cpu.get_pc();
        let status = self.cpu.step(&mut self.memory);
        if self.trace_level != TraceLevel::Off {
            let word = self.memory.read32(pc).ok();
            self.trace.push(StepTrace { pc, word, status });
        }
        status
    }

    /// Run until the guest exits, a step faults, or `max_steps` is
    /// reached.
    pub fn run(&mut self, max_steps: u64) -> RunOutcome {
        let mut steps = 0u64;
        while steps < max_steps {
            let status = self.step();
            steps += 1;
            match status {
                StepStatus::Ok => {}
                StepStatus::SyscallExit => {
                    return RunOutcome::Exited {
                        code: self.cpu.get_register(10),
                        steps,
                    };
                }
                fault => return RunOutcome::Faulted { status: fault, steps },
            }
        }
        RunOutcome::StepLimit { steps }
    }
}
