//! RV32I instruction set primitives.
//!
//! This crate provides the pieces of the base integer ISA that both the
//! assembler and the emulator need: register naming, the six instruction
//! encoders, the decoder, and a disassembler for trace output.

mod decode;
mod disasm;
mod encode;
mod regs;

pub use decode::{sign_extend, DecodeError, Inst};
pub use disasm::{disassemble, disassemble_code};
pub use encode::*;
pub use regs::Gpr;
