//! RV32I instruction encoders.
//!
//! The six `encode_*` functions splice already-validated fields into a
//! 32-bit machine word, one per instruction format. The branch and jump
//! encoders take *byte* offsets and discard the word-aligned low bit
//! themselves; the U-type encoder takes the pre-shifted value and keeps
//! bits [31:12].
//!
//! On top of those, one helper per RV32I mnemonic builds the word from
//! typed operands. These are what the assembler's encoding table and the
//! emulator tests use.

use crate::regs::Gpr;

/// Encode an R-type (register-register) instruction.
pub fn encode_r(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

/// Encode an I-type (immediate) instruction. The immediate is taken modulo
/// 4096 (low 12 bits).
pub fn encode_i(imm: i32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    ((imm as u32 & 0xFFF) << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

/// Encode an S-type (store) instruction, splitting the 12-bit immediate
/// into its [11:5] and [4:0] fields.
pub fn encode_s(imm: i32, rs2: u32, rs1: u32, funct3: u32, opcode: u32) -> u32 {
    ((imm as u32 & 0xFE0) << 20)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | ((imm as u32 & 0x1F) << 7)
        | opcode
}

/// Encode a B-type (branch) instruction from a 13-bit signed *byte* offset.
pub fn encode_b(imm: i32, rs2: u32, rs1: u32, funct3: u32, opcode: u32) -> u32 {
    let u = (imm >> 1) as u32;
    (((u >> 11) & 0x1) << 31)
        | (((u >> 4) & 0x3F) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | ((u & 0xF) << 8)
        | (((u >> 10) & 0x1) << 7)
        | opcode
}

/// Encode a U-type (upper-immediate) instruction. The immediate is already
/// pre-shifted; only bits [31:12] are kept.
pub fn encode_u(imm: i32, rd: u32, opcode: u32) -> u32 {
    (imm as u32 & 0xFFFF_F000) | (rd << 7) | opcode
}

/// Encode a J-type (jump) instruction from a 21-bit signed *byte* offset.
pub fn encode_j(imm: i32, rd: u32, opcode: u32) -> u32 {
    let u = (imm >> 1) as u32;
    (((u >> 19) & 0x1) << 31)
        | ((u & 0x3FF) << 21)
        | (((u >> 10) & 0x1) << 20)
        | (((u >> 11) & 0xFF) << 12)
        | (rd << 7)
        | opcode
}

macro_rules! r_type {
    ($($(#[$doc:meta])* $name:ident => ($funct7:expr, $funct3:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(rd: Gpr, rs1: Gpr, rs2: Gpr) -> u32 {
                encode_r($funct7, rs2.num() as u32, rs1.num() as u32, $funct3, rd.num() as u32, 0x33)
            }
        )*
    };
}

r_type! {
    /// `add rd, rs1, rs2`
    add => (0x00, 0x0);
    /// `sub rd, rs1, rs2`
    sub => (0x20, 0x0);
    /// `sll rd, rs1, rs2`
    sll => (0x00, 0x1);
    /// `slt rd, rs1, rs2`
    slt => (0x00, 0x2);
    /// `sltu rd, rs1, rs2`
    sltu => (0x00, 0x3);
    /// `xor rd, rs1, rs2`
    xor => (0x00, 0x4);
    /// `srl rd, rs1, rs2`
    srl => (0x00, 0x5);
    /// `sra rd, rs1, rs2`
    sra => (0x20, 0x5);
    /// `or rd, rs1, rs2`
    or => (0x00, 0x6);
    /// `and rd, rs1, rs2`
    and => (0x00, 0x7);
}

macro_rules! i_alu {
    ($($(#[$doc:meta])* $name:ident => $funct3:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(rd: Gpr, rs1: Gpr, imm: i32) -> u32 {
                encode_i(imm, rs1.num() as u32, $funct3, rd.num() as u32, 0x13)
            }
        )*
    };
}

i_alu! {
    /// `addi rd, rs1, imm`
    addi => 0x0;
    /// `slti rd, rs1, imm`
    slti => 0x2;
    /// `sltiu rd, rs1, imm`
    sltiu => 0x3;
    /// `xori rd, rs1, imm`
    xori => 0x4;
    /// `ori rd, rs1, imm`
    ori => 0x6;
    /// `andi rd, rs1, imm`
    andi => 0x7;
}

/// `slli rd, rs1, shamt`
pub fn slli(rd: Gpr, rs1: Gpr, shamt: u32) -> u32 {
    encode_r(0x00, shamt & 0x1F, rs1.num() as u32, 0x1, rd.num() as u32, 0x13)
}

/// `srli rd, rs1, shamt`
pub fn srli(rd: Gpr, rs1: Gpr, shamt: u32) -> u32 {
    encode_r(0x00, shamt & 0x1F, rs1.num() as u32, 0x5, rd.num() as u32, 0x13)
}

/// `srai rd, rs1, shamt`
pub fn srai(rd: Gpr, rs1: Gpr, shamt: u32) -> u32 {
    encode_r(0x20, shamt & 0x1F, rs1.num() as u32, 0x5, rd.num() as u32, 0x13)
}

macro_rules! load {
    ($($(#[$doc:meta])* $name:ident => $funct3:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(rd: Gpr, rs1: Gpr, imm: i32) -> u32 {
                encode_i(imm, rs1.num() as u32, $funct3, rd.num() as u32, 0x03)
            }
        )*
    };
}

load! {
    /// `lb rd, imm(rs1)`
    lb => 0x0;
    /// `lh rd, imm(rs1)`
    lh => 0x1;
    /// `lw rd, imm(rs1)`
    lw => 0x2;
    /// `lbu rd, imm(rs1)`
    lbu => 0x4;
    /// `lhu rd, imm(rs1)`
    lhu => 0x5;
}

macro_rules! store {
    ($($(#[$doc:meta])* $name:ident => $funct3:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
                encode_s(imm, rs2.num() as u32, rs1.num() as u32, $funct3, 0x23)
            }
        )*
    };
}

store! {
    /// `sb rs2, imm(rs1)` -- stores the low byte of `rs2`
    sb => 0x0;
    /// `sh rs2, imm(rs1)` -- stores the low half of `rs2`
    sh => 0x1;
    /// `sw rs2, imm(rs1)`
    sw => 0x2;
}

macro_rules! branch {
    ($($(#[$doc:meta])* $name:ident => $funct3:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
                encode_b(imm, rs2.num() as u32, rs1.num() as u32, $funct3, 0x63)
            }
        )*
    };
}

branch! {
    /// `beq rs1, rs2, offset` (byte offset from the branch itself)
    beq => 0x0;
    /// `bne rs1, rs2, offset`
    bne => 0x1;
    /// `blt rs1, rs2, offset`
    blt => 0x4;
    /// `bge rs1, rs2, offset`
    bge => 0x5;
    /// `bltu rs1, rs2, offset`
    bltu => 0x6;
    /// `bgeu rs1, rs2, offset`
    bgeu => 0x7;
}

/// `jal rd, offset` (byte offset from the jump itself)
pub fn jal(rd: Gpr, imm: i32) -> u32 {
    encode_j(imm, rd.num() as u32, 0x6F)
}

/// `jalr rd, rs1, imm`
pub fn jalr(rd: Gpr, rs1: Gpr, imm: i32) -> u32 {
    encode_i(imm, rs1.num() as u32, 0x0, rd.num() as u32, 0x67)
}

/// `lui rd, imm20` -- `imm20` is the 20-bit value placed in bits [31:12].
pub fn lui(rd: Gpr, imm20: u32) -> u32 {
    encode_u((imm20 << 12) as i32, rd.num() as u32, 0x37)
}

/// `auipc rd, imm20` -- `imm20` is the 20-bit value placed in bits [31:12].
pub fn auipc(rd: Gpr, imm20: u32) -> u32 {
    encode_u((imm20 << 12) as i32, rd.num() as u32, 0x17)
}

/// `ecall`
pub fn ecall() -> u32 {
    encode_i(0x000, 0x00, 0x0, 0x00, 0x73)
}

/// `ebreak`
pub fn ebreak() -> u32 {
    encode_i(0x001, 0x00, 0x0, 0x00, 0x73)
}
