//! RV32I instruction disassembly.

use crate::decode::sign_extend;
use crate::regs::Gpr;

/// Disassemble a single RV32I instruction word.
///
/// Returns a human-readable string like `add a0, a1, a2` or
/// `lw a0, 8(sp)`. Words that do not decode render as `.word 0x…` so a
/// trace of a partially-corrupt buffer still prints in full.
pub fn disassemble(word: u32) -> String {
    let opcode = word & 0x7F;
    let rd = reg(word >> 7);
    let rs1 = reg(word >> 15);
    let rs2 = reg(word >> 20);
    let funct3 = (word >> 12) & 0x7;
    let funct7 = (word >> 25) & 0x7F;

    let imm_i = sign_extend((word >> 20) & 0xFFF, 12);
    let imm_s = sign_extend((((word >> 25) & 0x7F) << 5) | ((word >> 7) & 0x1F), 12);
    let imm_b = sign_extend(
        (((word >> 31) & 0x1) << 12)
            | (((word >> 7) & 0x1) << 11)
            | (((word >> 25) & 0x3F) << 5)
            | (((word >> 8) & 0xF) << 1),
        13,
    );
    let imm_j = sign_extend(
        (((word >> 31) & 0x1) << 20)
            | (((word >> 12) & 0xFF) << 12)
            | (((word >> 20) & 0x1) << 11)
            | (((word >> 21) & 0x3FF) << 1),
        21,
    );
    let imm_u20 = (word >> 12) & 0xFFFFF;

    match opcode {
        0x33 => {
            let name = match (funct7, funct3) {
                (0x00, 0x0) => "add",
                (0x20, 0x0) => "sub",
                (0x00, 0x1) => "sll",
                (0x00, 0x2) => "slt",
                (0x00, 0x3) => "sltu",
                (0x00, 0x4) => "xor",
                (0x00, 0x5) => "srl",
                (0x20, 0x5) => "sra",
                (0x00, 0x6) => "or",
                (0x00, 0x7) => "and",
                _ => return unknown(word),
            };
            format!("{name} {rd}, {rs1}, {rs2}")
        }
        0x13 => match funct3 {
            0x0 => format!("addi {rd}, {rs1}, {imm_i}"),
            0x2 => format!("slti {rd}, {rs1}, {imm_i}"),
            0x3 => format!("sltiu {rd}, {rs1}, {imm_i}"),
            0x4 => format!("xori {rd}, {rs1}, {imm_i}"),
            0x6 => format!("ori {rd}, {rs1}, {imm_i}"),
            0x7 => format!("andi {rd}, {rs1}, {imm_i}"),
            0x1 if funct7 == 0x00 => format!("slli {rd}, {rs1}, {}", imm_i & 0x1F),
            0x5 if funct7 == 0x00 => format!("srli {rd}, {rs1}, {}", imm_i & 0x1F),
            0x5 if funct7 == 0x20 => format!("srai {rd}, {rs1}, {}", imm_i & 0x1F),
            _ => unknown(word),
        },
        0x03 => {
            let name = match funct3 {
                0x0 => "lb",
                0x1 => "lh",
                0x2 => "lw",
                0x4 => "lbu",
                0x5 => "lhu",
                _ => return unknown(word),
            };
            format!("{name} {rd}, {imm_i}({rs1})")
        }
        0x23 => {
            let name = match funct3 {
                0x0 => "sb",
                0x1 => "sh",
                0x2 => "sw",
                _ => return unknown(word),
            };
            format!("{name} {rs2}, {imm_s}({rs1})")
        }
        0x63 => {
            let name = match funct3 {
                0x0 => "beq",
                0x1 => "bne",
                0x4 => "blt",
                0x5 => "bge",
                0x6 => "bltu",
                0x7 => "bgeu",
                _ => return unknown(word),
            };
            format!("{name} {rs1}, {rs2}, {imm_b}")
        }
        0x6F => format!("jal {rd}, {imm_j}"),
        0x67 if funct3 == 0 => format!("jalr {rd}, {imm_i}({rs1})"),
        0x37 => format!("lui {rd}, 0x{imm_u20:x}"),
        0x17 => format!("auipc {rd}, 0x{imm_u20:x}"),
        0x73 => match word {
            0x00000073 => "ecall".to_string(),
            0x00100073 => "ebreak".to_string(),
            _ => unknown(word),
        },
        _ => unknown(word),
    }
}

/// Disassemble a whole code buffer, one instruction per line with its
/// byte offset.
pub fn disassemble_code(code: &[u8]) -> String {
    let mut result = String::new();
    let mut offset = 0;

    while offset + 4 <= code.len() {
        let word = u32::from_le_bytes([
            code[offset],
            code[offset + 1],
            code[offset + 2],
            code[offset + 3],
        ]);
        result.push_str(&format!("0x{offset:04x}: {}\n", disassemble(word)));
        offset += 4;
    }

    if offset < code.len() {
        result.push_str(&format!("0x{offset:04x}: <incomplete instruction>\n"));
    }

    result
}

fn reg(bits: u32) -> Gpr {
    Gpr::new((bits & 0x1F) as u8)
}

fn unknown(word: u32) -> String {
    format!(".word 0x{word:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::*;

    #[test]
    fn test_disassemble_r_type() {
        assert_eq!(disassemble(add(Gpr::A0, Gpr::A1, Gpr::A2)), "add a0, a1, a2");
        assert_eq!(disassemble(sra(Gpr::T0, Gpr::T1, Gpr::T2)), "sra t0, t1, t2");
    }

    #[test]
    fn test_disassemble_imm() {
        assert_eq!(disassemble(addi(Gpr::A0, Gpr::A1, -5)), "addi a0, a1, -5");
        assert_eq!(disassemble(srai(Gpr::A0, Gpr::A1, 3)), "srai a0, a1, 3");
    }

    #[test]
    fn test_disassemble_mem() {
        assert_eq!(disassemble(lw(Gpr::A0, Gpr::SP, 8)), "lw a0, 8(sp)");
        assert_eq!(disassemble(sw(Gpr::SP, Gpr::A0, -4)), "sw a0, -4(sp)");
        assert_eq!(disassemble(lbu(Gpr::T0, Gpr::ZERO, 0x200)), "lbu t0, 512(zero)");
    }

    #[test]
    fn test_disassemble_control_flow() {
        assert_eq!(disassemble(beq(Gpr::A0, Gpr::A1, 8)), "beq a0, a1, 8");
        assert_eq!(disassemble(blt(Gpr::A1, Gpr::A2, -12)), "blt a1, a2, -12");
        assert_eq!(disassemble(jal(Gpr::RA, 16)), "jal ra, 16");
        assert_eq!(disassemble(jalr(Gpr::ZERO, Gpr::RA, 0)), "jalr zero, 0(ra)");
    }

    #[test]
    fn test_disassemble_upper_and_system() {
        assert_eq!(disassemble(lui(Gpr::SP, 0x80000)), "lui sp, 0x80000");
        assert_eq!(disassemble(auipc(Gpr::A0, 1)), "auipc a0, 0x1");
        assert_eq!(disassemble(ecall()), "ecall");
        assert_eq!(disassemble(ebreak()), "ebreak");
    }

    #[test]
    fn test_disassemble_unknown() {
        assert_eq!(disassemble(0xFFFF_FFFF), ".word 0xffffffff");
    }

    #[test]
    fn test_disassemble_code_buffer() {
        let mut code = Vec::new();
        code.extend_from_slice(&addi(Gpr::A0, Gpr::ZERO, 10).to_le_bytes());
        code.extend_from_slice(&ecall().to_le_bytes());
        code.push(0x13);

        let text = disassemble_code(&code);
        assert!(text.contains("0x0000: addi a0, zero, 10"));
        assert!(text.contains("0x0004: ecall"));
        assert!(text.contains("0x0008: <incomplete instruction>"));
    }
}
