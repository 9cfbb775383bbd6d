//! Pass 2: instruction encoding and image emission.

use riscv32_isa as isa;
use riscv32_isa::Gpr;

use crate::assembler::Assembler;
use crate::error::AsmError;
use crate::first_pass::space_len;
use crate::image::Image;
use crate::lexer;
use crate::pseudo;
use crate::section::SectionKind;

fn arg<'a>(args: &[&'a str], index: usize, mnemonic: &str) -> Result<&'a str, AsmError> {
    args.get(index)
        .copied()
        .ok_or_else(|| AsmError::MissingOperand(mnemonic.to_string()))
}

fn reg_arg(args: &[&str], index: usize, mnemonic: &str) -> Result<Gpr, AsmError> {
    let token = arg(args, index, mnemonic)?;
    lexer::reg_from_token(token).ok_or_else(|| AsmError::InvalidRegister(token.to_string()))
}

impl Assembler {
    /// Re-read the source with labels resolved, encode every instruction
    /// against the current PC, and emit data directive contents. The
    /// write cursor follows the relocated section bases.
    pub fn second_pass(&self, source: &str, image: &mut Image) -> Result<(), AsmError> {
        let mut pc: u32 = 0;
        let mut current_section = ".text".to_string();
        image.seek(0);

        for (idx, raw_line) in source.lines().enumerate() {
            self.second_pass_line(raw_line, image, &mut pc, &mut current_section)
                .map_err(|e| e.at_line(idx + 1))?;
        }
        Ok(())
    }

    fn second_pass_line(
        &self,
        raw_line: &str,
        image: &mut Image,
        pc: &mut u32,
        current_section: &mut String,
    ) -> Result<(), AsmError> {
        let line = lexer::strip_comment(raw_line).trim();
        if line.is_empty() {
            return Ok(());
        }

        if let Some(name) = lexer::section_directive(line) {
            if let Some(section) = self.section(name) {
                *pc = section.base_addr;
                image.seek(*pc);
            }
            *current_section = name.to_string();
            return Ok(());
        }

        if line.starts_with(".globl") {
            return Ok(());
        }

        let line = match lexer::label_definition(line) {
            Some((_, rest)) => {
                let rest = rest.trim();
                if rest.is_empty() {
                    return Ok(());
                }
                rest
            }
            None => line,
        };

        if line.starts_with('.') {
            return self.emit_directive(line, image, pc);
        }

        let kind = self
            .section(current_section)
            .map_or(SectionKind::Text, |s| s.kind);
        if kind == SectionKind::Text {
            self.emit_instruction(line, image, pc)?;
        }
        Ok(())
    }

    fn emit_instruction(&self, line: &str, image: &mut Image, pc: &mut u32) -> Result<(), AsmError> {
        let normalized = lexer::normalize_mem_operand(line);
        let (mnemonic, args) = lexer::split_operands(&normalized);

        if pseudo::is_pseudo(mnemonic) {
            for expanded in self.expand_pseudo(mnemonic, &args, *pc)? {
                let (real_op, real_args) = lexer::split_operands(&expanded);
                let word = self.encode_instruction(*pc, real_op, &real_args)?;
                image.write_u32(word);
                *pc += 4;
            }
        } else {
            let word = self.encode_instruction(*pc, mnemonic, &args)?;
            image.write_u32(word);
            *pc += 4;
        }
        Ok(())
    }

    /// Encode one concrete instruction at `pc`. Branch and `jal` targets
    /// are absolute addresses (labels or literals); the emitted offset is
    /// relative to the instruction's own address.
    fn encode_instruction(&self, pc: u32, mnemonic: &str, args: &[&str]) -> Result<u32, AsmError> {
        let reg = |index: usize| reg_arg(args, index, mnemonic);
        let imm = |index: usize| -> Result<i32, AsmError> {
            self.parse_imm(arg(args, index, mnemonic)?)
        };
        let branch_offset = |target: i32| target.wrapping_sub(pc as i32);

        let word = match mnemonic {
            "add" => isa::add(reg(0)?, reg(1)?, reg(2)?),
            "sub" => isa::sub(reg(0)?, reg(1)?, reg(2)?),
            "sll" => isa::sll(reg(0)?, reg(1)?, reg(2)?),
            "slt" => isa::slt(reg(0)?, reg(1)?, reg(2)?),
            "sltu" => isa::sltu(reg(0)?, reg(1)?, reg(2)?),
            "xor" => isa::xor(reg(0)?, reg(1)?, reg(2)?),
            "srl" => isa::srl(reg(0)?, reg(1)?, reg(2)?),
            "sra" => isa::sra(reg(0)?, reg(1)?, reg(2)?),
            "or" => isa::or(reg(0)?, reg(1)?, reg(2)?),
            "and" => isa::and(reg(0)?, reg(1)?, reg(2)?),

            "addi" => isa::addi(reg(0)?, reg(1)?, imm(2)?),
            "slti" => isa::slti(reg(0)?, reg(1)?, imm(2)?),
            "sltiu" => isa::sltiu(reg(0)?, reg(1)?, imm(2)?),
            "xori" => isa::xori(reg(0)?, reg(1)?, imm(2)?),
            "ori" => isa::ori(reg(0)?, reg(1)?, imm(2)?),
            "andi" => isa::andi(reg(0)?, reg(1)?, imm(2)?),

            "slli" => isa::slli(reg(0)?, reg(1)?, imm(2)? as u32),
            "srli" => isa::srli(reg(0)?, reg(1)?, imm(2)? as u32),
            "srai" => isa::srai(reg(0)?, reg(1)?, imm(2)? as u32),

            "lb" => isa::lb(reg(0)?, reg(2)?, imm(1)?),
            "lh" => isa::lh(reg(0)?, reg(2)?, imm(1)?),
            "lw" => isa::lw(reg(0)?, reg(2)?, imm(1)?),
            "lbu" => isa::lbu(reg(0)?, reg(2)?, imm(1)?),
            "lhu" => isa::lhu(reg(0)?, reg(2)?, imm(1)?),

            "sb" => isa::sb(reg(2)?, reg(0)?, imm(1)?),
            "sh" => isa::sh(reg(2)?, reg(0)?, imm(1)?),
            "sw" => isa::sw(reg(2)?, reg(0)?, imm(1)?),

            "beq" => isa::beq(reg(0)?, reg(1)?, branch_offset(imm(2)?)),
            "bne" => isa::bne(reg(0)?, reg(1)?, branch_offset(imm(2)?)),
            "blt" => isa::blt(reg(0)?, reg(1)?, branch_offset(imm(2)?)),
            "bge" => isa::bge(reg(0)?, reg(1)?, branch_offset(imm(2)?)),
            "bltu" => isa::bltu(reg(0)?, reg(1)?, branch_offset(imm(2)?)),
            "bgeu" => isa::bgeu(reg(0)?, reg(1)?, branch_offset(imm(2)?)),

            "jal" => isa::jal(reg(0)?, branch_offset(imm(1)?)),
            "jalr" => {
                // Accept both `jalr rd, rs1, imm` and `jalr rd, imm(rs1)`
                // (the latter arrives normalized as `rd, imm, rs1`).
                let rd = reg(0)?;
                match lexer::reg_from_token(arg(args, 1, mnemonic)?) {
                    Some(rs1) => isa::jalr(rd, rs1, imm(2)?),
                    None => isa::jalr(rd, reg(2)?, imm(1)?),
                }
            }

            "lui" => isa::lui(reg(0)?, imm(1)? as u32),
            "auipc" => isa::auipc(reg(0)?, imm(1)? as u32),

            "ecall" => isa::ecall(),
            "ebreak" => isa::ebreak(),

            other => return Err(AsmError::UnknownInstruction(other.to_string())),
        };
        Ok(word)
    }

    fn emit_directive(&self, line: &str, image: &mut Image, pc: &mut u32) -> Result<(), AsmError> {
        let (keyword, rest) = lexer::split_keyword(line);
        match keyword {
            ".ascii" | ".asciiz" => {
                let directive: &'static str = if keyword == ".ascii" { ".ascii" } else { ".asciiz" };
                let quote = rest.find('"').ok_or(AsmError::MissingQuote(directive))?;
                let bytes = lexer::decode_string(&rest[quote + 1..])?;
                image.write_bytes(&bytes);
                *pc += bytes.len() as u32;
                if keyword == ".asciiz" {
                    image.write_u8(0);
                    *pc += 1;
                }
            }
            ".byte" => {
                for token in lexer::split_values(rest) {
                    let value = self.parse_imm(token)?;
                    image.write_u8(value as u8);
                    *pc += 1;
                }
            }
            ".half" => {
                for token in lexer::split_values(rest) {
                    let value = self.parse_imm(token)?;
                    image.write_u16(value as u16);
                    *pc += 2;
                }
            }
            ".word" => {
                for token in lexer::split_values(rest) {
                    let value = self.parse_imm(token)?;
                    image.write_u32(value as u32);
                    *pc += 4;
                }
            }
            ".space" => {
                let count = space_len(rest);
                image.write_bytes(&vec![0u8; count as usize]);
                *pc += count;
            }
            // Unknown directives were sized at zero in pass 1; skip them
            // here too.
            _ => {}
        }
        Ok(())
    }
}
