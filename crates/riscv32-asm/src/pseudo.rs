//! Pseudo-instruction sizing and expansion.
//!
//! Pass 1 must predict the exact byte size that pass 2 will emit for every
//! pseudo-instruction. The only operand-dependent case is `li`: a literal
//! operand that fits in a signed 12-bit immediate expands to one
//! instruction, everything else (including any label operand, whose value
//! is unknown during sizing) always expands to two.

use crate::assembler::Assembler;
use crate::error::AsmError;
use crate::lexer;

/// Whether a mnemonic is one of the supported pseudo-instructions.
pub(crate) fn is_pseudo(mnemonic: &str) -> bool {
    matches!(mnemonic, "nop" | "mv" | "li" | "la" | "j" | "call" | "ret")
}

/// Predicted expansion size in bytes, or `None` for real instructions.
pub(crate) fn pseudo_size(mnemonic: &str, second_operand: Option<&str>) -> Option<u32> {
    match mnemonic {
        "nop" | "mv" | "j" | "call" | "ret" => Some(4),
        "la" => Some(8),
        "li" => {
            if let Some(value) = second_operand.and_then(lexer::literal_from_token) {
                if fits_simm12(value) {
                    return Some(4);
                }
            }
            Some(8)
        }
        _ => None,
    }
}

fn fits_simm12(value: i32) -> bool {
    (-2048..=2047).contains(&value)
}

/// Split a 32-bit value into a `lui`/`auipc` hi20 and an `addi` lo12 such
/// that `(hi20 << 12) + sign_extend(lo12)` reproduces the value.
fn hi_lo(value: i32) -> (i32, i32) {
    let hi = value.wrapping_add(0x800) >> 12;
    let lo = value.wrapping_sub(hi.wrapping_shl(12));
    (hi, lo)
}

impl Assembler {
    /// Expand a pseudo-instruction into one or two concrete instruction
    /// lines. Labels are resolvable at this point, so `li` materializes
    /// absolute addresses and `la` computes its `auipc` offset from
    /// `current_pc`.
    pub(crate) fn expand_pseudo(
        &self,
        mnemonic: &str,
        args: &[&str],
        current_pc: u32,
    ) -> Result<Vec<String>, AsmError> {
        let arg = |index: usize| -> Result<&str, AsmError> {
            args.get(index)
                .copied()
                .ok_or_else(|| AsmError::MissingOperand(mnemonic.to_string()))
        };

        match mnemonic {
            "nop" => Ok(vec!["addi x0, x0, 0".to_string()]),
            "mv" => Ok(vec![format!("addi {}, {}, 0", arg(0)?, arg(1)?)]),
            "li" => {
                let rd = arg(0)?;
                let operand = arg(1)?;
                // The literal test must mirror pass-1 sizing exactly: a
                // label whose address happens to fit 12 bits still takes
                // the two-instruction form.
                if let Some(value) = lexer::literal_from_token(operand) {
                    if fits_simm12(value) {
                        return Ok(vec![format!("addi {rd}, x0, {value}")]);
                    }
                }
                let value = self.parse_imm(operand)?;
                let (hi, lo) = hi_lo(value);
                Ok(vec![
                    format!("lui {rd}, {hi}"),
                    format!("addi {rd}, {rd}, {lo}"),
                ])
            }
            "la" => {
                let rd = arg(0)?;
                let target = self.find_label(arg(1)?)?;
                let offset = (target as i32).wrapping_sub(current_pc as i32);
                let (hi, lo) = hi_lo(offset);
                Ok(vec![
                    format!("auipc {rd}, {hi}"),
                    format!("addi {rd}, {rd}, {lo}"),
                ])
            }
            "j" => Ok(vec![format!("jal x0, {}", arg(0)?)]),
            "call" => Ok(vec![format!("jal x1, {}", arg(0)?)]),
            "ret" => Ok(vec!["jalr x0, x1, 0".to_string()]),
            other => Err(AsmError::UnknownInstruction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing_table() {
        assert_eq!(pseudo_size("nop", None), Some(4));
        assert_eq!(pseudo_size("mv", Some("a1")), Some(4));
        assert_eq!(pseudo_size("li", Some("42")), Some(4));
        assert_eq!(pseudo_size("li", Some("-2048")), Some(4));
        assert_eq!(pseudo_size("li", Some("2048")), Some(8));
        assert_eq!(pseudo_size("li", Some("0x12345")), Some(8));
        assert_eq!(pseudo_size("li", Some("some_label")), Some(8));
        assert_eq!(pseudo_size("la", Some("anything")), Some(8));
        assert_eq!(pseudo_size("j", None), Some(4));
        assert_eq!(pseudo_size("call", None), Some(4));
        assert_eq!(pseudo_size("ret", None), Some(4));
        assert_eq!(pseudo_size("addi", Some("a0")), None);
    }

    #[test]
    fn test_hi_lo_reconstructs() {
        for value in [
            0,
            1,
            -1,
            2047,
            2048,
            -2048,
            -2049,
            0x12345,
            0x7FFF_F800,
            -0x8000_0000,
            0x1000,
        ] {
            let (hi, lo) = hi_lo(value);
            assert!((-2048..=2047).contains(&lo), "lo12 out of range for {value:#x}");
            let rebuilt = hi.wrapping_shl(12).wrapping_add(lo);
            assert_eq!(rebuilt, value, "hi/lo split broken for {value:#x}");
        }
    }

    #[test]
    fn test_expand_li_small() {
        let asm = Assembler::new();
        let lines = asm.expand_pseudo("li", &["a0", "42"], 0).unwrap();
        assert_eq!(lines, vec!["addi a0, x0, 42"]);
    }

    #[test]
    fn test_expand_li_large() {
        let asm = Assembler::new();
        let lines = asm.expand_pseudo("li", &["a0", "0x12345"], 0).unwrap();
        assert_eq!(lines, vec!["lui a0, 18", "addi a0, a0, 837"]);
    }

    #[test]
    fn test_expand_ret() {
        let asm = Assembler::new();
        let lines = asm.expand_pseudo("ret", &[], 0).unwrap();
        assert_eq!(lines, vec!["jalr x0, x1, 0"]);
    }

    #[test]
    fn test_expand_missing_operand() {
        let asm = Assembler::new();
        assert_eq!(
            asm.expand_pseudo("mv", &["a0"], 0),
            Err(AsmError::MissingOperand("mv".to_string()))
        );
    }
}
