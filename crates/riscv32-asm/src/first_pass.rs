//! Pass 1: label collection and section sizing.

use crate::assembler::Assembler;
use crate::error::AsmError;
use crate::lexer;
use crate::pseudo;
use crate::section::SectionKind;

impl Assembler {
    /// Walk the source once, assigning each label its section-relative
    /// offset and accumulating every section's size. Pseudo-instructions
    /// contribute their predicted expansion size.
    pub fn first_pass(&mut self, source: &str) -> Result<(), AsmError> {
        for (idx, raw_line) in source.lines().enumerate() {
            self.first_pass_line(raw_line)
                .map_err(|e| e.at_line(idx + 1))?;
        }
        self.record_standard_sizes();
        Ok(())
    }

    fn first_pass_line(&mut self, raw_line: &str) -> Result<(), AsmError> {
        let line = lexer::strip_comment(raw_line).trim();
        if line.is_empty() {
            return Ok(());
        }

        if let Some(name) = lexer::section_directive(line) {
            self.switch_section(name);
            return Ok(());
        }

        if line.starts_with(".globl") {
            // Global visibility is moot without a linker.
            return Ok(());
        }

        if let Some((name, rest)) = lexer::label_definition(line) {
            self.define_label(name)?;
            let rest = rest.trim();
            if !rest.is_empty() {
                self.classify_and_size(rest)?;
            }
            return Ok(());
        }

        self.classify_and_size(line)
    }

    /// Size a directive or instruction (the remainder of a label line goes
    /// through here too).
    fn classify_and_size(&mut self, line: &str) -> Result<(), AsmError> {
        if line.starts_with('.') {
            return self.size_directive(line);
        }
        if self.current_section_ref().kind == SectionKind::Text {
            self.size_instruction(line);
        }
        Ok(())
    }

    fn size_instruction(&mut self, line: &str) {
        let (mnemonic, args) = lexer::split_operands(line);
        let size = pseudo::pseudo_size(mnemonic, args.get(1).copied()).unwrap_or(4);
        self.current_section_mut().size += size;
    }

    fn size_directive(&mut self, line: &str) -> Result<(), AsmError> {
        let (keyword, rest) = lexer::split_keyword(line);
        let size = match keyword {
            ".ascii" => string_payload_len(rest, ".ascii")?,
            ".asciiz" => string_payload_len(rest, ".asciiz")? + 1,
            ".byte" => lexer::split_values(rest).len() as u32,
            ".half" => lexer::split_values(rest).len() as u32 * 2,
            ".word" => lexer::split_values(rest).len() as u32 * 4,
            ".space" => space_len(rest),
            // Other directives take no space in the image.
            _ => 0,
        };
        self.current_section_mut().size += size;
        Ok(())
    }
}

/// Decoded length of a quoted string directive payload. Each pass
/// re-parses the literal; nothing is cached between sizing and emission.
pub(crate) fn string_payload_len(rest: &str, directive: &'static str) -> Result<u32, AsmError> {
    let quote = rest
        .find('"')
        .ok_or(AsmError::MissingQuote(directive))?;
    Ok(lexer::decode_string(&rest[quote + 1..])?.len() as u32)
}

pub(crate) fn space_len(rest: &str) -> u32 {
    lexer::literal_from_token(rest.trim())
        .map(|n| n.max(0) as u32)
        .unwrap_or(0)
}
