//! Assembler state: labels, sections, and the pass driver.

use std::collections::BTreeMap;

use crate::error::AsmError;
use crate::image::Image;
use crate::lexer;
use crate::section::{Label, Section};

/// Two-pass RV32I assembler.
///
/// Pass 1 ([`Assembler::first_pass`]) collects labels with section-relative
/// offsets and accumulates section sizes. [`Assembler::relocate`] assigns
/// each section its absolute base address and patches every label to an
/// absolute address. Pass 2 ([`Assembler::second_pass`]) re-reads the
/// source and emits machine code and data into the output image.
///
/// [`assemble`](crate::assemble) runs all three in order.
#[derive(Debug)]
pub struct Assembler {
    labels: BTreeMap<String, Label>,
    /// Sections in first-seen order.
    sections: Vec<Section>,
    current_section: String,
    text_size: u32,
    data_size: u32,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            labels: BTreeMap::new(),
            sections: vec![Section::new(".text")],
            current_section: ".text".to_string(),
            text_size: 0,
            data_size: 0,
        }
    }

    /// Make `name` the active section, creating it on first sight.
    pub(crate) fn switch_section(&mut self, name: &str) {
        if self.section(name).is_none() {
            self.sections.push(Section::new(name));
        }
        self.current_section = name.to_string();
    }

    pub(crate) fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub(crate) fn current_section_mut(&mut self) -> &mut Section {
        let idx = self
            .sections
            .iter()
            .position(|s| s.name == self.current_section)
            .expect("current section always exists");
        &mut self.sections[idx]
    }

    pub(crate) fn current_section_ref(&self) -> &Section {
        self.section(&self.current_section)
            .expect("current section always exists")
    }

    /// Record a label at the current section offset. The caller has
    /// already checked that `name` is a well-formed identifier.
    pub(crate) fn define_label(&mut self, name: &str) -> Result<(), AsmError> {
        if self.labels.contains_key(name) {
            return Err(AsmError::DuplicateLabel(name.to_string()));
        }
        let label = Label {
            section: self.current_section.clone(),
            offset: self.current_section_ref().size,
        };
        self.labels.insert(name.to_string(), label);
        Ok(())
    }

    /// Look up a label's address (absolute once [`Assembler::relocate`]
    /// has run).
    pub fn find_label(&self, name: &str) -> Result<u32, AsmError> {
        self.labels
            .get(name)
            .map(|label| label.offset)
            .ok_or_else(|| AsmError::UndefinedLabel(name.to_string()))
    }

    /// Parse an immediate operand: an integer literal, or a label name
    /// resolving to its address.
    pub fn parse_imm(&self, token: &str) -> Result<i32, AsmError> {
        if let Some(value) = lexer::literal_from_token(token) {
            return Ok(value);
        }
        if lexer::is_identifier(token) {
            return Ok(self.find_label(token)? as i32);
        }
        Err(AsmError::InvalidImmediate(token.to_string()))
    }

    /// Assign base addresses in placement order (text, rodata, data, bss,
    /// custom; first-seen within each class) and convert every label's
    /// section-relative offset to an absolute address.
    pub fn relocate(&mut self) {
        let mut order: Vec<usize> = (0..self.sections.len()).collect();
        order.sort_by_key(|&idx| self.sections[idx].kind.placement_rank());

        let mut base = 0u32;
        for idx in order {
            self.sections[idx].base_addr = base;
            base += self.sections[idx].size;
        }

        for label in self.labels.values_mut() {
            let section = self
                .sections
                .iter()
                .find(|s| s.name == label.section)
                .expect("labels only reference existing sections");
            label.offset += section.base_addr;
        }
    }

    /// Size of the `.text` section after pass 1.
    pub fn text_size(&self) -> u32 {
        self.text_size
    }

    /// Size of the `.data` section after pass 1.
    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// Total image size over all sections.
    pub fn total_size(&self) -> u32 {
        self.sections.iter().map(|s| s.size).sum()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Labels with their (post-relocation: absolute) addresses.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &Label)> {
        self.labels.iter().map(|(name, label)| (name.as_str(), label))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub(crate) fn record_standard_sizes(&mut self) {
        self.text_size = self.section(".text").map_or(0, |s| s.size);
        self.data_size = self.section(".data").map_or(0, |s| s.size);
    }
}

/// Assemble a complete source text into a raw binary image.
pub fn assemble(source: &str) -> Result<Image, AsmError> {
    let mut assembler = Assembler::new();
    assembler.first_pass(source)?;
    assembler.relocate();
    let mut image = Image::with_len(assembler.total_size());
    assembler.second_pass(source, &mut image)?;
    Ok(image)
}
