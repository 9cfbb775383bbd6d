//! Two-pass RV32I assembler.
//!
//! Translates textual assembly (plus a small set of pseudo-instructions
//! and data directives) into a raw little-endian binary image with labels
//! resolved to absolute addresses. See [`assemble`] for the one-call entry
//! point, or drive [`Assembler`]'s passes individually for access to
//! section sizes and the label table.

mod assembler;
mod error;
mod first_pass;
mod image;
mod lexer;
mod pseudo;
mod second_pass;
mod section;

pub use assembler::{assemble, Assembler};
pub use error::AsmError;
pub use image::Image;
pub use section::{Label, Section, SectionKind};
