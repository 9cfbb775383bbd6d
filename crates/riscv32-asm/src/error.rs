//! Assembler error types.

use thiserror::Error;

/// A fatal assembly error. These are user-input errors; there is no
/// recovery, but they are ordinary values rather than process exits so the
/// driver decides how to report them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// Any error, annotated with the 1-based source line it occurred on.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<AsmError>,
    },

    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),

    #[error("undefined label `{0}`")]
    UndefinedLabel(String),

    #[error("malformed `{0}` directive (missing string literal)")]
    MissingQuote(&'static str),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unknown escape `\\{0}`")]
    UnknownEscape(char),

    #[error("unknown instruction `{0}`")]
    UnknownInstruction(String),

    #[error("invalid register `{0}`")]
    InvalidRegister(String),

    #[error("missing operand for `{0}`")]
    MissingOperand(String),

    #[error("invalid immediate `{0}`")]
    InvalidImmediate(String),
}

impl AsmError {
    /// Attach a source line number, unless one is already attached.
    pub(crate) fn at_line(self, line: usize) -> AsmError {
        match self {
            located @ AsmError::AtLine { .. } => located,
            other => AsmError::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }
}
