//! Error types.

use thiserror::Error;

/// Failure to read a textual presence condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("Unexpected token {found:?} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("Unclosed parenthesis opened at offset {0}")]
    UnclosedParen(usize),
}
