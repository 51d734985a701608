//! Parse error types

use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised while tokenizing or parsing an expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A character that cannot start any token
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character
        ch: char,
        /// Byte offset into the expression
        position: usize,
    },

    /// A string literal with no closing quote
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote
        position: usize,
    },

    /// An invalid escape sequence inside a string literal
    #[error("invalid escape sequence at position {position}")]
    InvalidEscape {
        /// Byte offset of the backslash
        position: usize,
    },

    /// A malformed numeric literal
    #[error("invalid number '{text}' at position {position}")]
    InvalidNumber {
        /// The literal text
        text: String,
        /// Byte offset of the literal
        position: usize,
    },

    /// A well-formed token in a position where it is not allowed
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// Display form of the token
        token: String,
        /// Byte offset of the token
        position: usize,
    },

    /// Input ended mid-expression
    #[error("unexpected end of expression")]
    UnexpectedEnd,
}
