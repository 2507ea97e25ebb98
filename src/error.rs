//! Error types for csvstream

use thiserror::Error;

/// Result type alias using [`CsvError`]
pub type Result<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while reading or writing delimited text
///
/// Malformed input (trailing garbage after a closing quote, unterminated
/// quotes in lenient mode) is never reported here; only I/O failures,
/// invalid configuration and strict-mode violations are.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Underlying stream failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while opening or reading an input
    #[error("Read error: {0}")]
    ReadError(String),

    /// Failure while creating or writing an output
    #[error("Write error: {0}")]
    WriteError(String),

    /// Separator, enclosing and EOL characters collide
    #[error("Invalid format definition: {0}")]
    InvalidFormat(String),

    /// Enclosed cell truncated by end of stream (strict mode only)
    #[error("Unterminated enclosed cell at row {row}, column {col}")]
    UnterminatedEnclosure { row: usize, col: usize },

    /// Operation not allowed in the current reader/writer state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
