//! Error types for the CLI protocol.

use thiserror::Error;

/// Errors that can occur when working with the CLI protocol.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to parse a response.
    #[error("failed to parse response: {0}")]
    ParseError(String),

    /// Invalid command format.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A framing pattern could not be compiled.
    #[error("invalid {phase} pattern: {reason}")]
    InvalidPattern {
        /// Phase the pattern was declared for (`command` or `handshake`).
        phase: &'static str,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// Buffer overflow (response grew past the accumulation limit).
    #[error("buffer overflow: max {max} bytes, got {actual}")]
    BufferOverflow { max: usize, actual: usize },
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
