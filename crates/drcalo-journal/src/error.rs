//! Error types for drcalo-journal

use thiserror::Error;

/// Journal error type
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stream line could not be parsed back into a frame
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The commit configuration names no output file
    #[error("no output path configured")]
    NoOutputPath,

    /// Export error
    #[error("Export error: {0}")]
    ExportError(String),
}

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for drcalo_core::Error {
    fn from(e: Error) -> Self {
        drcalo_core::Error::Sink(e.to_string())
    }
}
