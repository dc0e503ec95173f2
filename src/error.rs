//! Error types for inkdoc library.

use std::io;
use thiserror::Error;

/// Result type alias for inkdoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document reconstruction.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No usable input (empty image, or no boxes left after normalization).
    #[error("Empty input: nothing to reconstruct")]
    EmptyInput,

    /// Input is present but unusable (bad page width, malformed OCR file).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The OCR engine returned no detections.
    #[error("OCR returned no text")]
    EmptyOcrResult,

    /// The OCR engine failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// An oracle call failed (transport, status, timeout).
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Untrusted text could not be parsed into the expected structure.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error during rendering (serialization).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Job lifecycle violation.
    #[error("Job error: {0}")]
    Job(String),
}

impl Error {
    /// Check if the pipeline can continue past this error.
    ///
    /// Only oracle-side classification failures are recoverable; the
    /// classifier swallows them and falls back to rule labels.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Oracle(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
