use std::io;

use thiserror::Error;

/// Error type for input parsing, IO, and configuration failures.
///
/// Record-level problems (bad dates, unknown schemas, unmappable work orders)
/// are never surfaced here; they are counted in the diagnostics instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Input document has the wrong shape.
    #[error("invalid input: {details}")]
    InvalidInput {
        /// What was wrong with the document.
        details: String,
    },
    /// Malformed JSON text.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// File could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Config values failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),
}
