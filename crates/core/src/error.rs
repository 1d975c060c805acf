//! Error types for the chatwindow domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Budget allocation itself
//! never fails; errors only arise while building collaborators (encoders,
//! transcripts).

use thiserror::Error;

/// The top-level error type for all chatwindow operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Encoder errors ---
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum EncoderError {
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("Failed to load BPE table for {encoding}: {reason}")]
    LoadFailed { encoding: String, reason: String },
}
