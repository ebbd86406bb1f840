//! Error types for the redeliver-status crate.

use std::io;

use thiserror::Error;

/// Top-level status store error type.
#[derive(Debug, Error)]
pub enum StatusStoreError {
    /// I/O operation failed on the status log.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A status record could not be encoded.
    #[error("Bincode encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// A status record could not be decoded.
    #[error("Bincode decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// The status log is structurally damaged.
    #[error("Corrupted status log: {0}")]
    Corrupted(String),

    /// Invalid store configuration.
    #[error("Invalid status store configuration: {0}")]
    Validation(String),

    /// Internal error (lock poisoning, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for status store operations.
pub type Result<T> = std::result::Result<T, StatusStoreError>;

impl<T> From<std::sync::PoisonError<T>> for StatusStoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
