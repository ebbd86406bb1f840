//! Error types for the redeliver-spool crate.

use std::io;

use redeliver_common::{BatchId, MessageId};
use thiserror::Error;

/// Top-level content store error type.
#[derive(Debug, Error)]
pub enum SpoolError {
    /// I/O operation failed (file read/write/delete).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No content is stored for the requested message.
    #[error("Mail content not found for batch [{batch_id}], message [{message_id}]")]
    NotFound {
        batch_id: BatchId,
        message_id: MessageId,
    },

    /// Content is immutable, so a second write for the same pair is refused.
    #[error("Mail content already exists for batch [{batch_id}], message [{message_id}]")]
    AlreadyExists {
        batch_id: BatchId,
        message_id: MessageId,
    },

    /// Store path or identifier validation failed.
    #[error("Content store validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal error (lock poisoning, capacity, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpoolError {
    /// Returns `true` when the content simply does not exist, as opposed to
    /// the store failing to answer.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Store path and identifier validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Store path contains `..` components.
    #[error("Content store path cannot contain '..' components: {0}")]
    ParentDir(String),

    /// Store path is relative.
    #[error("Content store path must be absolute: {0}")]
    NotAbsolute(String),

    /// Store path points into a system directory.
    #[error("Content store path cannot be in system directory {prefix}: {path}")]
    SystemDirectory { prefix: String, path: String },

    /// Store path exists but is not a directory.
    #[error("Content store path is not a directory: {0}")]
    NotDirectory(String),

    /// Identifier cannot be used as a file name.
    #[error("Identifier cannot be stored on disk: {0:?}")]
    InvalidIdentifier(String),
}

/// Specialized `Result` type for content store operations.
pub type Result<T> = std::result::Result<T, SpoolError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for SpoolError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
