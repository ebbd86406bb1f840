//! Typed error handling for dispatch and resend operations.
//!
//! Failures are split by when they happen:
//! - Pre-dispatch failures (content load, status query) are returned to the
//!   caller as [`ResendError`]
//! - Post-dispatch failures ([`TransportError`]) are never returned; they are
//!   recorded by the listener and observable through the status result

use redeliver_common::{BatchId, MessageId};
use redeliver_spool::SpoolError;
use redeliver_status::StatusStoreError;
use thiserror::Error;

/// Error returned synchronously by resend operations.
#[derive(Debug, Error)]
pub enum ResendError {
    /// The stored content for this message no longer exists.
    #[error("Mail content unavailable for batch [{batch_id}], message [{message_id}]")]
    ContentUnavailable {
        batch_id: BatchId,
        message_id: MessageId,
    },

    /// A store backend failed to answer.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Backend failure in one of the stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Content store error: {0}")]
    Content(#[from] SpoolError),

    #[error("Status store error: {0}")]
    Status(#[from] StatusStoreError),
}

impl ResendError {
    /// Returns `true` if the message content is missing.
    #[must_use]
    pub const fn is_content_unavailable(&self) -> bool {
        matches!(self, Self::ContentUnavailable { .. })
    }

    /// Returns `true` if a store backend failed.
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Missing content becomes [`ResendError::ContentUnavailable`]; every other
/// content store failure is a [`StoreError`].
impl From<SpoolError> for ResendError {
    fn from(error: SpoolError) -> Self {
        match error {
            SpoolError::NotFound {
                batch_id,
                message_id,
            } => Self::ContentUnavailable {
                batch_id,
                message_id,
            },
            other => Self::Store(StoreError::Content(other)),
        }
    }
}

impl From<StatusStoreError> for ResendError {
    fn from(error: StatusStoreError) -> Self {
        Self::Store(StoreError::Status(error))
    }
}

/// Delivery failure reported by a transport after dispatch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The remote side refused the message.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// The remote side could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The transport did not finish within the configured time.
    #[error("Delivery timed out after {0} seconds")]
    Timeout(u64),

    /// The transport failed in an unexpected way.
    #[error("Transport failure: {0}")]
    Internal(String),
}

/// Errors raised while turning configuration into a resender.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Unable to set up content store: {0}")]
    Content(#[from] SpoolError),

    #[error("Unable to set up status store: {0}")]
    Status(#[from] StatusStoreError),

    #[error("Invalid sender configuration: {0}")]
    Sender(String),
}

/// The deepest source of `error`, for log lines
pub(crate) fn root_cause(error: &(dyn std::error::Error + 'static)) -> String {
    anyhow::Chain::new(error)
        .last()
        .map_or_else(|| error.to_string(), ToString::to_string)
}
