use async_trait::async_trait;
use redeliver_common::{BatchId, MailContent, MessageId, Session};

/// Persistence for raw outgoing message bytes
///
/// Implementations must tolerate concurrent use from many simultaneous
/// send and resend operations.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug {
    /// Store the content of a message sent as part of `batch_id`
    ///
    /// # Errors
    /// [`SpoolError::AlreadyExists`](crate::SpoolError::AlreadyExists) if
    /// content was already stored for this pair, or any backend failure.
    async fn save(&self, batch_id: &BatchId, content: &MailContent) -> crate::Result<()>;

    /// Load previously stored content
    ///
    /// The session is the one the reloaded message will be sent with.
    ///
    /// # Errors
    /// [`SpoolError::NotFound`](crate::SpoolError::NotFound) if nothing is
    /// stored for this pair, or any backend failure.
    async fn load(
        &self,
        session: &Session,
        batch_id: &BatchId,
        message_id: &MessageId,
    ) -> crate::Result<MailContent>;

    /// Remove stored content
    ///
    /// # Errors
    /// [`SpoolError::NotFound`](crate::SpoolError::NotFound) if nothing is
    /// stored for this pair, or any backend failure.
    async fn delete(&self, batch_id: &BatchId, message_id: &MessageId) -> crate::Result<()>;
}
