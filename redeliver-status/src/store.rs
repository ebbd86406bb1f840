use async_trait::async_trait;
use redeliver_common::{BatchId, MailStatus, MessageId};

use crate::{SortField, StatusFilter};

/// Persistence for append-only delivery status records
///
/// Implementations must tolerate concurrent appends and queries from many
/// simultaneous dispatch calls.
#[async_trait]
pub trait StatusStore: Send + Sync + std::fmt::Debug {
    /// Append a status record
    ///
    /// # Errors
    /// If the backend cannot persist the record
    async fn save(&self, status: &MailStatus) -> crate::Result<()>;

    /// Load one page of records matching `filter`
    ///
    /// Without `sort` records are returned in the order they were saved;
    /// `reverse` flips the order before `offset` and `count` are applied.
    ///
    /// # Errors
    /// If the backend cannot be read
    async fn query(
        &self,
        filter: &StatusFilter,
        offset: usize,
        count: usize,
        sort: Option<SortField>,
        reverse: bool,
    ) -> crate::Result<Vec<MailStatus>>;

    /// Number of records matching `filter`
    ///
    /// # Errors
    /// If the backend cannot be read
    async fn count(&self, filter: &StatusFilter) -> crate::Result<usize>;

    /// Most recently saved record for a (batch, message) pair
    ///
    /// # Errors
    /// If the backend cannot be read
    async fn latest(
        &self,
        batch_id: &BatchId,
        message_id: &MessageId,
    ) -> crate::Result<Option<MailStatus>> {
        let filter = StatusFilter::new()
            .with("batchId", batch_id)
            .with("messageId", message_id);
        Ok(self
            .query(&filter, 0, 1, None, true)
            .await?
            .into_iter()
            .next())
    }
}
