use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use redeliver_common::MailStatus;

use crate::{
    SortField, StatusFilter,
    filter::select,
    store::StatusStore,
};

/// In-memory status store
///
/// Records live in a `Vec` behind an `RwLock`, in insertion order. Clones
/// share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatusStore {
    records: Arc<RwLock<Vec<MailStatus>>>,
}

impl MemoryStatusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records, regardless of any filter
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every record in insertion order
    #[must_use]
    pub fn records(&self) -> Vec<MailStatus> {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn save(&self, status: &MailStatus) -> crate::Result<()> {
        self.records.write()?.push(status.clone());
        Ok(())
    }

    async fn query(
        &self,
        filter: &StatusFilter,
        offset: usize,
        count: usize,
        sort: Option<SortField>,
        reverse: bool,
    ) -> crate::Result<Vec<MailStatus>> {
        let records = self.records.read()?;
        Ok(select(records.iter(), filter, offset, count, sort, reverse))
    }

    async fn count(&self, filter: &StatusFilter) -> crate::Result<usize> {
        Ok(self
            .records
            .read()?
            .iter()
            .filter(|status| filter.matches(status))
            .count())
    }
}
