use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use redeliver_common::{BatchId, MailContent, MessageId, Session};

use crate::{SpoolError, store::ContentStore};

type Key = (BatchId, MessageId);

/// In-memory content store
///
/// Stores content in a `HashMap` protected by an `RwLock`. Intended for tests
/// and for deployments where stored content does not need to survive a
/// restart.
///
/// # Capacity Management
/// The store can be configured with a maximum capacity to prevent unbounded
/// memory growth. When capacity is reached, `save` fails with an error.
#[derive(Debug, Clone)]
pub struct MemoryContentStore {
    pub(crate) messages: Arc<RwLock<HashMap<Key, MailContent>>>,
    /// Maximum number of messages to store (None = unlimited)
    capacity: Option<usize>,
}

impl MemoryContentStore {
    /// Create a new empty store with unlimited capacity
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(HashMap::new())),
            capacity: None,
        }
    }

    /// Create a new store holding at most `capacity` messages
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Arc::new(RwLock::new(HashMap::new())),
            capacity: Some(capacity),
        }
    }

    /// Get the current number of stored messages
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configured capacity (None = unlimited)
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn save(&self, batch_id: &BatchId, content: &MailContent) -> crate::Result<()> {
        let key = (batch_id.clone(), content.message_id().clone());
        let mut messages = self.messages.write()?;

        if messages.contains_key(&key) {
            return Err(SpoolError::AlreadyExists {
                batch_id: key.0,
                message_id: key.1,
            });
        }

        if let Some(cap) = self.capacity
            && messages.len() >= cap
        {
            return Err(SpoolError::Internal(format!(
                "Memory content store capacity exceeded: {}/{} messages",
                messages.len(),
                cap
            )));
        }

        messages.insert(key, content.clone());
        Ok(())
    }

    async fn load(
        &self,
        _session: &Session,
        batch_id: &BatchId,
        message_id: &MessageId,
    ) -> crate::Result<MailContent> {
        self.messages
            .read()?
            .get(&(batch_id.clone(), message_id.clone()))
            .cloned()
            .ok_or_else(|| SpoolError::NotFound {
                batch_id: batch_id.clone(),
                message_id: message_id.clone(),
            })
    }

    async fn delete(&self, batch_id: &BatchId, message_id: &MessageId) -> crate::Result<()> {
        self.messages
            .write()?
            .remove(&(batch_id.clone(), message_id.clone()))
            .ok_or_else(|| SpoolError::NotFound {
                batch_id: batch_id.clone(),
                message_id: message_id.clone(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use ahash::AHashMap;

    use super::*;

    fn session(batch: &str) -> Session {
        Session::new(BatchId::from(batch), AHashMap::new())
    }

    fn content(id: &str, data: &str) -> MailContent {
        MailContent::new(MessageId::from(id), data.as_bytes())
    }

    #[tokio::test]
    async fn test_memory_store_basic_operations() {
        let store = MemoryContentStore::new();
        let batch = BatchId::from("B1");

        store
            .save(&batch, &content("M1", "Subject: one\r\n\r\nbody"))
            .await
            .expect("Failed to save");
        assert_eq!(store.len(), 1);

        let loaded = store
            .load(&session("B1"), &batch, &MessageId::from("M1"))
            .await
            .expect("Failed to load");
        assert_eq!(loaded.data(), b"Subject: one\r\n\r\nbody");

        store
            .delete(&batch, &MessageId::from("M1"))
            .await
            .expect("Failed to delete");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_same_message_id_in_different_batches() {
        let store = MemoryContentStore::new();
        store
            .save(&BatchId::from("B1"), &content("M1", "first"))
            .await
            .expect("save B1");
        store
            .save(&BatchId::from("B2"), &content("M1", "second"))
            .await
            .expect("save B2");

        let loaded = store
            .load(&session("B2"), &BatchId::from("B2"), &MessageId::from("M1"))
            .await
            .expect("load B2");
        assert_eq!(loaded.data(), b"second");
    }

    #[tokio::test]
    async fn test_content_is_write_once() {
        let store = MemoryContentStore::new();
        let batch = BatchId::from("B1");
        store.save(&batch, &content("M1", "original")).await.expect("save");

        let err = store
            .save(&batch, &content("M1", "rewritten"))
            .await
            .expect_err("second save must fail");
        assert!(matches!(err, SpoolError::AlreadyExists { .. }));

        let loaded = store
            .load(&session("B1"), &batch, &MessageId::from("M1"))
            .await
            .expect("load");
        assert_eq!(loaded.data(), b"original");
    }

    #[tokio::test]
    async fn test_missing_content_is_not_found() {
        let store = MemoryContentStore::new();
        let err = store
            .load(&session("B1"), &BatchId::from("B1"), &MessageId::from("M404"))
            .await
            .expect_err("load must fail");
        assert!(err.is_not_found());

        let err = store
            .delete(&BatchId::from("B1"), &MessageId::from("M404"))
            .await
            .expect_err("delete must fail");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_memory_store_capacity_limit() {
        let store = MemoryContentStore::with_capacity(2);
        let batch = BatchId::from("B1");

        store.save(&batch, &content("M1", "1")).await.expect("first");
        store.save(&batch, &content("M2", "2")).await.expect("second");

        let result = store.save(&batch, &content("M3", "3")).await;
        assert!(
            result
                .expect_err("third save must fail")
                .to_string()
                .contains("capacity exceeded")
        );

        store.delete(&batch, &MessageId::from("M1")).await.expect("delete");
        assert!(store.save(&batch, &content("M3", "3")).await.is_ok());
    }

    #[test]
    fn test_capacity_methods() {
        assert_eq!(MemoryContentStore::new().capacity(), None);
        assert_eq!(MemoryContentStore::with_capacity(100).capacity(), Some(100));
    }
}
