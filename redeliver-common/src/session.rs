use ahash::AHashMap;

use crate::BatchId;

/// Configuration scoping a single send or resend call
///
/// Sessions are never persisted. The batch id is fixed when the session is
/// built; the remaining properties are passed through untouched to the
/// transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    batch_id: BatchId,
    properties: AHashMap<String, String>,
}

impl Session {
    #[must_use]
    pub const fn new(batch_id: BatchId, properties: AHashMap<String, String>) -> Self {
        Self {
            batch_id,
            properties,
        }
    }

    /// The batch every message sent with this session belongs to
    #[must_use]
    pub const fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    #[must_use]
    pub const fn properties(&self) -> &AHashMap<String, String> {
        &self.properties
    }
}
