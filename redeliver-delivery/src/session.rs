//! Per-call session construction

use ahash::AHashMap;
use redeliver_common::{BatchId, Session};
use serde::Deserialize;

/// Override key pinning the batch id of the session being built
///
/// Without it every session starts a new batch.
pub const BATCH_ID_KEY: &str = "redeliver.batchId";

/// Properties copied into every session
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Transport properties (host, credentials, ...), passed through untouched
    #[serde(default)]
    pub properties: AHashMap<String, String>,
}

/// Builds a fresh [`Session`] for each send or resend call
#[derive(Debug, Clone, Default)]
pub struct SessionFactory {
    properties: AHashMap<String, String>,
}

impl SessionFactory {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let mut properties = config.properties;
        // A configured pin would silently merge unrelated sends into one batch
        properties.remove(BATCH_ID_KEY);
        Self { properties }
    }

    /// Build a session
    ///
    /// `overrides` take precedence over configured properties. The
    /// [`BATCH_ID_KEY`] override pins the batch id; otherwise a new one is
    /// minted.
    #[must_use]
    pub fn create(&self, overrides: &AHashMap<String, String>) -> Session {
        let mut properties = self.properties.clone();
        properties.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        let batch_id = properties
            .remove(BATCH_ID_KEY)
            .map_or_else(BatchId::generate, BatchId::from);

        Session::new(batch_id, properties)
    }

    /// Build a session that keeps an existing batch id
    #[must_use]
    pub fn pinned(&self, batch_id: &BatchId) -> Session {
        let mut overrides = AHashMap::with_capacity(1);
        overrides.insert(BATCH_ID_KEY.to_string(), batch_id.to_string());
        self.create(&overrides)
    }
}
