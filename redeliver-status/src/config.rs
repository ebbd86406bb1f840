use std::sync::Arc;

use serde::Deserialize;

use crate::{
    backends::{FileStatusStore, MemoryStatusStore},
    store::StatusStore,
};

/// Configuration for the status store backend
///
/// # Examples
///
/// ```ron
/// (
///     status: (
///         type: "File",
///         path: "/var/spool/redeliver/status.log",
///     ),
/// )
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type")]
pub enum StatusStoreConfig {
    /// Append-only log file
    File(FileStatusStore),
    /// Process memory (testing/development)
    #[default]
    Memory,
}

impl StatusStoreConfig {
    /// Convert the configuration into a ready-to-use store
    ///
    /// # Errors
    /// Returns an error if the log directory cannot be created
    pub fn into_status_store(self) -> crate::Result<Arc<dyn StatusStore>> {
        match self {
            Self::File(store) => {
                store.init()?;
                Ok(Arc::new(store))
            }
            Self::Memory => Ok(Arc::new(MemoryStatusStore::new())),
        }
    }
}
