use std::sync::Arc;

use serde::Deserialize;

use crate::{
    backends::{FileContentStore, MemoryContentStore},
    store::ContentStore,
};

/// Configuration for the content store backend
///
/// The backend is chosen once, when the configuration is turned into a
/// store, and injected from then on.
///
/// # Examples
///
/// File-backed store in RON config:
/// ```ron
/// (
///     content: (
///         type: "File",
///         path: "/var/spool/redeliver/content",
///     ),
/// )
/// ```
///
/// Memory-backed store with a capacity limit:
/// ```ron
/// (
///     content: (
///         type: "Memory",
///         capacity: 1000,
///     ),
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentStoreConfig {
    /// File-based store (production)
    File(FileContentStore),
    /// Memory-based store (testing/development)
    Memory(MemoryConfig),
}

/// Configuration for a memory-backed content store
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MemoryConfig {
    /// Maximum number of messages to store (omit for unlimited)
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self::File(FileContentStore::default())
    }
}

impl ContentStoreConfig {
    /// Get the filesystem path for file-backed stores, if applicable
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File(store) => Some(store.path()),
            Self::Memory(_) => None,
        }
    }

    /// Convert the configuration into a ready-to-use store
    ///
    /// File-backed stores are initialised (directory created, leftovers
    /// removed) before being returned.
    ///
    /// # Errors
    /// Returns an error if file store initialisation fails
    pub fn into_content_store(self) -> crate::Result<Arc<dyn ContentStore>> {
        match self {
            Self::File(store) => {
                store.init()?;
                Ok(Arc::new(store))
            }
            Self::Memory(config) => Ok(config.capacity.map_or_else(
                || Arc::new(MemoryContentStore::new()) as Arc<dyn ContentStore>,
                |capacity| Arc::new(MemoryContentStore::with_capacity(capacity)),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_from_ron() {
        let config: ContentStoreConfig =
            ron::from_str(r#"(type: "Memory", capacity: 10)"#).expect("valid config");
        assert!(matches!(
            config,
            ContentStoreConfig::Memory(MemoryConfig { capacity: Some(10) })
        ));
        assert!(config.path().is_none());
    }

    #[test]
    fn test_file_config_validates_path() {
        let result: Result<ContentStoreConfig, _> =
            ron::from_str(r#"(type: "File", path: "relative/content")"#);
        assert!(result.is_err());

        let config: ContentStoreConfig =
            ron::from_str(r#"(type: "File", path: "/var/spool/redeliver/content")"#)
                .expect("valid config");
        assert_eq!(
            config.path(),
            Some(std::path::Path::new("/var/spool/redeliver/content"))
        );
    }

    #[test]
    fn test_into_memory_store() {
        let store = ContentStoreConfig::Memory(MemoryConfig::default())
            .into_content_store()
            .expect("memory store");
        assert!(format!("{store:?}").contains("MemoryContentStore"));
    }
}
