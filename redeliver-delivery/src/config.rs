use std::path::Path;

use redeliver_common::audit::AuditConfig;
use redeliver_spool::ContentStoreConfig;
use redeliver_status::StatusStoreConfig;
use serde::Deserialize;

use crate::{ConfigError, SenderConfig, SessionConfig};

/// Everything needed to build a [`Resender`](crate::Resender)
///
/// Every section is optional and falls back to its default.
///
/// # Examples
///
/// ```ron
/// (
///     content: (type: "File", path: "/var/spool/redeliver/content"),
///     status: (type: "File", path: "/var/spool/redeliver/status.log"),
///     sender: (max_concurrent_sends: 16, send_timeout_secs: 60),
///     session: (properties: {"smtp.host": "localhost"}),
///     audit: (enabled: true, redact_recipients: false),
/// )
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResenderConfig {
    #[serde(default)]
    pub content: ContentStoreConfig,

    #[serde(default)]
    pub status: StatusStoreConfig,

    #[serde(default)]
    pub sender: SenderConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl ResenderConfig {
    /// Parse a RON document
    ///
    /// # Errors
    /// If the document is not valid RON or does not describe a configuration
    pub fn from_ron_str(config: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(config)?)
    }

    /// Read and parse a RON file
    ///
    /// # Errors
    /// If the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_ron_str(&std::fs::read_to_string(path)?)
    }
}
