use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use redeliver_common::{BatchId, MailContent, MessageId, Session, internal};
use serde::Deserialize;
use tokio::fs;

use crate::{SpoolError, ValidationError, store::ContentStore};

const TEMP_PREFIX: &str = ".tmp_";
const DELETED_SUFFIX: &str = ".deleted";

/// File-based content store
///
/// Content is laid out as one directory per batch, one file per message:
/// `{path}/{batch_id}/{message_id}.eml`.
///
/// # Security
/// - Batch and message ids must be usable as a single path component; ids
///   containing separators, `..`, or a leading `.` are rejected
/// - The root path is validated when the store is built or deserialized
///
/// # Atomicity
/// Writes go to a uniquely named `.tmp_` file that is then hard linked into
/// place, so a partially written message is never visible and an existing
/// message is never replaced. Deletes rename to a `.deleted` suffix before
/// removal. Leftovers are removed by [`FileContentStore::init`].
#[derive(Debug, Clone)]
pub struct FileContentStore {
    path: PathBuf,
}

impl Default for FileContentStore {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/spool/redeliver/content"),
        }
    }
}

// Custom Deserialize implementation with path validation
impl<'de> Deserialize<'de> for FileContentStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct FileContentStoreHelper {
            path: PathBuf,
        }

        let helper = FileContentStoreHelper::deserialize(deserializer)?;
        Self::validate_path(&helper.path).map_err(serde::de::Error::custom)?;

        Ok(Self { path: helper.path })
    }
}

impl FileContentStore {
    /// Validate a store path
    ///
    /// # Errors
    /// If the path contains `..`, is relative, or lies in a system directory
    fn validate_path(path: &Path) -> Result<(), ValidationError> {
        if path
            .components()
            .any(|component| component == std::path::Component::ParentDir)
        {
            return Err(ValidationError::ParentDir(path.display().to_string()));
        }

        if !path.is_absolute() {
            return Err(ValidationError::NotAbsolute(path.display().to_string()));
        }

        let sensitive_prefixes = [
            "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev",
        ];

        for prefix in &sensitive_prefixes {
            if path.starts_with(prefix) {
                return Err(ValidationError::SystemDirectory {
                    prefix: (*prefix).to_string(),
                    path: path.display().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Create a new `FileContentStore` builder
    #[must_use]
    pub fn builder() -> FileContentStoreBuilder {
        FileContentStoreBuilder::default()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prepare the store directory
    ///
    /// Creates the root directory when missing and removes `.tmp_` and
    /// `.deleted` leftovers from interrupted writes and deletes.
    ///
    /// # Errors
    /// - If the directory cannot be created or read
    /// - If the path exists but is not a directory
    pub fn init(&self) -> crate::Result<()> {
        internal!("Initialising content store at {}", self.path.display());

        if !self.path.try_exists()? {
            internal!("{} does not exist, creating...", self.path.display());
            std::fs::create_dir_all(&self.path)?;
        } else if !self.path.is_dir() {
            return Err(ValidationError::NotDirectory(self.path.display().to_string()).into());
        }

        let mut cleaned = 0;
        for batch in std::fs::read_dir(&self.path)? {
            let batch = batch?;
            if !batch.file_type()?.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(batch.path())? {
                let entry = entry?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with(TEMP_PREFIX) || name.ends_with(DELETED_SUFFIX) {
                    std::fs::remove_file(entry.path())?;
                    cleaned += 1;
                }
            }
        }

        if cleaned > 0 {
            internal!(
                level = INFO,
                "Cleaned up {cleaned} orphaned files from content store"
            );
        }

        Ok(())
    }

    fn batch_dir(&self, batch_id: &BatchId) -> crate::Result<PathBuf> {
        if !batch_id.is_path_safe() {
            return Err(ValidationError::InvalidIdentifier(batch_id.to_string()).into());
        }
        Ok(self.path.join(batch_id.as_str()))
    }

    fn message_filename(message_id: &MessageId) -> crate::Result<String> {
        if !message_id.is_path_safe() {
            return Err(ValidationError::InvalidIdentifier(message_id.to_string()).into());
        }
        Ok(format!("{message_id}.eml"))
    }

    fn not_found(batch_id: &BatchId, message_id: &MessageId) -> SpoolError {
        SpoolError::NotFound {
            batch_id: batch_id.clone(),
            message_id: message_id.clone(),
        }
    }
}

#[async_trait]
impl ContentStore for FileContentStore {
    #[tracing::instrument(level = "debug", skip(self, content), fields(message_id = %content.message_id()))]
    async fn save(&self, batch_id: &BatchId, content: &MailContent) -> crate::Result<()> {
        let dir = self.batch_dir(batch_id)?;
        let filename = Self::message_filename(content.message_id())?;
        let final_path = dir.join(&filename);

        fs::create_dir_all(&dir).await?;

        // Unique per call, so concurrent saves never share a temp file
        let temp_path = dir.join(format!("{TEMP_PREFIX}{}_{filename}", ulid::Ulid::new()));
        fs::write(&temp_path, content.data()).await?;

        // Unlike rename, linking never replaces an existing file
        let linked = fs::hard_link(&temp_path, &final_path).await;
        fs::remove_file(&temp_path).await?;

        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SpoolError::AlreadyExists {
                    batch_id: batch_id.clone(),
                    message_id: content.message_id().clone(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        internal!(
            level = DEBUG,
            "Stored message {} of batch {batch_id} at {}",
            content.message_id(),
            final_path.display()
        );

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, _session))]
    async fn load(
        &self,
        _session: &Session,
        batch_id: &BatchId,
        message_id: &MessageId,
    ) -> crate::Result<MailContent> {
        let path = self
            .batch_dir(batch_id)?
            .join(Self::message_filename(message_id)?);

        match fs::read(&path).await {
            Ok(data) => Ok(MailContent::new(message_id.clone(), data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Self::not_found(batch_id, message_id)),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete(&self, batch_id: &BatchId, message_id: &MessageId) -> crate::Result<()> {
        let dir = self.batch_dir(batch_id)?;
        let filename = Self::message_filename(message_id)?;
        let path = dir.join(&filename);
        let deleted_path = dir.join(format!("{filename}{DELETED_SUFFIX}"));

        match fs::rename(&path, &deleted_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Self::not_found(batch_id, message_id));
            }
            Err(e) => return Err(e.into()),
        }
        fs::remove_file(&deleted_path).await?;

        internal!(level = DEBUG, "Deleted message {message_id} of batch {batch_id}");

        Ok(())
    }
}

/// Builder for `FileContentStore`
#[derive(Debug, Default)]
pub struct FileContentStoreBuilder {
    path: PathBuf,
}

impl FileContentStoreBuilder {
    /// Set the store directory path
    #[must_use]
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Build the final `FileContentStore`
    ///
    /// # Errors
    /// Returns an error if the path is invalid or potentially dangerous
    pub fn build(self) -> Result<FileContentStore, ValidationError> {
        FileContentStore::validate_path(&self.path)?;
        Ok(FileContentStore { path: self.path })
    }
}
