use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use redeliver_common::{MailStatus, internal};
use serde::Deserialize;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use crate::{SortField, StatusFilter, StatusStoreError, filter::select, store::StatusStore};

const LENGTH_PREFIX: usize = std::mem::size_of::<u32>();

/// File-backed status store
///
/// Records are appended to a single log file, each one a little-endian `u32`
/// length followed by the bincode encoding of the [`MailStatus`]. Queries read
/// the whole log back. Appends are serialised through an async mutex shared by
/// clones of the store.
///
/// A record cut short by a crash mid-append is ignored (with a warning) when
/// it is the last thing in the log, and cut off before the next append. A log
/// must only be written through one store and its clones.
#[derive(Debug, Clone)]
pub struct FileStatusStore {
    path: PathBuf,
    /// End of the last complete record this store knows about
    append: Arc<Mutex<Option<u64>>>,
}

impl Default for FileStatusStore {
    fn default() -> Self {
        Self::new(PathBuf::from("/var/spool/redeliver/status.log"))
    }
}

impl<'de> Deserialize<'de> for FileStatusStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct FileStatusStoreHelper {
            path: PathBuf,
        }

        let helper = FileStatusStoreHelper::deserialize(deserializer)?;
        Self::validate_path(&helper.path).map_err(serde::de::Error::custom)?;

        Ok(Self::new(helper.path))
    }
}

impl FileStatusStore {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            append: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a store logging to `path`
    ///
    /// # Errors
    /// If the path is relative or contains `..` components
    pub fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        Self::validate_path(&path)?;
        Ok(Self::new(path))
    }

    fn validate_path(path: &Path) -> crate::Result<()> {
        if path
            .components()
            .any(|component| component == std::path::Component::ParentDir)
        {
            return Err(StatusStoreError::Validation(format!(
                "Status log path cannot contain '..' components: {}",
                path.display()
            )));
        }

        if !path.is_absolute() {
            return Err(StatusStoreError::Validation(format!(
                "Status log path must be absolute: {}",
                path.display()
            )));
        }

        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory holding the log, if missing
    ///
    /// # Errors
    /// If the directory cannot be created
    pub fn init(&self) -> crate::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.try_exists()?
        {
            internal!("{} does not exist, creating...", parent.display());
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    async fn read_log(&self) -> crate::Result<Vec<u8>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_all(&self) -> crate::Result<Vec<MailStatus>> {
        let bytes = self.read_log().await?;
        Ok(self.decode(&bytes)?.0)
    }

    /// Decode every complete record in `bytes`
    ///
    /// Also returns the length of the prefix those records occupy.
    fn decode(&self, bytes: &[u8]) -> crate::Result<(Vec<MailStatus>, usize)> {
        let mut records = Vec::new();
        let mut cursor = 0;

        while cursor < bytes.len() {
            let Some(prefix) = bytes.get(cursor..cursor + LENGTH_PREFIX) else {
                internal!(
                    level = WARN,
                    "Ignoring truncated record header at offset {cursor} of {}",
                    self.path.display()
                );
                break;
            };
            let mut len = [0u8; LENGTH_PREFIX];
            len.copy_from_slice(prefix);
            let len = u32::from_le_bytes(len) as usize;
            let start = cursor + LENGTH_PREFIX;

            let Some(body) = bytes.get(start..start + len) else {
                internal!(
                    level = WARN,
                    "Ignoring truncated record at offset {cursor} of {}",
                    self.path.display()
                );
                break;
            };

            let (status, read) = bincode::serde::decode_from_slice::<MailStatus, _>(
                body,
                bincode::config::standard(),
            )?;
            if read != len {
                return Err(StatusStoreError::Corrupted(format!(
                    "record at offset {cursor} has {} trailing bytes",
                    len - read
                )));
            }

            records.push(status);
            cursor = start + len;
        }

        Ok((records, cursor))
    }

    /// Cut an incomplete trailing record off the log
    ///
    /// Returns the resulting length of the log.
    async fn truncate_incomplete_tail(&self) -> crate::Result<u64> {
        let bytes = self.read_log().await?;
        let (_, complete) = self.decode(&bytes)?;
        let complete_len = u64::try_from(complete)
            .map_err(|_| StatusStoreError::Internal("status log too large".to_string()))?;

        if complete < bytes.len() {
            internal!(
                level = WARN,
                "Discarding {} bytes of incomplete record at the end of {}",
                bytes.len() - complete,
                self.path.display()
            );
            let file = fs::OpenOptions::new().write(true).open(&self.path).await?;
            file.set_len(complete_len).await?;
            file.sync_all().await?;
        }

        Ok(complete_len)
    }

    async fn log_len(&self) -> crate::Result<u64> {
        match fs::metadata(&self.path).await {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn append_record(&self, record: &[u8]) -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(record).await?;
        file.flush().await
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    #[tracing::instrument(level = "debug", skip(self, status), fields(batch_id = %status.batch_id, message_id = %status.message_id, state = %status.state))]
    async fn save(&self, status: &MailStatus) -> crate::Result<()> {
        let body = bincode::serde::encode_to_vec(status, bincode::config::standard())?;
        let len = u32::try_from(body.len()).map_err(|_| {
            StatusStoreError::Internal(format!("status record too large: {} bytes", body.len()))
        })?;

        let mut record = Vec::with_capacity(LENGTH_PREFIX + body.len());
        record.extend_from_slice(&len.to_le_bytes());
        record.extend_from_slice(&body);

        let mut end = self.append.lock().await;

        // Anything other than what this store last wrote means an append was
        // cut short, here or in an earlier process
        if *end != Some(self.log_len().await?) {
            *end = Some(self.truncate_incomplete_tail().await?);
        }

        if let Err(err) = self.append_record(&record).await {
            *end = None;
            return Err(err.into());
        }
        *end = end.map(|known| known + LENGTH_PREFIX as u64 + u64::from(len));

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
        let records = self.read_all().await?;
        Ok(select(&records, filter, offset, count, sort, reverse))
    }

    async fn count(&self, filter: &StatusFilter) -> crate::Result<usize> {
        Ok(self
            .read_all()
            .await?
            .iter()
            .filter(|status| filter.matches(status))
            .count())
    }
}
