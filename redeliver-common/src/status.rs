use core::fmt::{self, Display, Formatter};
use std::{borrow::Cow, str::FromStr};

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BatchId, MessageId};

/// Delivery state recorded for one attempt of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MailState {
    /// Accepted by the sender and about to be handed to the transport
    Ready,
    /// The transport accepted the message
    Sent,
    /// The transport reported a failure
    Failed,
}

impl MailState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transition follows this state within one attempt
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

impl Display for MailState {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for MailState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ready" => Ok(Self::Ready),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown mail state: {other}")),
        }
    }
}

/// One append-only delivery status snapshot for a (batch, message) pair
///
/// Every transition of every attempt produces a new record; older records
/// are never rewritten. The most recent record for a pair describes its
/// current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailStatus {
    pub batch_id: BatchId,
    pub message_id: MessageId,
    pub state: MailState,
    /// Short description of the failure, for `Failed` records
    pub error_summary: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Comma separated recipient addresses, when known
    pub recipients: Option<String>,
    /// Arbitrary queryable metadata
    pub metadata: AHashMap<String, String>,
}

impl MailStatus {
    /// Create a record for `state`, timestamped now
    #[must_use]
    pub fn new(batch_id: BatchId, message_id: MessageId, state: MailState) -> Self {
        Self {
            batch_id,
            message_id,
            state,
            error_summary: None,
            timestamp: Utc::now(),
            recipients: None,
            metadata: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with_error(mut self, summary: impl Into<String>) -> Self {
        self.error_summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_recipients(mut self, recipients: &[String]) -> Self {
        self.recipients = (!recipients.is_empty()).then(|| recipients.join(", "));
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Look up a field by its query name
    ///
    /// `batchId`, `messageId`, `state`, `errorSummary` and `recipients` map to
    /// the record's own fields; any other name is looked up in `metadata`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "batchId" => Some(Cow::Borrowed(self.batch_id.as_str())),
            "messageId" => Some(Cow::Borrowed(self.message_id.as_str())),
            "state" => Some(Cow::Borrowed(self.state.as_str())),
            "errorSummary" => self.error_summary.as_deref().map(Cow::Borrowed),
            "recipients" => self.recipients.as_deref().map(Cow::Borrowed),
            "timestamp" => Some(Cow::Owned(self.timestamp.to_rfc3339())),
            other => self.metadata.get(other).map(|v| Cow::Borrowed(v.as_str())),
        }
    }
}
