//! Reload stored messages and send them again

use std::sync::Arc;

use redeliver_common::{BatchId, MailStatus, MessageId, audit, internal};
use redeliver_spool::ContentStore;
use redeliver_status::{StatusFilter, StatusStore};

use crate::{
    ConfigError, MailListener, MailSender, PersistentMailListener, ResendError, ResenderConfig,
    SessionFactory, StatusResult, Transport, error::root_cause,
};

/// What happened to one candidate of a bulk resend
#[derive(Debug)]
pub enum ResendOutcome {
    /// The message was handed to the sender again
    Dispatched {
        status: MailStatus,
        result: StatusResult,
    },
    /// The message could not be reloaded and was not sent
    Skipped {
        status: MailStatus,
        reason: ResendError,
    },
}

impl ResendOutcome {
    /// The status record that selected this candidate
    #[must_use]
    pub const fn status(&self) -> &MailStatus {
        match self {
            Self::Dispatched { status, .. } | Self::Skipped { status, .. } => status,
        }
    }

    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Sends previously attempted messages again, individually or in bulk
///
/// A resend keeps the message's original batch id, reuses its stored content
/// untouched and appends new status records next to the old ones.
#[derive(Debug, Clone)]
pub struct Resender {
    sessions: SessionFactory,
    content: Arc<dyn ContentStore>,
    status: Arc<dyn StatusStore>,
    sender: MailSender,
}

impl Resender {
    #[must_use]
    pub fn new(
        sessions: SessionFactory,
        content: Arc<dyn ContentStore>,
        status: Arc<dyn StatusStore>,
        sender: MailSender,
    ) -> Self {
        Self {
            sessions,
            content,
            status,
            sender,
        }
    }

    /// Build a resender, its stores and its sender from configuration
    ///
    /// # Errors
    /// If a store cannot be initialised or the sender limits are invalid
    pub fn from_config(
        config: ResenderConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        audit::init(config.audit);

        let content = config.content.into_content_store()?;
        let status = config.status.into_status_store()?;
        let sender = MailSender::new(transport, &config.sender)?;

        Ok(Self::new(
            SessionFactory::new(config.session),
            content,
            status,
            sender,
        ))
    }

    #[must_use]
    pub fn content_store(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    #[must_use]
    pub fn status_store(&self) -> &Arc<dyn StatusStore> {
        &self.status
    }

    /// Send one stored message again
    ///
    /// Returns as soon as the message is handed to the sender; delivery is
    /// observed through the returned [`StatusResult`].
    ///
    /// # Errors
    /// [`ResendError::ContentUnavailable`] if no content is stored for the
    /// pair, [`ResendError::Store`] if the content store fails. Nothing is
    /// sent or recorded in either case.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    #[tracing::instrument(skip_all, fields(batch_id = %batch_id, message_id = %message_id))]
    pub async fn resend_single(
        &self,
        batch_id: &BatchId,
        message_id: &MessageId,
    ) -> Result<StatusResult, ResendError> {
        let session = self.sessions.pinned(batch_id);
        let content = self.content.load(&session, batch_id, message_id).await?;

        let listener = Arc::new(PersistentMailListener::new(
            Arc::clone(&self.status),
            session.batch_id().clone(),
        ));
        let result = listener.status_result();

        audit::log_resend_dispatched(
            batch_id.as_str(),
            message_id.as_str(),
            &content.recipients(),
            content.len(),
        );
        self.sender
            .send_asynchronously(vec![content], session, listener);

        Ok(result)
    }

    /// Resend every message selected by a page of the status history
    ///
    /// Candidates that cannot be reloaded are logged and left out; the
    /// returned pairs are in processing order.
    ///
    /// # Errors
    /// [`ResendError::Store`] if the status store cannot be queried
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub async fn resend_bulk(
        &self,
        filter: &StatusFilter,
        offset: usize,
        count: usize,
    ) -> Result<Vec<(MailStatus, StatusResult)>, ResendError> {
        Ok(self
            .resend_bulk_detailed(filter, offset, count)
            .await?
            .into_iter()
            .filter_map(|outcome| match outcome {
                ResendOutcome::Dispatched { status, result } => Some((status, result)),
                ResendOutcome::Skipped { .. } => None,
            })
            .collect())
    }

    /// Like [`resend_bulk`](Self::resend_bulk), but reports skipped
    /// candidates too
    ///
    /// # Errors
    /// [`ResendError::Store`] if the status store cannot be queried
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    #[tracing::instrument(skip(self))]
    pub async fn resend_bulk_detailed(
        &self,
        filter: &StatusFilter,
        offset: usize,
        count: usize,
    ) -> Result<Vec<ResendOutcome>, ResendError> {
        let candidates = self.status.query(filter, offset, count, None, false).await?;
        internal!(
            level = DEBUG,
            candidates = candidates.len(),
            "Resending messages"
        );

        let mut outcomes = Vec::with_capacity(candidates.len());
        for status in candidates {
            match self
                .resend_single(&status.batch_id, &status.message_id)
                .await
            {
                Ok(result) => outcomes.push(ResendOutcome::Dispatched { status, result }),
                Err(reason) => {
                    let cause = root_cause(&reason);
                    internal!(
                        level = WARN,
                        batch_id = %status.batch_id,
                        message_id = %status.message_id,
                        cause = %cause,
                        "Unable to resend message, skipping"
                    );
                    audit::log_resend_skipped(
                        status.batch_id.as_str(),
                        status.message_id.as_str(),
                        &cause,
                    );
                    outcomes.push(ResendOutcome::Skipped { status, reason });
                }
            }
        }

        Ok(outcomes)
    }
}
