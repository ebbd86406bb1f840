use std::sync::Arc;

use async_trait::async_trait;
use redeliver_common::{BatchId, MailContent, MailState, MailStatus, Session, internal};
use redeliver_status::StatusStore;

use super::{MailListener, status_for};
use crate::{StatusResult, TransportError};

/// Listener writing every transition to a [`StatusStore`]
///
/// Each transition becomes a new record; nothing already stored is touched.
/// A failing store is logged and otherwise ignored, the in-memory result
/// is still updated.
#[derive(Debug)]
pub struct PersistentMailListener {
    store: Arc<dyn StatusStore>,
    result: StatusResult,
}

impl PersistentMailListener {
    #[must_use]
    pub fn new(store: Arc<dyn StatusStore>, batch_id: BatchId) -> Self {
        Self {
            store,
            result: StatusResult::new(batch_id),
        }
    }

    async fn persist(&self, status: MailStatus) {
        // Stored before it becomes visible, so a processed result implies
        // the store has caught up
        if let Err(err) = self.store.save(&status).await {
            internal!(
                level = WARN,
                batch_id = %status.batch_id,
                message_id = %status.message_id,
                state = %status.state,
                error = %err,
                "Unable to persist mail status"
            );
        }

        self.result.record(status);
    }
}

#[async_trait]
impl MailListener for PersistentMailListener {
    async fn on_send_begin(&self, session: &Session, total: usize) {
        internal!(
            level = DEBUG,
            batch_id = %session.batch_id(),
            total,
            "Dispatch started"
        );
        self.result.begin(total);
    }

    async fn on_message_ready(&self, session: &Session, content: &MailContent) {
        self.persist(status_for(session, content, MailState::Ready))
            .await;
    }

    async fn on_message_sent(&self, session: &Session, content: &MailContent) {
        self.persist(status_for(session, content, MailState::Sent))
            .await;
    }

    async fn on_message_failed(
        &self,
        session: &Session,
        content: &MailContent,
        error: &TransportError,
    ) {
        self.persist(status_for(session, content, MailState::Failed).with_error(error.to_string()))
            .await;
    }

    fn status_result(&self) -> StatusResult {
        self.result.clone()
    }
}
