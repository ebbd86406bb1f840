use async_trait::async_trait;
use redeliver_common::{BatchId, MailContent, MailState, Session};

use super::{MailListener, status_for};
use crate::{StatusResult, TransportError};

/// Listener that only tracks the dispatch in its [`StatusResult`]
#[derive(Debug)]
pub struct MemoryMailListener {
    result: StatusResult,
}

impl MemoryMailListener {
    #[must_use]
    pub fn new(batch_id: BatchId) -> Self {
        Self {
            result: StatusResult::new(batch_id),
        }
    }
}

#[async_trait]
impl MailListener for MemoryMailListener {
    async fn on_send_begin(&self, _session: &Session, total: usize) {
        self.result.begin(total);
    }

    async fn on_message_ready(&self, session: &Session, content: &MailContent) {
        self.result
            .record(status_for(session, content, MailState::Ready));
    }

    async fn on_message_sent(&self, session: &Session, content: &MailContent) {
        self.result
            .record(status_for(session, content, MailState::Sent));
    }

    async fn on_message_failed(
        &self,
        session: &Session,
        content: &MailContent,
        error: &TransportError,
    ) {
        self.result
            .record(status_for(session, content, MailState::Failed).with_error(error.to_string()));
    }

    fn status_result(&self) -> StatusResult {
        self.result.clone()
    }
}
