//! Observers of a single dispatch call

mod memory;
mod persistent;

use async_trait::async_trait;
use redeliver_common::{MailContent, MailState, MailStatus, Session};

pub use memory::MemoryMailListener;
pub use persistent::PersistentMailListener;

use crate::{StatusResult, TransportError};

/// Receives the lifecycle of every message in one dispatch call
///
/// A listener is bound to exactly one call of
/// [`MailSender::send_asynchronously`](crate::MailSender::send_asynchronously).
/// Message callbacks arrive concurrently and in no particular order, but
/// `on_send_begin` always comes first and every message ends with exactly one
/// of `on_message_sent` or `on_message_failed`.
#[async_trait]
pub trait MailListener: Send + Sync + std::fmt::Debug {
    async fn on_send_begin(&self, session: &Session, total: usize);

    /// The message is about to be handed to the transport
    async fn on_message_ready(&self, session: &Session, content: &MailContent);

    async fn on_message_sent(&self, session: &Session, content: &MailContent);

    async fn on_message_failed(
        &self,
        session: &Session,
        content: &MailContent,
        error: &TransportError,
    );

    /// Handle observing everything this listener has been told
    fn status_result(&self) -> StatusResult;
}

fn status_for(session: &Session, content: &MailContent, state: MailState) -> MailStatus {
    MailStatus::new(
        session.batch_id().clone(),
        content.message_id().clone(),
        state,
    )
    .with_recipients(&content.recipients())
}
