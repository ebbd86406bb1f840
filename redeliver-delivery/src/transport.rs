//! Wire transport abstraction

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use redeliver_common::{BatchId, MailContent, MessageId, Session};

use crate::TransportError;

/// Hands one message to the wire
///
/// The transport is an external collaborator: SMTP, an HTTP relay, or a
/// test double. Implementations are called concurrently for different
/// messages.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Deliver `content` using the settings carried by `session`
    ///
    /// # Errors
    /// Any delivery failure; it is recorded against the message, never
    /// returned to the resend caller.
    async fn deliver(&self, session: &Session, content: &MailContent) -> Result<(), TransportError>;
}

/// Transport double recording every delivery
///
/// Messages can be scripted to fail, and an artificial per-delivery delay
/// can be set to keep deliveries in flight.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    deliveries: Arc<Mutex<Vec<(BatchId, MessageId)>>>,
    failures: Arc<Mutex<HashMap<MessageId, TransportError>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// A transport that accepts everything immediately
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `delay` inside every delivery
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every delivery of `message_id` with `error`
    pub fn fail_message(&self, message_id: impl Into<MessageId>, error: TransportError) {
        self.failures.lock().insert(message_id.into(), error);
    }

    /// Every delivery attempted so far, in the order they reached the transport
    #[must_use]
    pub fn deliveries(&self) -> Vec<(BatchId, MessageId)> {
        self.deliveries.lock().clone()
    }

    #[must_use]
    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn deliver(&self, session: &Session, content: &MailContent) -> Result<(), TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.deliveries
            .lock()
            .push((session.batch_id().clone(), content.message_id().clone()));

        self.failures
            .lock()
            .get(content.message_id())
            .cloned()
            .map_or(Ok(()), Err)
    }
}
