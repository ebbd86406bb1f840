//! Asynchronous, bounded dispatch of messages to the transport

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures_util::FutureExt;
use redeliver_common::{MailContent, Session, audit, internal, outgoing};
use serde::Deserialize;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{ConfigError, MailListener, Transport, TransportError};

/// Limits applied to every dispatch
///
/// # Examples
///
/// ```ron
/// sender: (
///     max_concurrent_sends: 16,
///     send_timeout_secs: 60,
/// ),
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SenderConfig {
    /// Maximum number of transport calls in flight across all dispatches
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,

    /// Upper bound for a single transport call, in seconds
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

const fn default_max_concurrent_sends() -> usize {
    16
}

const fn default_send_timeout_secs() -> u64 {
    60
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sends: default_max_concurrent_sends(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

/// Hands messages to a [`Transport`] in the background
#[derive(Debug, Clone)]
pub struct MailSender {
    transport: Arc<dyn Transport>,
    permits: Arc<Semaphore>,
    send_timeout: Duration,
}

impl MailSender {
    /// Create a sender for `transport`
    ///
    /// # Errors
    /// If the configured concurrency or timeout is zero, or the concurrency
    /// exceeds what a semaphore can hold.
    pub fn new(transport: Arc<dyn Transport>, config: &SenderConfig) -> Result<Self, ConfigError> {
        if config.max_concurrent_sends == 0 || config.max_concurrent_sends > Semaphore::MAX_PERMITS
        {
            return Err(ConfigError::Sender(format!(
                "max_concurrent_sends must be between 1 and {}, got {}",
                Semaphore::MAX_PERMITS,
                config.max_concurrent_sends
            )));
        }

        if config.send_timeout_secs == 0 {
            return Err(ConfigError::Sender(
                "send_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            transport,
            permits: Arc::new(Semaphore::new(config.max_concurrent_sends)),
            send_timeout: Duration::from_secs(config.send_timeout_secs),
        })
    }

    /// Dispatch `messages` with `session` and return immediately
    ///
    /// Progress is reported to `listener`: `on_send_begin` first, then one
    /// terminal callback per message. Messages are delivered concurrently in
    /// no particular order.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn send_asynchronously(
        &self,
        messages: Vec<MailContent>,
        session: Session,
        listener: Arc<dyn MailListener>,
    ) {
        tokio::spawn(self.clone().dispatch(messages, Arc::new(session), listener));
    }

    async fn dispatch(
        self,
        messages: Vec<MailContent>,
        session: Arc<Session>,
        listener: Arc<dyn MailListener>,
    ) {
        listener.on_send_begin(&session, messages.len()).await;

        let mut deliveries = JoinSet::new();
        for content in messages {
            deliveries.spawn(self.clone().deliver(
                Arc::clone(&session),
                content,
                Arc::clone(&listener),
            ));
        }

        while let Some(joined) = deliveries.join_next().await {
            if let Err(err) = joined {
                internal!(
                    level = ERROR,
                    batch_id = %session.batch_id(),
                    error = %err,
                    "Delivery task ended abnormally"
                );
            }
        }
    }

    async fn deliver(
        self,
        session: Arc<Session>,
        content: MailContent,
        listener: Arc<dyn MailListener>,
    ) {
        let started = std::time::Instant::now();

        let outcome = match self.permits.acquire().await {
            Ok(_permit) => {
                listener.on_message_ready(&session, &content).await;
                self.attempt(&session, &content).await
            }
            Err(_) => Err(TransportError::Internal(
                "sender is no longer accepting messages".to_string(),
            )),
        };

        let batch_id = session.batch_id().as_str();
        let message_id = content.message_id().as_str();

        match outcome {
            Ok(()) => {
                outgoing!(
                    level = DEBUG,
                    batch_id,
                    message_id,
                    "Message accepted by transport"
                );
                audit::log_delivery_success(batch_id, message_id, started.elapsed().as_millis());
                listener.on_message_sent(&session, &content).await;
            }
            Err(err) => {
                outgoing!(
                    level = WARN,
                    batch_id,
                    message_id,
                    error = %err,
                    "Message delivery failed"
                );
                audit::log_delivery_failure(batch_id, message_id, &err.to_string());
                listener.on_message_failed(&session, &content, &err).await;
            }
        }
    }

    async fn attempt(&self, session: &Session, content: &MailContent) -> Result<(), TransportError> {
        let delivery = AssertUnwindSafe(self.transport.deliver(session, content)).catch_unwind();

        match tokio::time::timeout(self.send_timeout, delivery).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::Internal("transport panicked".to_string())),
            Err(_) => Err(TransportError::Timeout(self.send_timeout.as_secs())),
        }
    }
}
