//! Caller-side view of one dispatch call

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use redeliver_common::{BatchId, MailState, MailStatus, MessageId};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Progress {
    /// Unknown until the dispatch task has started
    total: Option<usize>,
    processed: usize,
}

impl Progress {
    fn is_done(&self) -> bool {
        self.total.is_some_and(|total| self.processed >= total)
    }
}

#[derive(Debug)]
struct Inner {
    batch_id: BatchId,
    /// Latest status per message, in the order messages were first seen
    statuses: Mutex<Vec<MailStatus>>,
    progress: watch::Sender<Progress>,
}

/// Aggregated status of the messages handed to one dispatch call
///
/// Handles are cheap to clone and all observe the same dispatch. The result
/// is returned before any delivery has happened; poll it with
/// [`is_processed`](Self::is_processed) or await
/// [`wait_till_processed`](Self::wait_till_processed).
#[derive(Debug, Clone)]
pub struct StatusResult {
    inner: Arc<Inner>,
}

impl StatusResult {
    #[must_use]
    pub fn new(batch_id: BatchId) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            inner: Arc::new(Inner {
                batch_id,
                statuses: Mutex::new(Vec::new()),
                progress,
            }),
        }
    }

    /// Fix the number of messages this dispatch will report on
    pub(crate) fn begin(&self, total: usize) {
        self.inner.progress.send_modify(|progress| {
            progress.total = Some(total);
        });
    }

    /// Record the newest status of a message
    ///
    /// The first terminal status of each message advances the processed count.
    pub(crate) fn record(&self, status: MailStatus) {
        let newly_terminal = {
            let mut statuses = self.inner.statuses.lock();
            let terminal = status.state.is_terminal();

            if let Some(existing) = statuses
                .iter_mut()
                .find(|existing| existing.message_id == status.message_id)
            {
                let was_terminal = existing.state.is_terminal();
                *existing = status;
                terminal && !was_terminal
            } else {
                statuses.push(status);
                terminal
            }
        };

        if newly_terminal {
            self.inner.progress.send_modify(|progress| progress.processed += 1);
        }
    }

    #[must_use]
    pub fn batch_id(&self) -> &BatchId {
        &self.inner.batch_id
    }

    /// Number of messages in the dispatch, `0` until it has started
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.inner.progress.borrow().total.unwrap_or_default()
    }

    /// Number of messages that reached `sent` or `failed`
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.inner.progress.borrow().processed
    }

    /// Whether every message of the dispatch has a terminal status
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.inner.progress.borrow().is_done()
    }

    /// Wait until every message has a terminal status
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub async fn wait_till_processed(&self, timeout: Duration) -> bool {
        let mut progress = self.inner.progress.subscribe();
        tokio::time::timeout(timeout, progress.wait_for(Progress::is_done))
            .await
            .is_ok_and(|waited| waited.is_ok())
    }

    /// Latest status of every message seen so far
    #[must_use]
    pub fn all(&self) -> Vec<MailStatus> {
        self.inner.statuses.lock().clone()
    }

    #[must_use]
    pub fn by_state(&self, state: MailState) -> Vec<MailStatus> {
        self.inner
            .statuses
            .lock()
            .iter()
            .filter(|status| status.state == state)
            .cloned()
            .collect()
    }

    /// Messages whose latest status is `failed`
    #[must_use]
    pub fn errors(&self) -> Vec<MailStatus> {
        self.by_state(MailState::Failed)
    }

    #[must_use]
    pub fn status_of(&self, message_id: &MessageId) -> Option<MailStatus> {
        self.inner
            .statuses
            .lock()
            .iter()
            .find(|status| &status.message_id == message_id)
            .cloned()
    }
}
