#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use redeliver_common::{BatchId, MailContent, MailState, MailStatus, MessageId};
use redeliver_delivery::{
    MailSender, MockTransport, ResendOutcome, Resender, ResenderConfig, SenderConfig,
    SessionFactory, TransportError,
};
use redeliver_spool::{ContentStore, TestContentStore};
use redeliver_status::{
    MemoryStatusStore, SortField, StatusFilter, StatusStore, StatusStoreError,
};

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    resender: Resender,
    content: TestContentStore,
    status: Arc<MemoryStatusStore>,
    transport: MockTransport,
}

impl Harness {
    fn new() -> Self {
        let content = TestContentStore::new();
        let status = Arc::new(MemoryStatusStore::new());
        let transport = MockTransport::new();
        let sender = MailSender::new(Arc::new(transport.clone()), &SenderConfig::default())
            .expect("sender");

        let resender = Resender::new(
            SessionFactory::default(),
            Arc::new(content.clone()),
            status.clone(),
            sender,
        );

        Self {
            resender,
            content,
            status,
            transport,
        }
    }

    /// Record a failed first attempt, optionally keeping its content
    async fn failed_attempt(&self, batch: &str, message: &str, keep_content: bool) {
        if keep_content {
            let body = format!("To: {message}@example.com\r\nSubject: {batch}\r\n\r\nhello");
            self.content
                .save(
                    &batch.into(),
                    &MailContent::new(message.into(), body.into_bytes()),
                )
                .await
                .unwrap();
        }

        self.status
            .save(
                &MailStatus::new(batch.into(), message.into(), MailState::Failed)
                    .with_error("Connection failed: refused"),
            )
            .await
            .unwrap();
    }

    async fn history(&self, batch: &str, message: &str) -> Vec<MailState> {
        let filter = StatusFilter::new()
            .with("batchId", batch)
            .with("messageId", message);
        self.status
            .query(&filter, 0, 100, None, false)
            .await
            .unwrap()
            .into_iter()
            .map(|status| status.state)
            .collect()
    }
}

fn failed_in(batch: &str) -> StatusFilter {
    StatusFilter::new()
        .with("batchId", batch)
        .with("state", MailState::Failed)
}

#[tokio::test]
async fn test_resend_single_keeps_batch_id() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", true).await;

    let result = harness
        .resender
        .resend_single(&BatchId::from("B1"), &MessageId::from("M1"))
        .await
        .unwrap();

    assert_eq!(result.batch_id().as_str(), "B1");
    assert!(result.wait_till_processed(WAIT).await);
    assert_eq!(
        harness.transport.deliveries(),
        vec![(BatchId::from("B1"), MessageId::from("M1"))]
    );

    let latest = harness
        .status
        .latest(&"B1".into(), &"M1".into())
        .await
        .unwrap()
        .expect("latest status");
    assert_eq!(latest.state, MailState::Sent);
    assert_eq!(latest.recipients.as_deref(), Some("M1@example.com"));
}

#[tokio::test]
async fn test_resend_single_without_content_sends_nothing() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", false).await;

    let error = harness
        .resender
        .resend_single(&"B1".into(), &"M1".into())
        .await
        .unwrap_err();

    assert!(error.is_content_unavailable());
    assert_eq!(harness.content.load_count(), 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.transport.delivery_count(), 0);
    assert_eq!(harness.history("B1", "M1").await, vec![MailState::Failed]);
}

#[tokio::test]
async fn test_resend_single_store_failure() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", true).await;
    harness.content.fail_loads_for("B1", "M1");

    let error = harness
        .resender
        .resend_single(&"B1".into(), &"M1".into())
        .await
        .unwrap_err();

    assert!(error.is_store_error());
    assert_eq!(harness.transport.delivery_count(), 0);
}

#[tokio::test]
async fn test_bulk_skips_missing_content() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", true).await;
    harness.failed_attempt("B1", "M2", false).await;
    harness.failed_attempt("B1", "M3", true).await;
    harness.failed_attempt("B1", "M4", false).await;

    let pairs = harness
        .resender
        .resend_bulk(&failed_in("B1"), 0, 10)
        .await
        .unwrap();

    let resent: Vec<_> = pairs
        .iter()
        .map(|(status, _)| status.message_id.to_string())
        .collect();
    assert_eq!(resent, vec!["M1", "M3"]);

    for (status, result) in &pairs {
        assert_eq!(status.state, MailState::Failed);
        assert!(result.wait_till_processed(WAIT).await);
    }
    assert_eq!(harness.transport.delivery_count(), 2);
}

#[tokio::test]
async fn test_bulk_with_no_content_at_all() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", false).await;
    harness.failed_attempt("B1", "M2", false).await;

    let pairs = harness
        .resender
        .resend_bulk(&failed_in("B1"), 0, 10)
        .await
        .unwrap();

    assert!(pairs.is_empty());
    assert_eq!(harness.content.load_count(), 2);
    assert_eq!(harness.transport.delivery_count(), 0);
}

#[tokio::test]
async fn test_bulk_with_zero_count() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", true).await;

    let pairs = harness
        .resender
        .resend_bulk(&StatusFilter::new(), 0, 0)
        .await
        .unwrap();

    assert!(pairs.is_empty());
    assert_eq!(harness.content.load_count(), 0);
    assert_eq!(harness.transport.delivery_count(), 0);
}

#[tokio::test]
async fn test_bulk_respects_paging() {
    let harness = Harness::new();
    for message in ["M1", "M2", "M3", "M4"] {
        harness.failed_attempt("B1", message, true).await;
    }

    let pairs = harness
        .resender
        .resend_bulk(&failed_in("B1"), 1, 2)
        .await
        .unwrap();

    let resent: Vec<_> = pairs
        .iter()
        .map(|(status, _)| status.message_id.to_string())
        .collect();
    assert_eq!(resent, vec!["M2", "M3"]);
}

#[tokio::test]
async fn test_only_the_message_with_content_is_resent() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", true).await;
    harness.failed_attempt("B1", "M2", false).await;

    let outcomes = harness
        .resender
        .resend_bulk_detailed(&failed_in("B1"), 0, 10)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    let ResendOutcome::Dispatched { status, result } = &outcomes[0] else {
        panic!("M1 should have been dispatched: {:?}", outcomes[0]);
    };
    assert_eq!(status.message_id.as_str(), "M1");
    assert!(result.wait_till_processed(WAIT).await);

    let ResendOutcome::Skipped { status, reason } = &outcomes[1] else {
        panic!("M2 should have been skipped: {:?}", outcomes[1]);
    };
    assert_eq!(status.message_id.as_str(), "M2");
    assert!(reason.is_content_unavailable());

    assert_eq!(
        harness.transport.deliveries(),
        vec![(BatchId::from("B1"), MessageId::from("M1"))]
    );
    assert_eq!(
        harness.history("B1", "M1").await,
        vec![MailState::Failed, MailState::Ready, MailState::Sent]
    );
    assert_eq!(harness.history("B1", "M2").await, vec![MailState::Failed]);
}

#[tokio::test]
async fn test_prior_history_survives_a_resend() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", true).await;
    let before = harness
        .status
        .query(&StatusFilter::new(), 0, 10, None, false)
        .await
        .unwrap();

    let result = harness
        .resender
        .resend_single(&"B1".into(), &"M1".into())
        .await
        .unwrap();
    assert!(result.wait_till_processed(WAIT).await);

    let after = harness
        .status
        .query(&StatusFilter::new(), 0, 10, Some(SortField::Timestamp), false)
        .await
        .unwrap();
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2].state, MailState::Sent);
}

#[tokio::test]
async fn test_transport_failure_is_recorded() {
    let harness = Harness::new();
    harness.failed_attempt("B1", "M1", true).await;
    harness.transport.fail_message(
        "M1",
        TransportError::Rejected("550 mailbox unavailable".to_string()),
    );

    let result = harness
        .resender
        .resend_single(&"B1".into(), &"M1".into())
        .await
        .unwrap();
    assert!(result.wait_till_processed(WAIT).await);

    let errors = result.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].error_summary.as_deref(),
        Some("Message rejected: 550 mailbox unavailable")
    );

    let latest = harness
        .status
        .latest(&"B1".into(), &"M1".into())
        .await
        .unwrap()
        .expect("latest status");
    assert_eq!(latest.state, MailState::Failed);
    assert_eq!(
        harness.history("B1", "M1").await,
        vec![MailState::Failed, MailState::Ready, MailState::Failed]
    );
}

#[derive(Debug)]
struct UnreachableStatusStore;

#[async_trait]
impl StatusStore for UnreachableStatusStore {
    async fn save(&self, _status: &MailStatus) -> redeliver_status::Result<()> {
        Err(StatusStoreError::Internal("store offline".to_string()))
    }

    async fn query(
        &self,
        _filter: &StatusFilter,
        _offset: usize,
        _count: usize,
        _sort: Option<SortField>,
        _reverse: bool,
    ) -> redeliver_status::Result<Vec<MailStatus>> {
        Err(StatusStoreError::Internal("store offline".to_string()))
    }

    async fn count(&self, _filter: &StatusFilter) -> redeliver_status::Result<usize> {
        Err(StatusStoreError::Internal("store offline".to_string()))
    }
}

#[tokio::test]
async fn test_bulk_query_failure_is_returned() {
    let transport = MockTransport::new();
    let resender = Resender::new(
        SessionFactory::default(),
        Arc::new(TestContentStore::new()),
        Arc::new(UnreachableStatusStore),
        MailSender::new(Arc::new(transport.clone()), &SenderConfig::default()).unwrap(),
    );

    let error = resender
        .resend_bulk(&StatusFilter::new(), 0, 10)
        .await
        .unwrap_err();
    assert!(error.is_store_error());
    assert_eq!(transport.delivery_count(), 0);
}

#[tokio::test]
async fn test_zero_count_still_queries_the_store() {
    let transport = MockTransport::new();
    let resender = Resender::new(
        SessionFactory::default(),
        Arc::new(TestContentStore::new()),
        Arc::new(UnreachableStatusStore),
        MailSender::new(Arc::new(transport.clone()), &SenderConfig::default()).unwrap(),
    );

    let error = resender
        .resend_bulk(&StatusFilter::new(), 0, 0)
        .await
        .unwrap_err();
    assert!(error.is_store_error());
    assert_eq!(transport.delivery_count(), 0);
}

#[tokio::test]
async fn test_status_store_failure_does_not_stop_delivery() {
    let content = TestContentStore::new();
    content
        .save(
            &"B1".into(),
            &MailContent::new("M1".into(), b"Subject: hi\r\n\r\nbody".to_vec()),
        )
        .await
        .unwrap();

    let transport = MockTransport::new();
    let resender = Resender::new(
        SessionFactory::default(),
        Arc::new(content),
        Arc::new(UnreachableStatusStore),
        MailSender::new(Arc::new(transport.clone()), &SenderConfig::default()).unwrap(),
    );

    let result = resender
        .resend_single(&"B1".into(), &"M1".into())
        .await
        .unwrap();
    assert!(result.wait_till_processed(WAIT).await);
    assert_eq!(result.by_state(MailState::Sent).len(), 1);
    assert_eq!(transport.delivery_count(), 1);
}

#[tokio::test]
async fn test_from_config() {
    let config = ResenderConfig::from_ron_str(
        r#"(
            content: (type: "Memory"),
            status: (type: "Memory"),
            sender: (max_concurrent_sends: 2, send_timeout_secs: 5),
        )"#,
    )
    .unwrap();

    let transport = MockTransport::new();
    let resender = Resender::from_config(config, Arc::new(transport.clone())).unwrap();

    resender
        .content_store()
        .save(
            &"B7".into(),
            &MailContent::new("M1".into(), b"Subject: hi\r\n\r\nbody".to_vec()),
        )
        .await
        .unwrap();
    resender
        .status_store()
        .save(&MailStatus::new("B7".into(), "M1".into(), MailState::Failed))
        .await
        .unwrap();

    let pairs = resender
        .resend_bulk(&failed_in("B7"), 0, 10)
        .await
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].1.wait_till_processed(WAIT).await);
    assert_eq!(transport.deliveries()[0].0.as_str(), "B7");
}
