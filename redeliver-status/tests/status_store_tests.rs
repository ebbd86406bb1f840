#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use redeliver_common::{MailState, MailStatus};
use redeliver_status::{
    FileStatusStore, SortField, StatusFilter, StatusStore, StatusStoreConfig,
};

async fn seed(store: &Arc<dyn StatusStore>) {
    let rows = [
        ("B1", "M1", MailState::Failed),
        ("B1", "M2", MailState::Failed),
        ("B1", "M3", MailState::Sent),
        ("B2", "M1", MailState::Failed),
    ];
    for (batch, message, state) in rows {
        store
            .save(&MailStatus::new(batch.into(), message.into(), state))
            .await
            .unwrap();
    }
}

async fn backends() -> (tempfile::TempDir, Vec<Arc<dyn StatusStore>>) {
    let dir = tempfile::tempdir().unwrap();
    let file = FileStatusStore::open(dir.path().join("status.log")).unwrap();

    let stores = vec![
        StatusStoreConfig::Memory.into_status_store().unwrap(),
        StatusStoreConfig::File(file).into_status_store().unwrap(),
    ];
    for store in &stores {
        seed(store).await;
    }
    (dir, stores)
}

#[tokio::test]
async fn test_failed_messages_of_one_batch() {
    let (_dir, stores) = backends().await;
    let filter = StatusFilter::new()
        .with("batchId", "B1")
        .with("state", MailState::Failed);

    for store in stores {
        let page = store.query(&filter, 0, 10, None, false).await.unwrap();
        let ids: Vec<_> = page.iter().map(|s| s.message_id.to_string()).collect();
        assert_eq!(ids, vec!["M1", "M2"], "{store:?}");
        assert_eq!(store.count(&filter).await.unwrap(), 2);
    }
}

#[tokio::test]
async fn test_paging_walks_every_record_once() {
    let (_dir, stores) = backends().await;

    for store in stores {
        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = store
                .query(&StatusFilter::new(), offset, 3, Some(SortField::BatchId), false)
                .await
                .unwrap();
            if page.is_empty() {
                break;
            }
            offset += page.len();
            seen.extend(page);
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3].batch_id.as_str(), "B2");
    }
}

#[tokio::test]
async fn test_zero_count_returns_nothing() {
    let (_dir, stores) = backends().await;
    for store in stores {
        assert!(
            store
                .query(&StatusFilter::new(), 0, 0, None, false)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
