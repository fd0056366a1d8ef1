mod common;

use common::mocks::FakeRemote;
use common::offline_support::{entry, setup_context, setup_context_with_pool};
use parkpos_lib::domain::value_objects::OperationStatus;
use parkpos_lib::infrastructure::database::ConnectionPool;
use parkpos_lib::shared::clock::Clock;
use parkpos_lib::shared::config::DatabaseConfig;
use parkpos_lib::{AppError, ConnectivityEvent, OperationPayload, SyncResult};

fn file_config(dir: &tempfile::TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("nested").join("parkpos.db").display()
        ),
        max_connections: 2,
        connection_timeout: 5,
    }
}

#[tokio::test]
async fn queued_operations_survive_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = file_config(&dir);

    let key = {
        let pool = ConnectionPool::new(&config).await.expect("open db");
        let t = setup_context_with_pool(pool, FakeRemote::new(), Some("token"), false).await;
        assert!(t.ctx.monitor.is_offline());
        let receipt = t
            .ctx
            .vehicles
            .register_entry(entry("ABC123", t.clock.now()))
            .await
            .expect("queued");
        assert!(receipt.provisional);
        let key = t.ctx.queue.list_pending().await.unwrap()[0]
            .idempotency_key
            .clone();
        t.ctx.shutdown().await;
        key
    };

    let pool = ConnectionPool::new(&config).await.expect("reopen db");
    let t = setup_context_with_pool(pool, FakeRemote::new(), Some("token"), true).await;
    let pending = t.ctx.queue.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].idempotency_key, key);
    assert_eq!(pending[0].subject_key.as_str(), "ABC123");

    t.ctx.monitor.handle_platform_event(ConnectivityEvent::Online);
    assert_eq!(
        t.ctx.sync_engine.sync_now("test").await.unwrap(),
        SyncResult::new(1, 0)
    );
    assert_eq!(t.remote.calls()[0].key, key);
    assert_eq!(
        t.ctx.queue.count(Some(OperationStatus::Synced)).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn unavailable_storage_fails_loudly() {
    let t = setup_context(FakeRemote::new(), Some("token")).await;
    t.ctx.pool.close().await;

    let err = t
        .ctx
        .queue
        .enqueue(OperationPayload::Entry(entry("ABC123", t.clock.now())))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));

    t.ctx.monitor.handle_platform_event(ConnectivityEvent::Offline);
    let err = t
        .ctx
        .vehicles
        .register_entry(entry("ABC123", t.clock.now()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
}

#[tokio::test]
async fn storage_failure_mid_sync_releases_the_slot() {
    let t = setup_context(FakeRemote::new(), Some("token")).await;
    t.ctx.pool.close().await;

    let err = t.ctx.sync_engine.sync_now("test").await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
    assert!(!t.ctx.monitor.current().is_syncing);
}
