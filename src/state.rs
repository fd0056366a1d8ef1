use crate::application::ports::{
    ConnectivityEvent, OperationStore, ParkingRemoteApi, ProfileApi, SnapshotStore, TokenProvider,
};
use crate::application::services::{
    ConnectionMonitor, MonitorGuard, OperationQueue, ReferenceCache, SessionCache,
    SessionService, SnapshotMaxAges, SyncEngine, SyncWorker, VehicleService, WorkerHandle,
};
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::offline::{SqliteOperationStore, SqliteSnapshotStore};
use crate::infrastructure::remote::HttpParkingApi;
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// External collaborators the context is wired against.
pub struct AppDependencies {
    pub remote: Arc<dyn ParkingRemoteApi>,
    pub profiles: Arc<dyn ProfileApi>,
    pub tokens: Arc<dyn TokenProvider>,
    pub clock: Arc<dyn Clock>,
}

struct Running {
    monitor_guard: MonitorGuard,
    worker_handle: Option<WorkerHandle>,
}

/// Every offline component, constructed once per process.
pub struct AppContext {
    pub config: AppConfig,
    pub pool: ConnectionPool,
    pub monitor: Arc<ConnectionMonitor>,
    pub queue: Arc<OperationQueue>,
    pub sync_engine: Arc<SyncEngine>,
    pub sync_worker: Arc<SyncWorker>,
    pub sessions: Arc<SessionCache>,
    pub references: Arc<ReferenceCache>,
    pub session_service: Arc<SessionService>,
    pub vehicles: Arc<VehicleService>,
    running: Mutex<Option<Running>>,
}

impl AppContext {
    /// Opens the configured database and talks to the configured HTTP service.
    pub async fn new(
        config: AppConfig,
        tokens: Arc<dyn TokenProvider>,
        platform_online: bool,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::Configuration)?;
        let http = Arc::new(HttpParkingApi::new(&config.remote)?);
        let pool = ConnectionPool::new(&config.database).await?;
        Self::with_dependencies(
            config,
            pool,
            AppDependencies {
                remote: http.clone(),
                profiles: http,
                tokens,
                clock: Arc::new(SystemClock),
            },
            platform_online,
        )
        .await
    }

    pub async fn with_dependencies(
        config: AppConfig,
        pool: ConnectionPool,
        deps: AppDependencies,
        platform_online: bool,
    ) -> Result<Self, AppError> {
        pool.migrate().await?;

        let request_timeout = Duration::from_millis(config.remote.request_timeout_ms);
        let operations: Arc<dyn OperationStore> = Arc::new(SqliteOperationStore::new(
            pool.get_pool().clone(),
            deps.clock.clone(),
        ));
        let snapshots: Arc<dyn SnapshotStore> =
            Arc::new(SqliteSnapshotStore::new(pool.get_pool().clone()));

        let monitor = Arc::new(ConnectionMonitor::new(platform_online));
        let queue = Arc::new(OperationQueue::new(
            operations,
            deps.clock.clone(),
            config.device.device_id.clone(),
        ));
        let sync_engine = Arc::new(SyncEngine::new(
            queue.clone(),
            deps.remote.clone(),
            monitor.clone(),
            deps.tokens.clone(),
            request_timeout,
        ));
        let sync_worker = Arc::new(SyncWorker::new(
            sync_engine.clone(),
            queue.clone(),
            monitor.clone(),
            Duration::from_secs(config.sync.pending_refresh_secs),
            config.sync.auto_sync,
        ));
        let sessions = Arc::new(SessionCache::new(snapshots.clone(), deps.clock.clone()));
        let references = Arc::new(ReferenceCache::new(
            snapshots,
            deps.clock.clone(),
            SnapshotMaxAges::from(&config.cache),
        ));
        let session_service = Arc::new(SessionService::new(
            deps.profiles,
            deps.tokens.clone(),
            sessions.clone(),
            monitor.clone(),
            deps.clock.clone(),
            config.cache.profile_refetch_interval(),
        ));
        let vehicles = Arc::new(VehicleService::new(
            queue.clone(),
            deps.remote,
            deps.tokens,
            monitor.clone(),
            references.clone(),
            request_timeout,
        ));

        Ok(Self {
            config,
            pool,
            monitor,
            queue,
            sync_engine,
            sync_worker,
            sessions,
            references,
            session_service,
            vehicles,
            running: Mutex::new(None),
        })
    }

    /// Starts connectivity observation and the background sync worker.
    pub async fn start(&self, events: mpsc::Receiver<ConnectivityEvent>) -> Result<(), AppError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(AppError::Internal("App context already started".to_string()));
        }

        let monitor_guard = self.monitor.initialize(events)?;
        let worker_handle = self.sync_worker.start();

        let retention = self.config.sync.synced_retention();
        if let Err(err) = self.queue.prune_synced(retention).await {
            tracing::warn!(target: "offline::queue", error = %err, "startup pruning failed");
        }

        *running = Some(Running {
            monitor_guard,
            worker_handle,
        });
        tracing::info!(
            device_id = %self.config.device.device_id,
            is_offline = self.monitor.is_offline(),
            "offline core started"
        );
        Ok(())
    }

    pub async fn shutdown(&self) {
        if let Some(running) = self.running.lock().await.take() {
            if let Some(worker) = running.worker_handle {
                worker.shutdown();
            }
            running.monitor_guard.teardown();
        }
        self.pool.close().await;
        tracing::info!("offline core stopped");
    }
}
