pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::{
    AccessToken, ConnectivityEvent, OperationStore, ParkingRemoteApi, ProfileApi, RemoteError,
    SnapshotStore, TokenProvider,
};
pub use application::services::{
    ConnectionMonitor, OperationQueue, ReferenceCache, RetrySelection, SessionCache,
    SessionService, SyncEngine, SyncWorker, VehicleService,
};
pub use domain::entities::{
    ConnectionState, OperationPayload, QueueCounts, QueuedOperation, SyncErrorKind,
    SyncIndicator, SyncResult,
};
pub use shared::{AppConfig, AppError, Result};
pub use state::{AppContext, AppDependencies};

const DEFAULT_LOG_FILTER: &str = "parkpos_lib=debug,parkpos_queue=debug,offline=debug,info";

/// Installs the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: Option<&str>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fallback = default_filter.unwrap_or(DEFAULT_LOG_FILTER).to_string();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
