pub mod connection_monitor;
pub mod offline_cache;
pub mod operation_queue;
pub mod session_service;
pub mod sync_service;
pub mod sync_worker;
pub mod vehicle_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use connection_monitor::{ConnectionMonitor, MonitorGuard};
pub use offline_cache::{ReferenceCache, SessionCache, SnapshotMaxAges};
pub use operation_queue::{OperationQueue, RetrySelection};
pub use session_service::SessionService;
pub use sync_service::SyncEngine;
pub use sync_worker::{SyncWorker, WorkerHandle};
pub use vehicle_service::VehicleService;
