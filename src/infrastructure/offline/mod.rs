pub mod mappers;
pub mod metrics;
pub mod rows;
pub mod sqlite_operation_store;
pub mod sqlite_snapshot_store;

pub use sqlite_operation_store::SqliteOperationStore;
pub use sqlite_snapshot_store::SqliteSnapshotStore;
