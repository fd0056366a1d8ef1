pub mod entities;
pub mod value_objects;

pub use entities::{OperationPayload, QueuedOperation, SyncResult};
pub use value_objects::{IdempotencyKey, OperationId, OperationKind, OperationStatus};
