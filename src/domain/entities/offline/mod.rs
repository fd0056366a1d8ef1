pub mod connection_state;
pub mod queue_counts;
pub mod queued_operation;
pub mod reference_snapshot;
pub mod sync_result;

pub use connection_state::{ConnectionState, SyncErrorKind, SyncIndicator};
pub use queue_counts::QueueCounts;
pub use queued_operation::{OperationPayload, QueuedOperation, QueuedOperationDraft};
pub use reference_snapshot::{ReferenceSnapshot, StoredSnapshot};
pub use sync_result::SyncResult;
