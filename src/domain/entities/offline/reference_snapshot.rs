use crate::domain::value_objects::{ParkingLotId, SnapshotKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw snapshot row as kept by the snapshot store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub kind: SnapshotKind,
    pub parking_lot_id: ParkingLotId,
    pub data: Value,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnapshot<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
    /// Older than the configured max-age; usable only as a last resort.
    pub is_stale: bool,
}
