use serde::{Deserialize, Serialize};

/// Aggregate outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub synced: u32,
    pub failed: u32,
}

impl SyncResult {
    pub fn new(synced: u32, failed: u32) -> Self {
        Self { synced, failed }
    }
}
