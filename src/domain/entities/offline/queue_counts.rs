use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: u64,
    pub synced: u64,
    pub errored: u64,
}

impl QueueCounts {
    pub fn outstanding(&self) -> u64 {
        self.pending + self.errored
    }
}
