use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference data cached per parking lot for degraded-mode use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Tariffs,
    ParkingSpaces,
    Vehicles,
    Transactions,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 4] = [
        SnapshotKind::Tariffs,
        SnapshotKind::ParkingSpaces,
        SnapshotKind::Vehicles,
        SnapshotKind::Transactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Tariffs => "tariffs",
            SnapshotKind::ParkingSpaces => "parking_spaces",
            SnapshotKind::Vehicles => "vehicles",
            SnapshotKind::Transactions => "transactions",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
