pub mod offline;

pub use offline::{
    IdempotencyKey, OperationId, OperationKind, OperationStatus, ParkingLotId, PlateNumber,
    SnapshotKind,
};
