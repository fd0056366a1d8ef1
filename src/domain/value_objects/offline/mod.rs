pub mod idempotency_key;
pub mod operation_id;
pub mod operation_kind;
pub mod operation_status;
pub mod parking_lot_id;
pub mod plate_number;
pub mod snapshot_kind;

pub use idempotency_key::IdempotencyKey;
pub use operation_id::OperationId;
pub use operation_kind::OperationKind;
pub use operation_status::OperationStatus;
pub use parking_lot_id::ParkingLotId;
pub use plate_number::PlateNumber;
pub use snapshot_kind::SnapshotKind;
