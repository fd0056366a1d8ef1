pub mod offline;
pub mod parking;
pub mod session;

pub use offline::{
    ConnectionState, OperationPayload, QueueCounts, QueuedOperation, QueuedOperationDraft,
    ReferenceSnapshot, StoredSnapshot, SyncErrorKind, SyncIndicator, SyncResult,
};
pub use parking::{
    ActiveVehicle, EntryReceipt, ExitReceipt, ParkingSpace, PaymentMethod, SpaceStatus, Tariff,
    TransactionRecord, VehicleEntryRequest, VehicleExitRequest, VehicleType,
};
pub use session::{OFFLINE_SESSION_TTL_HOURS, OfflineSessionSnapshot, UserProfile};
