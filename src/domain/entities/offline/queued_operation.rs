use crate::domain::entities::parking::{VehicleEntryRequest, VehicleExitRequest};
use crate::domain::value_objects::{
    IdempotencyKey, OperationId, OperationKind, OperationStatus, ParkingLotId, PlateNumber,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Typed body replayed against the remote, one variant per operation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "request", rename_all = "snake_case")]
pub enum OperationPayload {
    Entry(VehicleEntryRequest),
    Exit(VehicleExitRequest),
}

impl OperationPayload {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationPayload::Entry(_) => OperationKind::Entry,
            OperationPayload::Exit(_) => OperationKind::Exit,
        }
    }

    pub fn parking_lot_id(&self) -> &ParkingLotId {
        match self {
            OperationPayload::Entry(request) => &request.parking_lot_id,
            OperationPayload::Exit(request) => &request.parking_lot_id,
        }
    }

    pub fn plate(&self) -> &PlateNumber {
        match self {
            OperationPayload::Entry(request) => &request.plate,
            OperationPayload::Exit(request) => &request.plate,
        }
    }
}

/// A not-yet-persisted operation; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedOperationDraft {
    pub payload: OperationPayload,
    pub idempotency_key: IdempotencyKey,
    pub created_at: DateTime<Utc>,
}

impl QueuedOperationDraft {
    pub fn new(
        payload: OperationPayload,
        idempotency_key: IdempotencyKey,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            payload,
            idempotency_key,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub id: OperationId,
    pub kind: OperationKind,
    pub entity_id: ParkingLotId,
    pub subject_key: PlateNumber,
    pub payload: OperationPayload,
    pub idempotency_key: IdempotencyKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: OperationStatus,
    pub error_message: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl QueuedOperation {
    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }
}
