use super::rows::{OfflineOperationRow, OfflineSessionRow, SnapshotRow};
use crate::domain::entities::offline::{OperationPayload, QueuedOperation, StoredSnapshot};
use crate::domain::entities::session::OfflineSessionSnapshot;
use crate::domain::value_objects::{
    IdempotencyKey, OperationId, OperationKind, OperationStatus, ParkingLotId, PlateNumber,
    SnapshotKind,
};
use crate::shared::error::AppError;
use chrono::{DateTime, TimeZone, Utc};
use std::str::FromStr;

pub fn to_millis(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub fn from_millis(value: i64) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_millis_opt(value)
        .single()
        .ok_or_else(|| AppError::Storage(format!("Invalid stored timestamp: {value}")))
}

pub fn queued_operation_from_row(row: OfflineOperationRow) -> Result<QueuedOperation, AppError> {
    let id = OperationId::new(row.id).map_err(AppError::Storage)?;
    let kind = OperationKind::from_str(&row.kind).map_err(AppError::Storage)?;
    let status = OperationStatus::from_str(&row.status).map_err(AppError::Storage)?;
    let payload: OperationPayload = serde_json::from_str(&row.payload)?;
    if payload.kind() != kind {
        return Err(AppError::Storage(format!(
            "Operation {id} is stored as {kind} but carries a {} payload",
            payload.kind()
        )));
    }

    Ok(QueuedOperation {
        id,
        kind,
        entity_id: ParkingLotId::new(row.entity_id).map_err(AppError::Storage)?,
        subject_key: PlateNumber::new(row.subject_key).map_err(AppError::Storage)?,
        payload,
        idempotency_key: IdempotencyKey::new(row.idempotency_key).map_err(AppError::Storage)?,
        created_at: from_millis(row.created_at)?,
        updated_at: from_millis(row.updated_at)?,
        status,
        error_message: row.error_message,
        synced_at: row.synced_at.map(from_millis).transpose()?,
    })
}

pub fn stored_snapshot_from_row(
    kind: SnapshotKind,
    row: SnapshotRow,
) -> Result<StoredSnapshot, AppError> {
    Ok(StoredSnapshot {
        kind,
        parking_lot_id: ParkingLotId::new(row.parking_lot_id).map_err(AppError::Storage)?,
        data: serde_json::from_str(&row.data)?,
        cached_at: from_millis(row.cached_at)?,
    })
}

pub fn offline_session_from_row(row: OfflineSessionRow) -> Result<OfflineSessionSnapshot, AppError> {
    let parking_lot_ids: Vec<String> = serde_json::from_str(&row.parking_lot_ids)?;
    let parking_lot_ids = parking_lot_ids
        .into_iter()
        .map(ParkingLotId::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Storage)?;

    Ok(OfflineSessionSnapshot {
        user_id: row.user_id,
        email: row.email,
        role: row.role,
        status: row.status,
        parking_lot_ids,
        saved_at: from_millis(row.saved_at)?,
    })
}

pub fn parking_lot_ids_to_json(ids: &[ParkingLotId]) -> Result<String, AppError> {
    let raw: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    Ok(serde_json::to_string(&raw)?)
}

pub fn snapshot_table(kind: SnapshotKind) -> &'static str {
    match kind {
        SnapshotKind::Tariffs => "tariff_snapshots",
        SnapshotKind::ParkingSpaces => "parking_space_snapshots",
        SnapshotKind::Vehicles => "vehicle_snapshots",
        SnapshotKind::Transactions => "transaction_snapshots",
    }
}
