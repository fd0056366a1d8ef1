use super::mappers::{
    offline_session_from_row, parking_lot_ids_to_json, snapshot_table, stored_snapshot_from_row,
    to_millis,
};
use super::rows::{OfflineSessionRow, SnapshotRow};
use crate::application::ports::SnapshotStore;
use crate::domain::entities::offline::StoredSnapshot;
use crate::domain::entities::session::OfflineSessionSnapshot;
use crate::domain::value_objects::{ParkingLotId, SnapshotKind};
use crate::shared::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn put_snapshot(&self, snapshot: StoredSnapshot) -> Result<(), AppError> {
        let data = serde_json::to_string(&snapshot.data)?;
        sqlx::query(&format!(
            r#"
            INSERT INTO {table} (parking_lot_id, data, cached_at)
            VALUES (?, ?, ?)
            ON CONFLICT(parking_lot_id) DO UPDATE SET
                data = excluded.data,
                cached_at = excluded.cached_at
            "#,
            table = snapshot_table(snapshot.kind)
        ))
        .bind(snapshot.parking_lot_id.as_str())
        .bind(&data)
        .bind(to_millis(snapshot.cached_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_snapshot(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
    ) -> Result<Option<StoredSnapshot>, AppError> {
        let row = sqlx::query_as::<_, SnapshotRow>(&format!(
            "SELECT parking_lot_id, data, cached_at FROM {} WHERE parking_lot_id = ?",
            snapshot_table(kind)
        ))
        .bind(parking_lot_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| stored_snapshot_from_row(kind, row)).transpose()
    }

    async fn delete_snapshot(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE parking_lot_id = ?",
            snapshot_table(kind)
        ))
        .bind(parking_lot_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn put_session(&self, session: OfflineSessionSnapshot) -> Result<(), AppError> {
        let parking_lot_ids = parking_lot_ids_to_json(&session.parking_lot_ids)?;
        sqlx::query(
            r#"
            INSERT INTO offline_sessions
                (slot, user_id, email, role, status, parking_lot_ids, saved_at)
            VALUES (1, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET
                user_id = excluded.user_id,
                email = excluded.email,
                role = excluded.role,
                status = excluded.status,
                parking_lot_ids = excluded.parking_lot_ids,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(&session.user_id)
        .bind(&session.email)
        .bind(&session.role)
        .bind(&session.status)
        .bind(&parking_lot_ids)
        .bind(to_millis(session.saved_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<OfflineSessionSnapshot>, AppError> {
        let row = sqlx::query_as::<_, OfflineSessionRow>(
            r#"
            SELECT user_id, email, role, status, parking_lot_ids, saved_at
            FROM offline_sessions WHERE slot = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(offline_session_from_row).transpose()
    }

    async fn delete_session(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM offline_sessions")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
