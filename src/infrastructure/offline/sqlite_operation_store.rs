use super::mappers::{queued_operation_from_row, to_millis};
use super::rows::{OfflineOperationRow, StatusCountRow};
use crate::application::ports::OperationStore;
use crate::domain::entities::offline::{QueueCounts, QueuedOperation, QueuedOperationDraft};
use crate::domain::value_objects::{OperationId, OperationStatus};
use crate::shared::clock::Clock;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

const SELECT_COLUMNS: &str = "id, kind, entity_id, subject_key, payload, idempotency_key, \
     created_at, updated_at, status, error_message, synced_at";

pub struct SqliteOperationStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteOperationStore {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    fn map_rows(rows: Vec<OfflineOperationRow>) -> Result<Vec<QueuedOperation>, AppError> {
        rows.into_iter().map(queued_operation_from_row).collect()
    }
}

#[async_trait]
impl OperationStore for SqliteOperationStore {
    async fn add(&self, draft: QueuedOperationDraft) -> Result<OperationId, AppError> {
        let payload = serde_json::to_string(&draft.payload)?;
        let created_at = to_millis(draft.created_at);
        let now = to_millis(self.clock.now());

        let result = sqlx::query(
            r#"
            INSERT INTO offline_operations
                (kind, entity_id, subject_key, payload, idempotency_key,
                 created_at, updated_at, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(draft.payload.kind().as_str())
        .bind(draft.payload.parking_lot_id().as_str())
        .bind(draft.payload.plate().as_str())
        .bind(&payload)
        .bind(draft.idempotency_key.as_str())
        .bind(created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        OperationId::new(result.last_insert_rowid()).map_err(AppError::Storage)
    }

    async fn update_status(
        &self,
        id: OperationId,
        status: OperationStatus,
        error_message: Option<String>,
    ) -> Result<(), AppError> {
        let error_message = match status {
            OperationStatus::Errored => Some(
                error_message.unwrap_or_else(|| "Rejected by the remote service".to_string()),
            ),
            OperationStatus::Pending | OperationStatus::Synced => None,
        };
        let now = to_millis(self.clock.now());
        let synced_at = (status == OperationStatus::Synced).then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE offline_operations
            SET status = ?, error_message = ?, updated_at = ?, synced_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(status.as_str())
        .bind(&error_message)
        .bind(now)
        .bind(synced_at)
        .bind(id.value())
        .bind(status.required_predecessor().as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.get(id).await? {
            None => Err(AppError::NotFound(format!("Queued operation {id} not found"))),
            Some(current) => Err(AppError::InvalidTransition(format!(
                "Operation {id} cannot move from {} to {status}",
                current.status
            ))),
        }
    }

    async fn get(&self, id: OperationId) -> Result<Option<QueuedOperation>, AppError> {
        let row = sqlx::query_as::<_, OfflineOperationRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM offline_operations WHERE id = ?"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(queued_operation_from_row).transpose()
    }

    async fn query_by_status(
        &self,
        status: OperationStatus,
    ) -> Result<Vec<QueuedOperation>, AppError> {
        let rows = sqlx::query_as::<_, OfflineOperationRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM offline_operations \
             WHERE status = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Self::map_rows(rows)
    }

    async fn query_all(&self) -> Result<Vec<QueuedOperation>, AppError> {
        let rows = sqlx::query_as::<_, OfflineOperationRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM offline_operations ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Self::map_rows(rows)
    }

    async fn count(&self, status: Option<OperationStatus>) -> Result<u64, AppError> {
        let count: i64 = match status {
            Some(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM offline_operations WHERE status = ?")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM offline_operations")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count.max(0) as u64)
    }

    async fn counts(&self) -> Result<QueueCounts, AppError> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            "SELECT status, COUNT(*) AS count FROM offline_operations GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = QueueCounts::default();
        for row in rows {
            let value = row.count.max(0) as u64;
            match OperationStatus::from_str(&row.status).map_err(AppError::Storage)? {
                OperationStatus::Pending => counts.pending = value,
                OperationStatus::Synced => counts.synced = value,
                OperationStatus::Errored => counts.errored = value,
            }
        }
        Ok(counts)
    }

    async fn archive_synced_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let cutoff = to_millis(cutoff);
        let archived_at = to_millis(self.clock.now());
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO offline_operations_archive
                (id, kind, entity_id, subject_key, payload, idempotency_key,
                 created_at, synced_at, archived_at)
            SELECT id, kind, entity_id, subject_key, payload, idempotency_key,
                   created_at, synced_at, ?
            FROM offline_operations
            WHERE status = 'synced' AND COALESCE(synced_at, updated_at) < ?
            "#,
        )
        .bind(archived_at)
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM offline_operations
            WHERE status = 'synced' AND COALESCE(synced_at, updated_at) < ?
            "#,
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(deleted.rows_affected())
    }
}
