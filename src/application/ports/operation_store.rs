use crate::domain::entities::offline::{QueueCounts, QueuedOperation, QueuedOperationDraft};
use crate::domain::value_objects::{OperationId, OperationStatus};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable table of queued operations. Every read is ordered oldest first
/// (`created_at`, then `id`).
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Persists a new `Pending` row. Fails with `AppError::Storage` instead of
    /// dropping the record when the backing storage is unavailable.
    async fn add(&self, draft: QueuedOperationDraft) -> Result<OperationId, AppError>;

    /// Applies a lifecycle transition. Rows not currently in the status's
    /// required predecessor are left untouched and reported as
    /// `AppError::InvalidTransition`.
    async fn update_status(
        &self,
        id: OperationId,
        status: OperationStatus,
        error_message: Option<String>,
    ) -> Result<(), AppError>;

    async fn get(&self, id: OperationId) -> Result<Option<QueuedOperation>, AppError>;
    async fn query_by_status(
        &self,
        status: OperationStatus,
    ) -> Result<Vec<QueuedOperation>, AppError>;
    async fn query_all(&self) -> Result<Vec<QueuedOperation>, AppError>;
    async fn count(&self, status: Option<OperationStatus>) -> Result<u64, AppError>;
    async fn counts(&self) -> Result<QueueCounts, AppError>;

    /// Moves `Synced` rows last updated before `cutoff` into the archive table.
    async fn archive_synced_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}
