use crate::application::ports::OperationStore;
use crate::domain::entities::offline::{
    OperationPayload, QueueCounts, QueuedOperation, QueuedOperationDraft,
};
use crate::domain::value_objects::{IdempotencyKey, OperationId, OperationStatus};
use crate::shared::clock::Clock;
use crate::shared::error::AppError;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Which errored operations an operator asked to send again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrySelection {
    AllErrored,
    Only(Vec<OperationId>),
}

/// Queue invariants on top of the durable store: typed payloads in, keys minted once,
/// oldest-first reads.
pub struct OperationQueue {
    store: Arc<dyn OperationStore>,
    clock: Arc<dyn Clock>,
    device_id: String,
}

impl OperationQueue {
    pub fn new(store: Arc<dyn OperationStore>, clock: Arc<dyn Clock>, device_id: String) -> Self {
        Self {
            store,
            clock,
            device_id,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Mints a key for a new logical action.
    pub fn new_key(&self, payload: &OperationPayload) -> IdempotencyKey {
        IdempotencyKey::generate(
            payload.kind(),
            &self.device_id,
            payload.parking_lot_id(),
            payload.plate(),
            self.clock.now(),
        )
    }

    pub async fn enqueue(&self, payload: OperationPayload) -> Result<OperationId, AppError> {
        let key = self.new_key(&payload);
        self.enqueue_with_key(payload, key).await
    }

    /// Persists an action whose key was already used for a live attempt.
    pub async fn enqueue_with_key(
        &self,
        payload: OperationPayload,
        idempotency_key: IdempotencyKey,
    ) -> Result<OperationId, AppError> {
        let kind = payload.kind();
        let plate = payload.plate().to_string();
        let lot = payload.parking_lot_id().to_string();
        let draft = QueuedOperationDraft::new(payload, idempotency_key, self.clock.now());

        let id = self.store.add(draft).await.map_err(|err| {
            tracing::error!(
                target: "offline::queue",
                kind = %kind,
                parking_lot_id = %lot,
                plate = %plate,
                error = %err,
                "failed to persist queued operation"
            );
            err
        })?;

        tracing::info!(
            target: "offline::queue",
            operation_id = %id,
            kind = %kind,
            parking_lot_id = %lot,
            plate = %plate,
            "operation queued"
        );
        Ok(id)
    }

    pub async fn get(&self, id: OperationId) -> Result<Option<QueuedOperation>, AppError> {
        self.store.get(id).await
    }

    pub async fn list_pending(&self) -> Result<Vec<QueuedOperation>, AppError> {
        self.store.query_by_status(OperationStatus::Pending).await
    }

    /// Everything not yet delivered, for the operator's review screen.
    pub async fn list_pending_and_errors(&self) -> Result<Vec<QueuedOperation>, AppError> {
        let all = self.store.query_all().await?;
        Ok(all
            .into_iter()
            .filter(|op| op.status != OperationStatus::Synced)
            .collect())
    }

    pub async fn list_all(&self) -> Result<Vec<QueuedOperation>, AppError> {
        self.store.query_all().await
    }

    pub async fn count(&self, status: Option<OperationStatus>) -> Result<u64, AppError> {
        self.store.count(status).await
    }

    pub async fn counts(&self) -> Result<QueueCounts, AppError> {
        self.store.counts().await
    }

    pub async fn mark_synced(&self, id: OperationId) -> Result<(), AppError> {
        self.store
            .update_status(id, OperationStatus::Synced, None)
            .await
    }

    pub async fn mark_errored(&self, id: OperationId, message: String) -> Result<(), AppError> {
        self.store
            .update_status(id, OperationStatus::Errored, Some(message))
            .await
    }

    /// Puts errored operations back in line. Key and `created_at` are kept, so they
    /// replay in their original position and the remote can still deduplicate them.
    pub async fn reset_errored(&self, selection: RetrySelection) -> Result<u64, AppError> {
        let ids = match selection {
            RetrySelection::AllErrored => self
                .store
                .query_by_status(OperationStatus::Errored)
                .await?
                .into_iter()
                .map(|op| op.id)
                .collect(),
            RetrySelection::Only(ids) => ids,
        };

        let mut reset = 0;
        for id in ids {
            match self
                .store
                .update_status(id, OperationStatus::Pending, None)
                .await
            {
                Ok(()) => reset += 1,
                Err(AppError::InvalidTransition(msg)) | Err(AppError::NotFound(msg)) => {
                    tracing::warn!(target: "offline::queue", operation_id = %id, "skipping retry: {msg}");
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(target: "offline::queue", reset, "errored operations reset to pending");
        Ok(reset)
    }

    /// Archives synced operations older than `retention`.
    pub async fn prune_synced(&self, retention: Duration) -> Result<u64, AppError> {
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let archived = self.store.archive_synced_before(cutoff).await?;
        if archived > 0 {
            tracing::info!(target: "offline::queue", archived, %cutoff, "archived synced operations");
        }
        Ok(archived)
    }
}
