use super::connection_monitor::ConnectionMonitor;
use super::operation_queue::{OperationQueue, RetrySelection};
use crate::application::ports::{AccessToken, ParkingRemoteApi, RemoteError, TokenProvider};
use crate::domain::entities::offline::{
    OperationPayload, QueuedOperation, SyncErrorKind, SyncResult,
};
use crate::infrastructure::offline::metrics::{self, PassOutcome};
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};

enum PassEnd {
    Completed(SyncResult),
    Halted(SyncResult, SyncErrorKind),
    NoCredentials,
}

/// Drains the queue against the remote, oldest first, one pass at a time.
pub struct SyncEngine {
    queue: Arc<OperationQueue>,
    remote: Arc<dyn ParkingRemoteApi>,
    monitor: Arc<ConnectionMonitor>,
    tokens: Arc<dyn TokenProvider>,
    request_timeout: Duration,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<OperationQueue>,
        remote: Arc<dyn ParkingRemoteApi>,
        monitor: Arc<ConnectionMonitor>,
        tokens: Arc<dyn TokenProvider>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            remote,
            monitor,
            tokens,
            request_timeout,
        }
    }

    /// One drain pass. Returns `{0, 0}` without touching the queue when another pass is
    /// running or no credential is available.
    pub async fn sync_pending_operations(
        &self,
        token_provider: &dyn TokenProvider,
    ) -> Result<SyncResult, AppError> {
        self.run_pass(token_provider, "manual").await
    }

    /// Pass using the engine's own token provider.
    pub async fn sync_now(&self, trigger: &str) -> Result<SyncResult, AppError> {
        self.run_pass(self.tokens.as_ref(), trigger).await
    }

    /// Operator-initiated: errored operations go back to pending, then a pass runs.
    pub async fn retry_sync(&self, selection: RetrySelection) -> Result<SyncResult, AppError> {
        self.queue.reset_errored(selection).await?;
        self.run_pass(self.tokens.as_ref(), "retry").await
    }

    async fn run_pass(
        &self,
        token_provider: &dyn TokenProvider,
        trigger: &str,
    ) -> Result<SyncResult, AppError> {
        if !self.monitor.try_begin_sync() {
            tracing::debug!(target: "offline::sync", trigger, "sync already in progress");
            metrics::record_pass(PassOutcome::Skipped, SyncResult::default(), trigger, 0);
            return Ok(SyncResult::default());
        }

        let started = Instant::now();
        let end = match self.drain(token_provider).await {
            Ok(end) => end,
            Err(err) => {
                self.monitor.abandon_sync();
                tracing::error!(target: "offline::sync", trigger, error = %err, "sync pass failed");
                return Err(err);
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (result, outcome) = match end {
            PassEnd::Completed(result) => {
                self.monitor.finish_sync(Some(result), None);
                (result, PassOutcome::Completed)
            }
            PassEnd::Halted(result, kind) => {
                self.monitor.finish_sync(Some(result), Some(kind));
                (result, PassOutcome::Halted(kind))
            }
            PassEnd::NoCredentials => {
                self.monitor.finish_sync(None, Some(SyncErrorKind::Auth));
                (SyncResult::default(), PassOutcome::Halted(SyncErrorKind::Auth))
            }
        };

        metrics::record_pass(outcome, result, trigger, elapsed_ms);
        tracing::info!(
            target: "offline::sync",
            trigger,
            synced = result.synced,
            failed = result.failed,
            outcome = ?outcome,
            elapsed_ms,
            "sync pass finished"
        );
        Ok(result)
    }

    async fn drain(&self, token_provider: &dyn TokenProvider) -> Result<PassEnd, AppError> {
        let token = match token_provider.get_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::warn!(target: "offline::sync", "no access token; sync aborted");
                return Ok(PassEnd::NoCredentials);
            }
            Err(err) => {
                tracing::warn!(target: "offline::sync", error = %err, "token lookup failed; sync aborted");
                return Ok(PassEnd::NoCredentials);
            }
        };

        let pending = self.queue.list_pending().await?;
        let mut result = SyncResult::default();

        for op in pending {
            match self.replay(&token, &op).await {
                Ok(()) => {
                    self.queue.mark_synced(op.id).await?;
                    self.monitor.record_request_success();
                    result.synced += 1;
                }
                Err(RemoteError::Validation(message)) | Err(RemoteError::Conflict(message)) => {
                    tracing::warn!(
                        target: "offline::sync",
                        operation_id = %op.id,
                        plate = %op.subject_key,
                        %message,
                        "operation rejected by remote"
                    );
                    self.queue.mark_errored(op.id, message).await?;
                    self.monitor.record_request_success();
                    result.failed += 1;
                }
                Err(RemoteError::Decode(message)) => {
                    // 2xx with an unreadable body: the remote accepted the key.
                    tracing::warn!(
                        target: "offline::sync",
                        operation_id = %op.id,
                        %message,
                        "accepted response could not be decoded"
                    );
                    self.queue.mark_synced(op.id).await?;
                    self.monitor.record_request_success();
                    result.synced += 1;
                }
                Err(RemoteError::Auth(message)) => {
                    tracing::warn!(target: "offline::sync", operation_id = %op.id, %message, "credentials rejected; pass halted");
                    return Ok(PassEnd::Halted(result, SyncErrorKind::Auth));
                }
                Err(err) => {
                    if matches!(err, RemoteError::Network(_)) {
                        self.monitor.record_network_failure();
                    }
                    tracing::warn!(target: "offline::sync", operation_id = %op.id, error = %err, "remote unreachable; pass halted");
                    return Ok(PassEnd::Halted(result, SyncErrorKind::Network));
                }
            }
        }

        Ok(PassEnd::Completed(result))
    }

    async fn replay(&self, token: &AccessToken, op: &QueuedOperation) -> Result<(), RemoteError> {
        let call = async {
            match &op.payload {
                OperationPayload::Entry(request) => self
                    .remote
                    .register_entry(token, request, &op.idempotency_key)
                    .await
                    .map(|_| ()),
                OperationPayload::Exit(request) => self
                    .remote
                    .register_exit(token, request, &op.idempotency_key)
                    .await
                    .map(|_| ()),
            }
        };

        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RemoteError::Network(format!(
                "no response within {} ms",
                self.request_timeout.as_millis()
            ))),
        }
    }
}
