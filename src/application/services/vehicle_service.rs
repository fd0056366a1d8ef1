use super::connection_monitor::ConnectionMonitor;
use super::offline_cache::ReferenceCache;
use super::operation_queue::OperationQueue;
use crate::application::ports::{AccessToken, ParkingRemoteApi, RemoteError, TokenProvider};
use crate::domain::entities::offline::OperationPayload;
use crate::domain::entities::parking::{
    EntryReceipt, ExitReceipt, Tariff, VehicleEntryRequest, VehicleExitRequest, VehicleType,
};
use crate::domain::value_objects::{IdempotencyKey, ParkingLotId, SnapshotKind};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const PROVISIONAL_PREFIX: &str = "offline-";

/// Entry/exit registration that keeps working without the remote.
///
/// Online, the remote is called directly; if it cannot be reached the action is queued
/// under the key already sent. Offline, the action is queued right away and a
/// provisional receipt is returned.
pub struct VehicleService {
    queue: Arc<OperationQueue>,
    remote: Arc<dyn ParkingRemoteApi>,
    tokens: Arc<dyn TokenProvider>,
    monitor: Arc<ConnectionMonitor>,
    references: Arc<ReferenceCache>,
    request_timeout: Duration,
}

enum LiveAttempt<T> {
    Done(T),
    Fallback,
}

impl VehicleService {
    pub fn new(
        queue: Arc<OperationQueue>,
        remote: Arc<dyn ParkingRemoteApi>,
        tokens: Arc<dyn TokenProvider>,
        monitor: Arc<ConnectionMonitor>,
        references: Arc<ReferenceCache>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            remote,
            tokens,
            monitor,
            references,
            request_timeout,
        }
    }

    pub async fn register_entry(
        &self,
        request: VehicleEntryRequest,
    ) -> Result<EntryReceipt, AppError> {
        let payload = OperationPayload::Entry(request.clone());
        let key = self.queue.new_key(&payload);

        let remote = self.remote.clone();
        let live_request = request.clone();
        let attempt = self
            .attempt_live(&key, |token, key| async move {
                remote.register_entry(&token, &live_request, &key).await
            })
            .await?;

        match attempt {
            LiveAttempt::Done(receipt) => Ok(receipt),
            LiveAttempt::Fallback => {
                self.queue.enqueue_with_key(payload, key).await?;
                Ok(provisional_entry(&request))
            }
        }
    }

    pub async fn register_exit(
        &self,
        request: VehicleExitRequest,
    ) -> Result<ExitReceipt, AppError> {
        let payload = OperationPayload::Exit(request.clone());
        let key = self.queue.new_key(&payload);

        let remote = self.remote.clone();
        let live_request = request.clone();
        let attempt = self
            .attempt_live(&key, |token, key| async move {
                remote.register_exit(&token, &live_request, &key).await
            })
            .await?;

        match attempt {
            LiveAttempt::Done(receipt) => Ok(receipt),
            LiveAttempt::Fallback => {
                self.queue.enqueue_with_key(payload, key).await?;
                Ok(provisional_exit(&request))
            }
        }
    }

    /// Local fee estimate from the cached tariffs, however old they are.
    pub async fn quote_exit(
        &self,
        parking_lot_id: &ParkingLotId,
        vehicle_type: VehicleType,
        entry_time: DateTime<Utc>,
        exit_time: DateTime<Utc>,
    ) -> Result<Option<i64>, AppError> {
        let tariffs = self
            .references
            .get_last_resort::<Vec<Tariff>>(SnapshotKind::Tariffs, parking_lot_id)
            .await?;
        Ok(tariffs.and_then(|snapshot| {
            snapshot
                .data
                .into_iter()
                .find(|tariff| tariff.vehicle_type == vehicle_type)
                .map(|tariff| tariff.provisional_fee(entry_time, exit_time))
        }))
    }

    async fn attempt_live<T, F, Fut>(
        &self,
        key: &IdempotencyKey,
        call: F,
    ) -> Result<LiveAttempt<T>, AppError>
    where
        F: FnOnce(AccessToken, IdempotencyKey) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        if self.monitor.is_offline() {
            return Ok(LiveAttempt::Fallback);
        }

        let token = match self.tokens.get_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::warn!(target: "offline::queue", "no access token; queueing action");
                return Ok(LiveAttempt::Fallback);
            }
            Err(err) => {
                tracing::warn!(target: "offline::queue", error = %err, "token lookup failed; queueing action");
                return Ok(LiveAttempt::Fallback);
            }
        };

        let live = tokio::time::timeout(self.request_timeout, call(token, key.clone()));
        let outcome = match live.await {
            Ok(outcome) => outcome,
            Err(_) => Err(RemoteError::Network("live request timed out".to_string())),
        };

        match outcome {
            Ok(value) => {
                self.monitor.record_request_success();
                Ok(LiveAttempt::Done(value))
            }
            Err(err) if err.is_transient() => {
                if matches!(err, RemoteError::Network(_)) {
                    self.monitor.record_network_failure();
                }
                tracing::warn!(
                    target: "offline::queue",
                    idempotency_key = %key,
                    error = %err,
                    "live request failed; queueing under the same key"
                );
                Ok(LiveAttempt::Fallback)
            }
            Err(err) => {
                if err.is_rejection() {
                    self.monitor.record_request_success();
                }
                Err(err.into())
            }
        }
    }
}

fn provisional_transaction_id() -> String {
    format!("{PROVISIONAL_PREFIX}{}", Uuid::new_v4())
}

/// Whether a transaction id was synthesized locally.
pub fn is_provisional_transaction(transaction_id: &str) -> bool {
    transaction_id.starts_with(PROVISIONAL_PREFIX)
}

fn provisional_entry(request: &VehicleEntryRequest) -> EntryReceipt {
    EntryReceipt {
        transaction_id: provisional_transaction_id(),
        parking_lot_id: request.parking_lot_id.clone(),
        plate: request.plate.clone(),
        space_id: request.space_id.clone(),
        entry_time: request.entry_time,
        provisional: true,
    }
}

// The attendant collected `payment_amount`; the remote settles the real fee on replay.
fn provisional_exit(request: &VehicleExitRequest) -> ExitReceipt {
    ExitReceipt {
        transaction_id: request
            .transaction_id
            .clone()
            .unwrap_or_else(provisional_transaction_id),
        parking_lot_id: request.parking_lot_id.clone(),
        plate: request.plate.clone(),
        exit_time: request.exit_time,
        total_cost: request.payment_amount,
        payment_amount: request.payment_amount,
        provisional: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ConnectivityEvent, SnapshotStore};
    use crate::application::services::offline_cache::SnapshotMaxAges;
    use crate::application::services::test_support::{
        entry_request, exit_request, lot, memory_pool, FixedTokens, ScriptedRemote,
    };
    use crate::domain::value_objects::OperationStatus;
    use crate::infrastructure::offline::{SqliteOperationStore, SqliteSnapshotStore};
    use crate::shared::clock::{Clock, ManualClock};
    use crate::shared::config::AppConfig;
    use chrono::TimeZone;

    struct Harness {
        service: VehicleService,
        queue: Arc<OperationQueue>,
        monitor: Arc<ConnectionMonitor>,
        remote: Arc<ScriptedRemote>,
        references: Arc<ReferenceCache>,
        clock: Arc<ManualClock>,
    }

    async fn harness(remote: ScriptedRemote) -> Harness {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        ));
        let pool = memory_pool().await;
        let queue = Arc::new(OperationQueue::new(
            Arc::new(SqliteOperationStore::new(pool.clone(), clock.clone())),
            clock.clone(),
            "pos-01".to_string(),
        ));
        let snapshots: Arc<dyn SnapshotStore> = Arc::new(SqliteSnapshotStore::new(pool));
        let references = Arc::new(ReferenceCache::new(
            snapshots,
            clock.clone(),
            SnapshotMaxAges::from(&AppConfig::default().cache),
        ));
        let monitor = Arc::new(ConnectionMonitor::new(true));
        let remote = Arc::new(remote);
        let service = VehicleService::new(
            queue.clone(),
            remote.clone(),
            Arc::new(FixedTokens(Some("token"))),
            monitor.clone(),
            references.clone(),
            Duration::from_secs(5),
        );
        Harness {
            service,
            queue,
            monitor,
            remote,
            references,
            clock,
        }
    }

    #[tokio::test]
    async fn online_entry_goes_straight_to_remote() {
        let h = harness(ScriptedRemote::default()).await;
        let receipt = h
            .service
            .register_entry(entry_request("ABC123", h.clock.now()))
            .await
            .unwrap();
        assert!(!receipt.provisional);
        assert_eq!(receipt.transaction_id, "tx-ABC123");
        assert_eq!(h.queue.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn network_failure_queues_under_the_attempted_key() {
        let h = harness(ScriptedRemote::new(vec![Err(RemoteError::Network(
            "connection refused".into(),
        ))]))
        .await;
        let receipt = h
            .service
            .register_entry(entry_request("ABC123", h.clock.now()))
            .await
            .unwrap();
        assert!(receipt.provisional);
        assert!(is_provisional_transaction(&receipt.transaction_id));

        let queued = h.queue.list_pending().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].idempotency_key, h.remote.calls()[0].1);
    }

    #[tokio::test]
    async fn rejection_is_surfaced_and_not_queued() {
        let h = harness(ScriptedRemote::new(vec![Err(RemoteError::Conflict(
            "Vehicle already inside".into(),
        ))]))
        .await;
        let err = h
            .service
            .register_entry(entry_request("ABC123", h.clock.now()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Vehicle already inside"));
        assert_eq!(h.queue.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn offline_exit_echoes_payment_amount() {
        let h = harness(ScriptedRemote::default()).await;
        h.monitor.handle_platform_event(ConnectivityEvent::Offline);

        let receipt = h
            .service
            .register_exit(exit_request("ABC123", 1_000, h.clock.now()))
            .await
            .unwrap();
        assert!(receipt.provisional);
        assert_eq!(receipt.total_cost, 1_000);
        assert!(h.remote.calls().is_empty());
        assert_eq!(
            h.queue.count(Some(OperationStatus::Pending)).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn quote_uses_cached_tariff_for_vehicle_type() {
        let h = harness(ScriptedRemote::default()).await;
        let now = h.clock.now();
        assert_eq!(
            h.service
                .quote_exit(&lot(), VehicleType::Car, now, now)
                .await
                .unwrap(),
            None
        );

        let tariffs = vec![Tariff {
            vehicle_type: VehicleType::Car,
            first_period_minutes: 60,
            first_period_rate: 1_000,
            hourly_rate: 500,
            grace_minutes: 0,
            daily_cap: None,
        }];
        h.references
            .save(SnapshotKind::Tariffs, &lot(), &tariffs)
            .await
            .unwrap();
        h.clock.advance(chrono::Duration::days(2));

        let fee = h
            .service
            .quote_exit(
                &lot(),
                VehicleType::Car,
                now,
                now + chrono::Duration::minutes(150),
            )
            .await
            .unwrap();
        assert_eq!(fee, Some(2_000));
        assert_eq!(
            h.service
                .quote_exit(&lot(), VehicleType::Truck, now, now)
                .await
                .unwrap(),
            None
        );
    }
}
