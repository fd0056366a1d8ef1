use crate::application::ports::{RemoteError, SnapshotStore};
use crate::domain::entities::offline::{ReferenceSnapshot, StoredSnapshot};
use crate::domain::entities::session::{OfflineSessionSnapshot, UserProfile};
use crate::domain::value_objects::{ParkingLotId, SnapshotKind};
use crate::shared::clock::Clock;
use crate::shared::config::CacheConfig;
use crate::shared::error::AppError;
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Last known operator identity, usable for 24 hours after it was saved.
pub struct SessionCache {
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn SnapshotStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn save_offline_session(
        &self,
        profile: &UserProfile,
    ) -> Result<OfflineSessionSnapshot, AppError> {
        let snapshot = OfflineSessionSnapshot::from_profile(profile, self.clock.now());
        self.store.put_session(snapshot.clone()).await?;
        tracing::debug!(target: "offline::cache", user_id = %profile.user_id, "offline session saved");
        Ok(snapshot)
    }

    /// Reading never extends the lifetime; an expired snapshot is purged and `None` returned.
    pub async fn get_offline_session(&self) -> Result<Option<OfflineSessionSnapshot>, AppError> {
        let Some(snapshot) = self.store.get_session().await? else {
            return Ok(None);
        };
        if snapshot.is_expired_at(self.clock.now()) {
            self.store.delete_session().await?;
            tracing::info!(
                target: "offline::cache",
                user_id = %snapshot.user_id,
                expired_at = %snapshot.expires_at(),
                "offline session expired"
            );
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    pub async fn clear_offline_session(&self) -> Result<(), AppError> {
        self.store.delete_session().await
    }

    pub async fn has_valid_offline_session(&self) -> Result<bool, AppError> {
        Ok(self.get_offline_session().await?.is_some())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SnapshotMaxAges {
    pub tariffs: Duration,
    pub parking_spaces: Duration,
    pub vehicles: Duration,
    pub transactions: Duration,
}

impl SnapshotMaxAges {
    pub fn for_kind(&self, kind: SnapshotKind) -> Duration {
        match kind {
            SnapshotKind::Tariffs => self.tariffs,
            SnapshotKind::ParkingSpaces => self.parking_spaces,
            SnapshotKind::Vehicles => self.vehicles,
            SnapshotKind::Transactions => self.transactions,
        }
    }
}

impl From<&CacheConfig> for SnapshotMaxAges {
    fn from(config: &CacheConfig) -> Self {
        let secs = crate::shared::config::seconds;
        Self {
            tariffs: secs(config.tariff_max_age_secs),
            parking_spaces: secs(config.space_max_age_secs),
            vehicles: secs(config.vehicle_max_age_secs),
            transactions: secs(config.transaction_max_age_secs),
        }
    }
}

/// Per-lot reference data for degraded mode. Fresh reads honor the kind's max-age;
/// stale data is only handed out as a last resort.
pub struct ReferenceCache {
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    max_ages: SnapshotMaxAges,
}

impl ReferenceCache {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        max_ages: SnapshotMaxAges,
    ) -> Self {
        Self {
            store,
            clock,
            max_ages,
        }
    }

    pub async fn save<T: Serialize + Sync>(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
        data: &T,
    ) -> Result<(), AppError> {
        self.store
            .put_snapshot(StoredSnapshot {
                kind,
                parking_lot_id: parking_lot_id.clone(),
                data: serde_json::to_value(data)?,
                cached_at: self.clock.now(),
            })
            .await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
    ) -> Result<Option<ReferenceSnapshot<T>>, AppError> {
        Ok(self
            .get_last_resort(kind, parking_lot_id)
            .await?
            .filter(|snapshot| !snapshot.is_stale))
    }

    pub async fn get_last_resort<T: DeserializeOwned>(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
    ) -> Result<Option<ReferenceSnapshot<T>>, AppError> {
        let Some(stored) = self.store.get_snapshot(kind, parking_lot_id).await? else {
            return Ok(None);
        };
        let age = self.clock.now() - stored.cached_at;
        Ok(Some(ReferenceSnapshot {
            data: serde_json::from_value(stored.data)?,
            cached_at: stored.cached_at,
            is_stale: age > self.max_ages.for_kind(kind),
        }))
    }

    pub async fn invalidate(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
    ) -> Result<(), AppError> {
        self.store.delete_snapshot(kind, parking_lot_id).await
    }

    /// Live data wins and refreshes the cache; when the remote cannot be reached the
    /// cached copy is returned regardless of age.
    pub async fn fetch_with_fallback<T, F, Fut>(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
        live: F,
    ) -> Result<ReferenceSnapshot<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        match live().await {
            Ok(data) => {
                self.save(kind, parking_lot_id, &data).await?;
                Ok(ReferenceSnapshot {
                    data,
                    cached_at: self.clock.now(),
                    is_stale: false,
                })
            }
            Err(err) if err.is_transient() => {
                match self.get_last_resort(kind, parking_lot_id).await? {
                    Some(snapshot) => {
                        tracing::debug!(
                            target: "offline::cache",
                            %kind,
                            parking_lot_id = %parking_lot_id,
                            stale = snapshot.is_stale,
                            "serving cached reference data"
                        );
                        Ok(snapshot)
                    }
                    None => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{lot, memory_pool};
    use crate::domain::entities::parking::{Tariff, VehicleType};
    use crate::infrastructure::offline::SqliteSnapshotStore;
    use crate::shared::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    async fn setup() -> (SessionCache, ReferenceCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        ));
        let store: Arc<dyn SnapshotStore> = Arc::new(SqliteSnapshotStore::new(memory_pool().await));
        let ages = SnapshotMaxAges::from(&crate::shared::config::AppConfig::default().cache);
        (
            SessionCache::new(store.clone(), clock.clone()),
            ReferenceCache::new(store, clock.clone(), ages),
            clock,
        )
    }

    fn profile() -> UserProfile {
        UserProfile {
            user_id: "u-1".into(),
            email: "att@example.com".into(),
            role: "attendant".into(),
            status: "active".into(),
            parking_lot_ids: vec![lot()],
        }
    }

    fn tariffs() -> Vec<Tariff> {
        vec![Tariff {
            vehicle_type: VehicleType::Car,
            first_period_minutes: 60,
            first_period_rate: 1_000,
            hourly_rate: 500,
            grace_minutes: 10,
            daily_cap: Some(8_000),
        }]
    }

    #[tokio::test]
    async fn session_expires_after_a_day_and_is_purged() {
        let (sessions, _, clock) = setup().await;
        sessions.save_offline_session(&profile()).await.unwrap();

        clock.advance(Duration::hours(23) + Duration::minutes(59));
        assert!(sessions.has_valid_offline_session().await.unwrap());
        assert_eq!(
            sessions.get_offline_session().await.unwrap().unwrap().user_id,
            "u-1"
        );

        clock.advance(Duration::minutes(1));
        assert!(sessions.get_offline_session().await.unwrap().is_none());

        // Purged: rewinding the clock does not bring it back.
        clock.advance(Duration::hours(-2));
        assert!(!sessions.has_valid_offline_session().await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_session() {
        let (sessions, _, _) = setup().await;
        sessions.save_offline_session(&profile()).await.unwrap();
        sessions.clear_offline_session().await.unwrap();
        assert!(sessions.get_offline_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_snapshot_is_last_resort_only() {
        let (_, cache, clock) = setup().await;
        cache.save(SnapshotKind::Tariffs, &lot(), &tariffs()).await.unwrap();

        let fresh = cache
            .get::<Vec<Tariff>>(SnapshotKind::Tariffs, &lot())
            .await
            .unwrap()
            .unwrap();
        assert!(!fresh.is_stale);
        assert_eq!(fresh.data, tariffs());

        clock.advance(Duration::hours(7));
        assert!(cache
            .get::<Vec<Tariff>>(SnapshotKind::Tariffs, &lot())
            .await
            .unwrap()
            .is_none());
        let stale = cache
            .get_last_resort::<Vec<Tariff>>(SnapshotKind::Tariffs, &lot())
            .await
            .unwrap()
            .unwrap();
        assert!(stale.is_stale);
    }

    #[tokio::test]
    async fn fetch_with_fallback_prefers_live_then_cache() {
        let (_, cache, clock) = setup().await;

        let live = cache
            .fetch_with_fallback(SnapshotKind::Tariffs, &lot(), || async { Ok(tariffs()) })
            .await
            .unwrap();
        assert!(!live.is_stale);

        clock.advance(Duration::hours(12));
        let fallback = cache
            .fetch_with_fallback::<Vec<Tariff>, _, _>(SnapshotKind::Tariffs, &lot(), || async {
                Err(RemoteError::Network("offline".into()))
            })
            .await
            .unwrap();
        assert!(fallback.is_stale);
        assert_eq!(fallback.data, tariffs());

        let rejected = cache
            .fetch_with_fallback::<Vec<Tariff>, _, _>(SnapshotKind::Tariffs, &lot(), || async {
                Err(RemoteError::Auth("expired".into()))
            })
            .await;
        assert!(matches!(rejected, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn fetch_with_fallback_without_cache_surfaces_network_error() {
        let (_, cache, _) = setup().await;
        let result = cache
            .fetch_with_fallback::<Vec<Tariff>, _, _>(SnapshotKind::Vehicles, &lot(), || async {
                Err(RemoteError::Network("offline".into()))
            })
            .await;
        assert!(matches!(result, Err(AppError::Network(_))));
    }
}
