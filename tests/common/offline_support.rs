use super::mocks::{FakeProfiles, FakeRemote, FixedTokens};
use chrono::{DateTime, TimeZone, Utc};
use parkpos_lib::domain::entities::parking::{
    PaymentMethod, VehicleEntryRequest, VehicleExitRequest, VehicleType,
};
use parkpos_lib::domain::value_objects::{ParkingLotId, PlateNumber};
use parkpos_lib::infrastructure::database::ConnectionPool;
use parkpos_lib::shared::clock::ManualClock;
use parkpos_lib::{AppConfig, AppContext, AppDependencies};
use std::sync::Arc;

pub struct OfflineTestContext {
    pub ctx: AppContext,
    pub remote: Arc<FakeRemote>,
    pub clock: Arc<ManualClock>,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.remote.request_timeout_ms = 2_000;
    config.sync.pending_refresh_secs = 1;
    config
}

pub async fn setup_context(remote: FakeRemote, token: Option<&'static str>) -> OfflineTestContext {
    let pool = ConnectionPool::from_memory().await.expect("in-memory sqlite");
    setup_context_with_pool(pool, remote, token, true).await
}

pub async fn setup_context_with_pool(
    pool: ConnectionPool,
    remote: FakeRemote,
    token: Option<&'static str>,
    platform_online: bool,
) -> OfflineTestContext {
    let clock = Arc::new(ManualClock::new(start_time()));
    let remote = Arc::new(remote);
    let ctx = AppContext::with_dependencies(
        test_config(),
        pool,
        AppDependencies {
            remote: remote.clone(),
            profiles: Arc::new(FakeProfiles),
            tokens: Arc::new(FixedTokens(token)),
            clock: clock.clone(),
        },
        platform_online,
    )
    .await
    .expect("app context");

    OfflineTestContext { ctx, remote, clock }
}

pub fn lot() -> ParkingLotId {
    ParkingLotId::new("lot-1".to_string()).expect("lot")
}

pub fn entry(plate: &str, at: DateTime<Utc>) -> VehicleEntryRequest {
    VehicleEntryRequest {
        parking_lot_id: lot(),
        plate: PlateNumber::new(plate.to_string()).expect("plate"),
        vehicle_type: VehicleType::Car,
        space_id: Some("A-3".to_string()),
        entry_time: at,
        notes: None,
    }
}

pub fn exit(plate: &str, amount: i64, at: DateTime<Utc>) -> VehicleExitRequest {
    VehicleExitRequest {
        parking_lot_id: lot(),
        plate: PlateNumber::new(plate.to_string()).expect("plate"),
        transaction_id: None,
        payment_method: PaymentMethod::Cash,
        payment_amount: amount,
        exit_time: at,
    }
}
