use crate::application::ports::{
    AccessToken, OperationStore, ParkingRemoteApi, RemoteError, TokenProvider,
};
use crate::domain::entities::offline::OperationPayload;
use crate::domain::entities::parking::{
    EntryReceipt, ExitReceipt, PaymentMethod, VehicleEntryRequest, VehicleExitRequest,
    VehicleType,
};
use crate::domain::value_objects::{IdempotencyKey, ParkingLotId, PlateNumber};
use crate::infrastructure::offline::SqliteOperationStore;
use crate::shared::clock::Clock;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub async fn memory_store(clock: Arc<dyn Clock>) -> Arc<dyn OperationStore> {
    Arc::new(SqliteOperationStore::new(memory_pool().await, clock))
}

pub fn lot() -> ParkingLotId {
    ParkingLotId::new("lot-1".to_string()).unwrap()
}

pub fn entry_request(plate: &str, at: DateTime<Utc>) -> VehicleEntryRequest {
    VehicleEntryRequest {
        parking_lot_id: lot(),
        plate: PlateNumber::new(plate.to_string()).unwrap(),
        vehicle_type: VehicleType::Car,
        space_id: None,
        entry_time: at,
        notes: None,
    }
}

pub fn exit_request(plate: &str, amount: i64, at: DateTime<Utc>) -> VehicleExitRequest {
    VehicleExitRequest {
        parking_lot_id: lot(),
        plate: PlateNumber::new(plate.to_string()).unwrap(),
        transaction_id: None,
        payment_method: PaymentMethod::Cash,
        payment_amount: amount,
        exit_time: at,
    }
}

pub fn entry_payload(plate: &str, at: DateTime<Utc>) -> OperationPayload {
    OperationPayload::Entry(entry_request(plate, at))
}

pub struct FixedTokens(pub Option<&'static str>);

#[async_trait]
impl TokenProvider for FixedTokens {
    async fn get_token(&self) -> Result<Option<AccessToken>, AppError> {
        Ok(self.0.map(|t| AccessToken::new(t.to_string()).unwrap()))
    }
}

/// Remote double: answers from a script (success once the script runs out) and
/// records every call.
#[derive(Default)]
pub struct ScriptedRemote {
    script: Mutex<VecDeque<Result<(), RemoteError>>>,
    calls: Mutex<Vec<(String, IdempotencyKey)>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedRemote {
    pub fn new(script: Vec<Result<(), RemoteError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Every call waits for `gate` to be notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, IdempotencyKey)> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, plate: &PlateNumber, key: &IdempotencyKey) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push((plate.to_string(), key.clone()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl ParkingRemoteApi for ScriptedRemote {
    async fn register_entry(
        &self,
        _token: &AccessToken,
        request: &VehicleEntryRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<EntryReceipt, RemoteError> {
        self.answer(&request.plate, idempotency_key).await?;
        Ok(EntryReceipt {
            transaction_id: format!("tx-{}", request.plate),
            parking_lot_id: request.parking_lot_id.clone(),
            plate: request.plate.clone(),
            space_id: request.space_id.clone(),
            entry_time: request.entry_time,
            provisional: false,
        })
    }

    async fn register_exit(
        &self,
        _token: &AccessToken,
        request: &VehicleExitRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<ExitReceipt, RemoteError> {
        self.answer(&request.plate, idempotency_key).await?;
        Ok(ExitReceipt {
            transaction_id: format!("tx-{}", request.plate),
            parking_lot_id: request.parking_lot_id.clone(),
            plate: request.plate.clone(),
            exit_time: request.exit_time,
            total_cost: request.payment_amount,
            payment_amount: request.payment_amount,
            provisional: false,
        })
    }
}
