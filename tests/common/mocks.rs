use async_trait::async_trait;
use parkpos_lib::domain::entities::parking::{
    EntryReceipt, ExitReceipt, VehicleEntryRequest, VehicleExitRequest,
};
use parkpos_lib::domain::entities::session::UserProfile;
use parkpos_lib::domain::value_objects::{IdempotencyKey, ParkingLotId};
use parkpos_lib::{AccessToken, AppError, ParkingRemoteApi, ProfileApi, RemoteError, TokenProvider};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;

pub struct FixedTokens(pub Option<&'static str>);

#[async_trait]
impl TokenProvider for FixedTokens {
    async fn get_token(&self) -> Result<Option<AccessToken>, AppError> {
        Ok(self
            .0
            .map(|t| AccessToken::new(t.to_string()).expect("token")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: &'static str,
    pub plate: String,
    pub key: IdempotencyKey,
}

/// In-memory remote: scripted failures first, success afterwards. Keys it has already
/// accepted are acknowledged again without a second effect, like the real service.
#[derive(Default)]
pub struct FakeRemote {
    script: Mutex<VecDeque<Result<(), RemoteError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    accepted: Mutex<HashSet<String>>,
    gate: Mutex<Option<std::sync::Arc<Notify>>>,
    pub entered: Notify,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(script: Vec<Result<(), RemoteError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn push(&self, outcome: Result<(), RemoteError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Calls block until the returned handle is notified.
    pub fn hold(&self) -> std::sync::Arc<Notify> {
        let gate = std::sync::Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.lock().unwrap().len()
    }

    async fn answer(
        &self,
        kind: &'static str,
        plate: String,
        key: &IdempotencyKey,
    ) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            plate,
            key: key.clone(),
        });
        self.entered.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let outcome = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if outcome.is_ok() {
            self.accepted
                .lock()
                .unwrap()
                .insert(key.as_str().to_string());
        }
        outcome
    }
}

#[async_trait]
impl ParkingRemoteApi for FakeRemote {
    async fn register_entry(
        &self,
        _token: &AccessToken,
        request: &VehicleEntryRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<EntryReceipt, RemoteError> {
        self.answer("entry", request.plate.to_string(), idempotency_key)
            .await?;
        Ok(EntryReceipt {
            transaction_id: format!("tx-{}", idempotency_key.as_str().len()),
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
        self.answer("exit", request.plate.to_string(), idempotency_key)
            .await?;
        Ok(ExitReceipt {
            transaction_id: request
                .transaction_id
                .clone()
                .unwrap_or_else(|| "tx-exit".to_string()),
            parking_lot_id: request.parking_lot_id.clone(),
            plate: request.plate.clone(),
            exit_time: request.exit_time,
            total_cost: request.payment_amount,
            payment_amount: request.payment_amount,
            provisional: false,
        })
    }
}

pub struct FakeProfiles;

#[async_trait]
impl ProfileApi for FakeProfiles {
    async fn fetch_profile(&self, _token: &AccessToken) -> Result<UserProfile, RemoteError> {
        Ok(UserProfile {
            user_id: "attendant-1".to_string(),
            email: "attendant@example.com".to_string(),
            role: "attendant".to_string(),
            status: "active".to_string(),
            parking_lot_ids: vec![ParkingLotId::new("lot-1".to_string()).expect("lot")],
        })
    }
}
