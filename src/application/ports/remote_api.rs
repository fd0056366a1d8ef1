use super::token_provider::AccessToken;
use crate::domain::entities::parking::{
    EntryReceipt, ExitReceipt, VehicleEntryRequest, VehicleExitRequest,
};
use crate::domain::entities::session::UserProfile;
use crate::domain::value_objects::IdempotencyKey;
use crate::shared::error::AppError;
use async_trait::async_trait;
use thiserror::Error;

/// Classified outcome of a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The remote rejected the payload itself.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The change contradicts authoritative state (duplicate active entry, occupied space).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No response: connection refused, DNS failure, timeout.
    #[error("Network failure: {0}")]
    Network(String),

    /// The remote answered but cannot serve requests right now (5xx, 429).
    #[error("Service unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Auth(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Failures local to one payload; the rest of the queue keeps going.
    pub fn is_rejection(&self) -> bool {
        matches!(self, RemoteError::Validation(_) | RemoteError::Conflict(_))
    }

    /// Failures that say nothing about the payload and will be retried later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Network(_) | RemoteError::Unavailable { .. }
        )
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Validation(msg) => AppError::Validation(msg),
            RemoteError::Conflict(msg) => AppError::Conflict(msg),
            RemoteError::Network(msg) => AppError::Network(msg),
            RemoteError::Unavailable { status, message } => {
                AppError::Network(format!("service unavailable ({status}): {message}"))
            }
            RemoteError::Auth(msg) => AppError::Auth(msg),
            RemoteError::Decode(msg) => AppError::Serialization(msg),
        }
    }
}

/// Entry/exit endpoints of the parking service. Every call carries the
/// idempotency key of the logical action it delivers.
#[async_trait]
pub trait ParkingRemoteApi: Send + Sync {
    async fn register_entry(
        &self,
        token: &AccessToken,
        request: &VehicleEntryRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<EntryReceipt, RemoteError>;

    async fn register_exit(
        &self,
        token: &AccessToken,
        request: &VehicleExitRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<ExitReceipt, RemoteError>;
}

#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn fetch_profile(&self, token: &AccessToken) -> Result<UserProfile, RemoteError>;
}
