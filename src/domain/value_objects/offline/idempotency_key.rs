use super::{OperationKind, ParkingLotId, PlateNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const MAX_KEY_LEN: usize = 200;
const NONCE_LEN: usize = 16;
const MAX_SEGMENT_LEN: usize = 32;

/// Request-level deduplication token for one logical action.
///
/// A key is minted once, when the attendant performs the action, and travels with
/// every attempt to deliver it (live call, queued replay, manual retry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    /// Mints a fresh key: `{kind}-{device}-{lot}-{plate}-{unix_ms}-{nonce}`.
    ///
    /// Device, lot, plate and nonce are reduced to at most 32 ASCII characters each,
    /// anything outside `[A-Za-z0-9_.-]` becoming `_`. The nonce carries uniqueness.
    pub fn generate(
        kind: OperationKind,
        device_id: &str,
        parking_lot_id: &ParkingLotId,
        plate: &PlateNumber,
        at: DateTime<Utc>,
    ) -> Self {
        let nonce = Uuid::new_v4().simple().to_string();
        Self::compose(kind, device_id, parking_lot_id, plate, at, &nonce[..NONCE_LEN])
    }

    pub fn compose(
        kind: OperationKind,
        device_id: &str,
        parking_lot_id: &ParkingLotId,
        plate: &PlateNumber,
        at: DateTime<Utc>,
        nonce: &str,
    ) -> Self {
        Self(format!(
            "{}-{}-{}-{}-{}-{}",
            kind.as_str(),
            segment(device_id),
            segment(parking_lot_id.as_str()),
            segment(plate.as_str()),
            at.timestamp_millis(),
            segment(nonce)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err("Idempotency key cannot be empty".to_string());
        }
        if value.len() > MAX_KEY_LEN {
            return Err(format!(
                "Idempotency key cannot exceed {MAX_KEY_LEN} characters"
            ));
        }
        // Travels as an HTTP header value.
        if !value.chars().all(|c| c.is_ascii_graphic()) {
            return Err("Idempotency key must be printable ASCII without spaces".to_string());
        }
        Ok(())
    }
}

fn segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .take(MAX_SEGMENT_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}
