use crate::domain::value_objects::ParkingLotId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Offline sessions are usable for this long after they were saved.
pub const OFFLINE_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub status: String,
    #[serde(default)]
    pub parking_lot_ids: Vec<ParkingLotId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineSessionSnapshot {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub parking_lot_ids: Vec<ParkingLotId>,
    pub saved_at: DateTime<Utc>,
}

impl OfflineSessionSnapshot {
    pub fn from_profile(profile: &UserProfile, saved_at: DateTime<Utc>) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            email: profile.email.clone(),
            role: profile.role.clone(),
            status: profile.status.clone(),
            parking_lot_ids: profile.parking_lot_ids.clone(),
            saved_at,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.saved_at + Duration::hours(OFFLINE_SESSION_TTL_HOURS)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            status: self.status.clone(),
            parking_lot_ids: self.parking_lot_ids.clone(),
        }
    }
}
