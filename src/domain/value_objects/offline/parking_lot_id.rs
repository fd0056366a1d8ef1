use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParkingLotId(String);

impl ParkingLotId {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Parking lot ID cannot be empty".to_string());
        }
        if value.contains('/') {
            return Err("Parking lot ID cannot contain '/'".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for ParkingLotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ParkingLotId> for String {
    fn from(value: ParkingLotId) -> Self {
        value.0
    }
}
