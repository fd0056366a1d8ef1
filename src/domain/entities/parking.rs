use crate::domain::value_objects::{ParkingLotId, PlateNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Truck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEntryRequest {
    pub parking_lot_id: ParkingLotId,
    pub plate: PlateNumber,
    pub vehicle_type: VehicleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    pub entry_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleExitRequest {
    pub parking_lot_id: ParkingLotId,
    pub plate: PlateNumber,
    /// May be a provisional id when the entry itself was recorded offline;
    /// the remote resolves the active session by plate in that case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_amount: i64,
    pub exit_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryReceipt {
    pub transaction_id: String,
    pub parking_lot_id: ParkingLotId,
    pub plate: PlateNumber,
    #[serde(default)]
    pub space_id: Option<String>,
    pub entry_time: DateTime<Utc>,
    #[serde(default)]
    pub provisional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitReceipt {
    pub transaction_id: String,
    pub parking_lot_id: ParkingLotId,
    pub plate: PlateNumber,
    pub exit_time: DateTime<Utc>,
    pub total_cost: i64,
    pub payment_amount: i64,
    #[serde(default)]
    pub provisional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub vehicle_type: VehicleType,
    pub first_period_minutes: i64,
    pub first_period_rate: i64,
    pub hourly_rate: i64,
    #[serde(default)]
    pub grace_minutes: i64,
    #[serde(default)]
    pub daily_cap: Option<i64>,
}

impl Tariff {
    /// Local fee estimate used while the remote cannot price the stay.
    ///
    /// Stays within the grace window are free, the first period is charged flat,
    /// every started hour after it is charged at `hourly_rate`, and each started
    /// day is capped at `daily_cap` when one is set.
    pub fn provisional_fee(&self, entry_time: DateTime<Utc>, exit_time: DateTime<Utc>) -> i64 {
        let minutes = (exit_time - entry_time).num_minutes().max(0);
        if minutes <= self.grace_minutes {
            return 0;
        }

        let Some(cap) = self.daily_cap else {
            return self.fee_for_minutes(minutes);
        };

        let full_days = minutes / MINUTES_PER_DAY;
        let remainder = minutes % MINUTES_PER_DAY;
        let remainder_fee = if remainder == 0 {
            0
        } else if full_days == 0 {
            self.fee_for_minutes(remainder).min(cap)
        } else {
            ceil_div(remainder, 60).saturating_mul(self.hourly_rate).min(cap)
        };

        full_days.saturating_mul(cap).saturating_add(remainder_fee)
    }

    fn fee_for_minutes(&self, minutes: i64) -> i64 {
        if minutes <= self.first_period_minutes {
            return self.first_period_rate;
        }
        let extra_hours = ceil_div(minutes - self.first_period_minutes, 60);
        self.first_period_rate
            .saturating_add(extra_hours.saturating_mul(self.hourly_rate))
    }
}

const MINUTES_PER_DAY: i64 = 24 * 60;

fn ceil_div(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceStatus {
    Available,
    Occupied,
    Reserved,
    OutOfService,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpace {
    pub id: String,
    pub label: String,
    pub status: SpaceStatus,
    #[serde(default)]
    pub vehicle_type: Option<VehicleType>,
}

/// A vehicle currently parked, as last seen from the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveVehicle {
    pub plate: PlateNumber,
    pub transaction_id: String,
    pub vehicle_type: VehicleType,
    pub entry_time: DateTime<Utc>,
    #[serde(default)]
    pub space_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub plate: PlateNumber,
    pub entry_time: DateTime<Utc>,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_cost: Option<i64>,
}
