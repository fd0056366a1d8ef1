use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a queued operation.
///
/// `Pending -> Synced` and `Pending -> Errored` happen during a drain pass,
/// `Errored -> Pending` only through an explicit retry. `Synced` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Synced,
    Errored,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Synced => "synced",
            OperationStatus::Errored => "errored",
        }
    }

    /// The only status a row may hold right before moving to `self`.
    pub fn required_predecessor(&self) -> OperationStatus {
        match self {
            OperationStatus::Pending => OperationStatus::Errored,
            OperationStatus::Synced | OperationStatus::Errored => OperationStatus::Pending,
        }
    }

    pub fn can_transition_to(&self, next: OperationStatus) -> bool {
        next.required_predecessor() == *self
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Synced)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(OperationStatus::Pending),
            "synced" => Ok(OperationStatus::Synced),
            "errored" => Ok(OperationStatus::Errored),
            other => Err(format!("Unknown operation status: {other}")),
        }
    }
}
