use serde::{Deserialize, Serialize};
use std::fmt;

/// Vehicle plate, normalized to upper case without separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlateNumber(String);

impl PlateNumber {
    pub fn new(value: String) -> Result<Self, String> {
        let normalized: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .flat_map(|c| c.to_uppercase())
            .collect();
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err("Plate number cannot be empty".to_string());
        }
        if value.len() > 12 {
            return Err("Plate number cannot exceed 12 characters".to_string());
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("Plate number contains invalid characters: {value}"));
        }
        Ok(())
    }
}

impl fmt::Display for PlateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PlateNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlateNumber> for String {
    fn from(value: PlateNumber) -> Self {
        value.0
    }
}
