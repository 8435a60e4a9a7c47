//! Dining Table Model

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Occupancy status of a dining table
///
/// All three statuses are reachable from each other; transitions are
/// staff-triggered and the engine only enforces enum membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Free,
    Occupied,
    Billed,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Occupied => write!(f, "occupied"),
            Self::Billed => write!(f, "billed"),
        }
    }
}

impl FromStr for TableStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "occupied" => Ok(Self::Occupied),
            "billed" => Ok(Self::Billed),
            other => Err(AppError::invalid_status(other)),
        }
    }
}

/// Dining table entity
///
/// Created at provisioning time and never deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    /// Unique, positive table number shown to guests
    pub number: u32,
    pub status: TableStatus,
    /// Incremented on every successful update (compare-and-swap guard)
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("free".parse::<TableStatus>().unwrap(), TableStatus::Free);
        assert_eq!(
            "occupied".parse::<TableStatus>().unwrap(),
            TableStatus::Occupied
        );
        assert_eq!("billed".parse::<TableStatus>().unwrap(), TableStatus::Billed);
    }

    #[test]
    fn test_unknown_status_is_invalid_status() {
        let err = "reserved".parse::<TableStatus>().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidStatus);
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TableStatus::Billed).unwrap(), "\"billed\"");
        let status: TableStatus = serde_json::from_str("\"occupied\"").unwrap();
        assert_eq!(status, TableStatus::Occupied);
    }
}
