//! Order and Order Item Models

use crate::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::invalid_status(other)),
        }
    }
}

/// Preparation status of a single order item, mutated by kitchen actors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    Pending,
    InProgress,
    Ready,
}

impl ItemStatus {
    /// Position in the preparation pipeline, used for the monotonicity check
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::InProgress => 1,
            Self::Ready => 2,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

impl FromStr for ItemStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "ready" => Ok(Self::Ready),
            other => Err(AppError::invalid_status(other)),
        }
    }
}

/// A single line of an order
///
/// Created together with its order; only `status` (and `version`) mutate
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// References an existing [`super::MenuItem`], validated at creation
    pub item_id: i64,
    pub quantity: u32,
    pub note: Option<String>,
    pub status: ItemStatus,
    /// Incremented on every successful update (compare-and-swap guard)
    pub version: u64,
}

/// Order entity with its nested items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    pub status: OrderStatus,
    /// Fixed at creation as Σ(menu price × quantity); never recomputed
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    /// Incremented on every successful update (compare-and-swap guard)
    pub version: u64,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Active orders are everything that has not completed
    pub fn is_active(&self) -> bool {
        self.status != OrderStatus::Completed
    }
}

/// One line of an incoming cart, as submitted by a customer terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Menu item reference
    pub item_id: i64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!(
            "cancelled".parse::<OrderStatus>().unwrap(),
            OrderStatus::Cancelled
        );
        assert!("done".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_item_status_wire_name() {
        // The kitchen display speaks "in-progress", not "inprogress"
        assert_eq!(
            serde_json::to_string(&ItemStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            "in-progress".parse::<ItemStatus>().unwrap(),
            ItemStatus::InProgress
        );
    }

    #[test]
    fn test_item_status_rank_order() {
        assert!(ItemStatus::Pending.rank() < ItemStatus::InProgress.rank());
        assert!(ItemStatus::InProgress.rank() < ItemStatus::Ready.rank());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());
    }
}
