use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;
use crate::models::CartLine;

// ==================== Broadcast Events ====================

/// Names of the state-change events fanned out to connected sessions
///
/// Wire names match what the customer terminal, kitchen display, and admin
/// dashboard already listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventName {
    /// A new order was created (payload: full order with items)
    NewOrder,
    /// A table changed occupancy status (payload: full table)
    TableStatusUpdated,
    /// An order moved through its lifecycle (payload: full order with items)
    OrderStatusUpdated,
    /// An order was removed (payload: id only)
    OrderDeleted,
    /// A kitchen actor updated one item (payload: full order item)
    OrderItemStatusUpdated,
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewOrder => write!(f, "newOrder"),
            Self::TableStatusUpdated => write!(f, "tableStatusUpdated"),
            Self::OrderStatusUpdated => write!(f, "orderStatusUpdated"),
            Self::OrderDeleted => write!(f, "orderDeleted"),
            Self::OrderItemStatusUpdated => write!(f, "orderItemStatusUpdated"),
        }
    }
}

/// Broadcast event payload (server -> all sessions)
///
/// `data` carries the full post-mutation entity, except for
/// [`EventName::OrderDeleted`] which carries only the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub event: EventName,
    pub data: serde_json::Value,
}

impl EventPayload {
    pub fn new(event: EventName, data: serde_json::Value) -> Self {
        Self { event, data }
    }
}

/// Payload of an [`EventName::OrderDeleted`] event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDeletedData {
    pub id: i64,
}

// ==================== Client Requests ====================

/// Request actions understood by the message handler
pub mod actions {
    /// Join the room of one table (idempotent)
    pub const JOIN_TABLE: &str = "table.join";
    /// Create an order from a cart
    pub const PLACE_ORDER: &str = "order.place";
    /// Update the preparation status of one order item
    pub const UPDATE_ITEM_STATUS: &str = "order.item_status";
}

/// Request payload (client -> server)
///
/// Each inbound request maps to exactly one core operation and receives a
/// correlated [`ResponsePayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
    /// Operation identifier (see [`actions`])
    pub action: String,
    /// Operation parameters (JSON object)
    pub params: Option<serde_json::Value>,
}

impl RequestPayload {
    pub fn new(action: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }

    pub fn join_table(table_id: i64) -> Self {
        Self::new(
            actions::JOIN_TABLE,
            serde_json::to_value(JoinTableParams { table_id }).ok(),
        )
    }

    pub fn place_order(params: PlaceOrderParams) -> Self {
        Self::new(actions::PLACE_ORDER, serde_json::to_value(params).ok())
    }

    pub fn update_item_status(params: UpdateItemStatusParams) -> Self {
        Self::new(
            actions::UPDATE_ITEM_STATUS,
            serde_json::to_value(params).ok(),
        )
    }
}

/// Parameters of [`actions::JOIN_TABLE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTableParams {
    pub table_id: i64,
}

/// Parameters of [`actions::PLACE_ORDER`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderParams {
    pub table_id: i64,
    pub cart: Vec<CartLine>,
}

/// Parameters of [`actions::UPDATE_ITEM_STATUS`]
///
/// `status` stays a string on the wire so an out-of-enum value surfaces as
/// `InvalidStatus` instead of a deserialization error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateItemStatusParams {
    pub order_id: i64,
    pub item_id: i64,
    pub status: String,
    /// Optional compare-and-swap guard; omit for last-write-wins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

// ==================== Responses ====================

/// Response payload (server -> requesting client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub success: bool,
    /// Response message / error description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error code (only on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl ResponsePayload {
    pub fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error_code: None,
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            success: false,
            message: err.message.clone(),
            data: None,
            error_code: Some(err.code.code()),
        }
    }
}
