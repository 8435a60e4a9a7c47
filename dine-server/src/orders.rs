//! Order lifecycle
//!
//! Owns the transition rules for orders and their items and pairs every
//! successful mutation with exactly one broadcast event. The rules live
//! here; the store runs them inside its write transaction via validator
//! closures so check and write cannot interleave.
//!
//! # Order transitions
//!
//! ```text
//! pending ──▶ confirmed ──▶ completed
//!    │             │
//!    └──▶ cancelled ◀──┘
//! ```
//!
//! # Item transitions
//!
//! Items only move forward: `pending` -> `in-progress` -> `ready`, with
//! forward skips allowed (`pending` -> `ready` is fine). Item status and
//! order status are independent axes; neither constrains the other.

use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::{EventName, OrderDeletedData};
use shared::models::{CartLine, ItemStatus, Order, OrderItem, OrderStatus};

use crate::message::EventBroadcaster;
use crate::store::StateStore;

/// Whether an order may move from `from` to `to`
fn order_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
    )
}

/// Whether an item may move from `from` to `to` (strictly forward)
fn item_transition_allowed(from: ItemStatus, to: ItemStatus) -> bool {
    to.rank() > from.rank()
}

pub struct OrderLifecycle {
    store: Arc<StateStore>,
    broadcaster: Arc<EventBroadcaster>,
}

impl OrderLifecycle {
    pub fn new(store: Arc<StateStore>, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { store, broadcaster }
    }

    /// Fetch one order, failing with `OrderNotFound` when absent
    pub fn get(&self, id: i64) -> AppResult<Order> {
        self.store.get_order(id)?.ok_or_else(|| {
            AppError::with_message(ErrorCode::OrderNotFound, format!("order {} not found", id))
                .with_detail("id", id)
        })
    }

    pub fn list_active(&self) -> AppResult<Vec<Order>> {
        self.store.list_active_orders()
    }

    /// Create an order from a cart and broadcast `newOrder`
    pub async fn place(&self, table_id: i64, cart: &[CartLine]) -> AppResult<Order> {
        let order = self.store.create_order(table_id, cart)?;
        self.broadcaster.publish(EventName::NewOrder, &order).await?;
        tracing::info!(
            order_id = order.id,
            table_id,
            total = %order.total_price,
            items = order.items.len(),
            "order placed"
        );
        Ok(order)
    }

    /// Move an order through its lifecycle and broadcast the new state
    pub async fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
        expected_version: Option<u64>,
    ) -> AppResult<Order> {
        let order = self
            .store
            .update_order_status(id, status, expected_version, |current| {
                if order_transition_allowed(current, status) {
                    Ok(())
                } else {
                    Err(AppError::invalid_transition(
                        current.to_string(),
                        status.to_string(),
                    ))
                }
            })?;
        self.broadcaster
            .publish(EventName::OrderStatusUpdated, &order)
            .await?;
        tracing::info!(order_id = id, status = %status, "order status updated");
        Ok(order)
    }

    /// Move one item forward and broadcast the new item state
    ///
    /// `order_id` must actually own the item; a mismatch reads as the item
    /// not existing rather than leaking another order's state.
    pub async fn update_item_status(
        &self,
        order_id: i64,
        item_id: i64,
        status: ItemStatus,
        expected_version: Option<u64>,
    ) -> AppResult<OrderItem> {
        let order = self.get(order_id)?;
        if !order.items.iter().any(|i| i.id == item_id) {
            return Err(AppError::with_message(
                ErrorCode::OrderItemNotFound,
                format!("order item {} not found", item_id),
            )
            .with_detail("order_id", order_id)
            .with_detail("item_id", item_id));
        }

        let item = self
            .store
            .update_order_item_status(item_id, status, expected_version, |current| {
                if item_transition_allowed(current, status) {
                    Ok(())
                } else {
                    Err(AppError::invalid_transition(
                        current.to_string(),
                        status.to_string(),
                    ))
                }
            })?;
        self.broadcaster
            .publish(EventName::OrderItemStatusUpdated, &item)
            .await?;
        tracing::info!(order_id, item_id, status = %status, "order item status updated");
        Ok(item)
    }

    /// Remove an order and broadcast `orderDeleted` with its id
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.store.delete_order(id)?;
        self.broadcaster
            .publish(EventName::OrderDeleted, &OrderDeletedData { id })
            .await?;
        tracing::info!(order_id = id, "order deleted");
        Ok(())
    }
}
