//! Order handlers
//!
//! Reads are public; status changes and deletion are privileged and go
//! through the lifecycle so every success broadcasts.

use axum::extract::{Path, State};
use axum::Json;
use shared::error::AppResult;
use shared::models::{Order, OrderStatus};

use super::tables::StatusUpdate;
use crate::auth::RequireAdmin;
use crate::core::ServerState;

/// GET /api/orders/active - every order that has not completed
pub async fn list_active(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders().list_active()?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders().get(id)?))
}

/// PUT /api/orders/{id} - move an order through its lifecycle (broadcasts)
pub async fn update_status(
    State(state): State<ServerState>,
    _: RequireAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<Order>> {
    let status: OrderStatus = payload.status.parse()?;
    let order = state
        .orders()
        .update_status(id, status, payload.expected_version)
        .await?;
    Ok(Json(order))
}

/// DELETE /api/orders/{id} - remove an order and its items (broadcasts)
pub async fn delete(
    State(state): State<ServerState>,
    _: RequireAdmin,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.orders().delete(id).await?;
    Ok(Json(true))
}
