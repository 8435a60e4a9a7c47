//! Dining table handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::{DiningTable, TableStatus};

use crate::auth::RequireAdmin;
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
pub struct TableCreate {
    pub number: u32,
}

/// Status-update body shared by table and order routes
///
/// `status` is a string so an out-of-enum value surfaces as
/// `InvalidStatus` instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    pub expected_version: Option<u64>,
}

/// GET /api/tables - all tables, ordered by number
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    Ok(Json(state.tables().list()?))
}

/// POST /api/tables - provision a table
pub async fn create(
    State(state): State<ServerState>,
    _: RequireAdmin,
    Json(payload): Json<TableCreate>,
) -> AppResult<Json<DiningTable>> {
    let table = state.tables().create(payload.number)?;
    tracing::info!(table_id = table.id, number = table.number, "table created");
    Ok(Json(table))
}

/// PUT /api/tables/{id} - change occupancy status (broadcasts)
pub async fn update_status(
    State(state): State<ServerState>,
    _: RequireAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<DiningTable>> {
    let status: TableStatus = payload.status.parse()?;
    let table = state
        .tables()
        .update_status(id, status, payload.expected_version)
        .await?;
    Ok(Json(table))
}
