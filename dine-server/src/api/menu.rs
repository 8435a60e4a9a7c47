//! Menu catalog handlers
//!
//! Menu writes are the admin surface; they touch only the store and do not
//! broadcast. Clients pick up catalog changes on their next read.

use axum::extract::{Path, State};
use axum::Json;
use shared::error::AppResult;
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};

use crate::auth::RequireAdmin;
use crate::core::ServerState;

/// GET /api/menu - full catalog
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<MenuItem>>> {
    Ok(Json(state.store().list_menu()?))
}

/// POST /api/menu - add a menu item
pub async fn create(
    State(state): State<ServerState>,
    _: RequireAdmin,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<Json<MenuItem>> {
    let item = state.store().create_menu_item(payload)?;
    tracing::info!(item_id = item.id, name = %item.name, "menu item created");
    Ok(Json(item))
}

/// PUT /api/menu/{id} - partial update
pub async fn update(
    State(state): State<ServerState>,
    _: RequireAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    let item = state.store().update_menu_item(id, payload)?;
    tracing::info!(item_id = id, "menu item updated");
    Ok(Json(item))
}

/// DELETE /api/menu/{id}
pub async fn delete(
    State(state): State<ServerState>,
    _: RequireAdmin,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.store().delete_menu_item(id)?;
    tracing::info!(item_id = id, "menu item deleted");
    Ok(Json(true))
}
