//! HTTP API
//!
//! # Routes
//!
//! | Method | Path | Guard | Handler |
//! |--------|------|-------|---------|
//! | GET | `/` | - | [`health::welcome`] |
//! | GET | `/api/health` | - | [`health::health`] |
//! | GET | `/api/menu` | - | [`menu::list`] |
//! | POST | `/api/menu` | admin | [`menu::create`] |
//! | PUT | `/api/menu/{id}` | admin | [`menu::update`] |
//! | DELETE | `/api/menu/{id}` | admin | [`menu::delete`] |
//! | GET | `/api/tables` | - | [`tables::list`] |
//! | POST | `/api/tables` | admin | [`tables::create`] |
//! | PUT | `/api/tables/{id}` | admin | [`tables::update_status`] |
//! | GET | `/api/orders/active` | - | [`orders::list_active`] |
//! | GET | `/api/orders/{id}` | - | [`orders::get_by_id`] |
//! | PUT | `/api/orders/{id}` | admin | [`orders::update_status`] |
//! | DELETE | `/api/orders/{id}` | admin | [`orders::delete`] |
//!
//! Guarded handlers take the [`RequireAdmin`](crate::auth::RequireAdmin)
//! extractor; the guard is open when no admin token is configured.

pub mod health;
pub mod menu;
pub mod orders;
pub mod tables;

use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build the router with all routes registered (no state attached yet)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .route("/", get(health::welcome))
        .route("/api/health", get(health::health))
        .route("/api/menu", get(menu::list).post(menu::create))
        .route("/api/menu/{id}", put(menu::update).delete(menu::delete))
        .route("/api/tables", get(tables::list).post(tables::create))
        .route("/api/tables/{id}", put(tables::update_status))
        .route("/api/orders/active", get(orders::list_active))
        .route(
            "/api/orders/{id}",
            get(orders::get_by_id)
                .put(orders::update_status)
                .delete(orders::delete),
        )
}

/// Build the application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
