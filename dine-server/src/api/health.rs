//! Health and welcome handlers

use axum::extract::State;
use axum::Json;

use crate::core::ServerState;

/// GET / - welcome banner for humans poking the port
pub async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "QuickDine Engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/health - liveness plus a few cheap gauges
pub async fn health(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions().session_count(),
    }))
}
