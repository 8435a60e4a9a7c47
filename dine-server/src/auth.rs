//! Bearer-token guard for the privileged API surface
//!
//! Mutating routes (table/order status, order delete, menu CRUD) require
//! the configured admin token. Without `ADMIN_TOKEN` in the environment the
//! guard is open, which is the expected development mode.

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::error::AppError;

use crate::core::ServerState;

/// Extractor that rejects requests lacking the admin bearer token
pub struct RequireAdmin;

impl FromRequestParts<ServerState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let expected = match state.config.admin_token.as_deref() {
            Some(token) => token,
            // No token configured: open mode
            None => return Ok(Self),
        };

        let bearer = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match bearer {
            None => Err(AppError::not_authenticated()),
            Some(token) if token == expected => Ok(Self),
            Some(_) => Err(AppError::permission_denied("invalid admin token")),
        }
    }
}
