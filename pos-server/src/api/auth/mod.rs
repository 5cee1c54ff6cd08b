//! Authentication Routes

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Build authentication router
/// - /api/auth/login: public (no auth required, skipped by require_auth)
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/auth/login", post(handler::login))
}
