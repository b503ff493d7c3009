use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a generative upstream credential is configured.
    pub upstream_configured: bool,
}

/// GET /health -- returns service status. Missing credentials report
/// `degraded`; compositing still works without them.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream_configured = state.upstream.is_some();
    let status = if upstream_configured { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        upstream_configured,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
