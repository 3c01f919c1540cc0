//! Liveness and readiness endpoints.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::models::api::HealthResponse;
use crate::state::AppState;

/// `GET /health` - liveness check.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// `GET /ready` - readiness check.
///
/// The gate holds no external connections, so readiness is simply "the
/// process is serving".
pub async fn readiness_check() -> Json<Value> {
    Json(json!({ "ready": true }))
}
