//! Admin endpoints. The gate has already enforced an admin session by the
//! time these run.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Operational snapshot for the admin dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub uptime_seconds: u64,
    pub tracked_rate_limit_keys: usize,
    pub active_csrf_sessions: usize,
}

/// `GET /admin/dashboard`
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        uptime_seconds: state.uptime_seconds(),
        tracked_rate_limit_keys: state.limiter.tracked_keys(),
        active_csrf_sessions: state.csrf.tracked_sessions(),
    })
}
