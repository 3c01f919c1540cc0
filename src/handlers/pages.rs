//! Page-shaped endpoints: the home stub and the rate-limit cooldown page.

use axum::Json;
use axum::extract::Query;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::models::api::CooldownResponse;

/// `GET /` - home stub; the redirect target for non-admin sessions bounced
/// off admin routes.
pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "storegate storefront",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Query parameters of the cooldown page.
#[derive(Debug, Deserialize)]
pub struct CooldownParams {
    /// Seconds until the caller's window resets, as carried by the redirect.
    #[serde(rename = "retryAfter", default)]
    pub retry_after: Option<u64>,
}

/// `GET /rate-limit` - cooldown info for rate-limited page navigation.
///
/// Shows the countdown; retrying is up to the caller once it elapses.
pub async fn cooldown(Query(params): Query<CooldownParams>) -> Json<CooldownResponse> {
    let retry_after_secs = params.retry_after.unwrap_or(0);

    Json(CooldownResponse {
        retry_after_secs,
        message: format!(
            "Too many requests. Please wait {retry_after_secs} seconds before retrying."
        ),
    })
}
