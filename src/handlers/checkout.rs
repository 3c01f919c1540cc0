//! Checkout submission.
//!
//! Accepts the client's cart snapshot, re-validates it server-side and
//! acknowledges with a recomputed total. The total is always derived from
//! the submitted lines, never trusted from the client.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cart::CartLine;
use crate::error::{AppError, AppResult};
use crate::models::api::{CheckoutRequest, CheckoutResponse};
use crate::state::AppState;
use crate::validation::validate_price;

use super::util::require_csrf;

/// `POST /checkout`
pub async fn submit_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    let mut violations = Vec::new();
    if body.lines.is_empty() {
        violations.push("cart must not be empty".to_string());
    }
    for line in &body.lines {
        if line.quantity == 0 {
            violations.push(format!(
                "line {}/{} has zero quantity",
                line.product_id, line.size
            ));
        }
        if !validate_price(line.unit_price) {
            violations.push(format!(
                "line {}/{} has an invalid price",
                line.product_id, line.size
            ));
        }
    }
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    require_csrf(&state, &headers)?;

    let total: Decimal = body.lines.iter().map(CartLine::line_total).sum();
    let item_count: u64 = body.lines.iter().map(|line| u64::from(line.quantity)).sum();

    Ok(Json(CheckoutResponse {
        order_id: Uuid::new_v4(),
        item_count,
        total,
    }))
}
