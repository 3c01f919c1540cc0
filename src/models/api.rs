use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::AccountType;
use crate::cart::CartLine;

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form submission.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub phone: String,
    pub name: String,
}

/// Response after a successful authentication state change.
///
/// Carries the freshly rotated CSRF token; the previous token is invalid from
/// this point on.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub account_type: AccountType,
    pub csrf_token: String,
}

/// Response for session initialization.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub csrf_token: String,
}

/// Checkout submission: the client's cart snapshot.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub lines: Vec<CartLine>,
}

/// Acknowledgment of an accepted checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub item_count: u64,
    pub total: Decimal,
}

/// Cooldown page payload for rate-limited navigation.
#[derive(Debug, Serialize)]
pub struct CooldownResponse {
    pub retry_after_secs: u64,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
