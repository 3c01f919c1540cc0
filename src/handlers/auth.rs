//! Session initialization and authentication state changes.
//!
//! Every state change here (login, register, logout) rotates the session's
//! CSRF token, so tokens are scoped to a single authentication generation.
//! Validation failures return field errors and are never logged as security
//! events; a credential mismatch is.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::ip::{client_identity, user_agent};
use crate::models::api::{AuthResponse, LoginRequest, RegisterRequest, SessionResponse};
use crate::models::session::{AccountType, SESSION_COOKIE, SessionUser};
use crate::security::events::{self, SecurityEvent, SecurityEventKind};
use crate::state::AppState;
use crate::utils::cookie_value;
use crate::validation::{
    sanitize_text, validate_email, validate_password, validate_person_name, validate_phone,
};

use super::util::{clear_user_cookie, require_csrf, session_cookie, user_cookie};

/// `GET /api/session` - ensure a session id and hand out a CSRF token.
///
/// Reuses an existing `sid` cookie if the client sent one; otherwise mints a
/// fresh UUID session. Either way the session's token is (re)issued, so this
/// is also the recovery path after a token expires.
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let session_id =
        cookie_value(&headers, SESSION_COOKIE).unwrap_or_else(|| Uuid::new_v4().to_string());
    let csrf_token = state.csrf.issue(&session_id);

    Ok((
        [(SET_COOKIE, session_cookie(&session_id))],
        Json(SessionResponse {
            session_id,
            csrf_token,
        }),
    ))
}

/// `POST /login` - authenticate against the demo account directory.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = sanitize_text(&body.email);

    let mut violations = Vec::new();
    if !validate_email(&email) {
        violations.push("email must be a valid address".to_string());
    }
    if body.password.is_empty() {
        violations.push("password must not be empty".to_string());
    }
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let session_id = require_csrf(&state, &headers)?;

    let Some(account) = state.accounts.verify(&email, &body.password) else {
        events::emit(
            &SecurityEvent::new(
                SecurityEventKind::InvalidLogin,
                client_identity(&headers).into_owned(),
                user_agent(&headers),
            )
            .with_details(serde_json::json!({ "email": email })),
        );
        return Err(AppError::InvalidCredentials);
    };

    let user = SessionUser::new(account.account_type, account.email.clone());
    let payload = user.to_cookie_payload()?;
    let csrf_token = state.csrf.issue(&session_id);

    Ok((
        [(SET_COOKIE, user_cookie(&payload))],
        Json(AuthResponse {
            success: true,
            account_type: account.account_type,
            csrf_token,
        }),
    ))
}

/// `POST /register` - validate a registration and start a customer session.
///
/// There is no account store behind this service, so a valid registration
/// simply becomes a customer session.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let email = sanitize_text(&body.email);
    let name = sanitize_text(&body.name);

    let mut violations = Vec::new();
    if !validate_email(&email) {
        violations.push("email must be a valid address".to_string());
    }
    let password_check = validate_password(&body.password);
    violations.extend(password_check.violation_messages());
    if !validate_phone(&body.phone) {
        violations.push("phone must be a valid mobile number".to_string());
    }
    if !validate_person_name(&name) {
        violations.push("name must be 2-50 letters".to_string());
    }
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let session_id = require_csrf(&state, &headers)?;

    let user = SessionUser {
        account_type: AccountType::Customer,
        email: Some(email),
        name: Some(name),
    };
    let payload = user.to_cookie_payload()?;
    let csrf_token = state.csrf.issue(&session_id);

    Ok((
        [(SET_COOKIE, user_cookie(&payload))],
        Json(AuthResponse {
            success: true,
            account_type: AccountType::Customer,
            csrf_token,
        }),
    ))
}

/// `POST /logout` - drop the session user and rotate the CSRF token.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let session_id = require_csrf(&state, &headers)?;
    let csrf_token = state.csrf.issue(&session_id);

    Ok((
        [(SET_COOKIE, clear_user_cookie())],
        Json(SessionResponse {
            session_id,
            csrf_token,
        }),
    ))
}
