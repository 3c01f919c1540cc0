//! Shared handler plumbing: CSRF enforcement and cookie construction.

use axum::http::HeaderMap;

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::ip::{client_identity, user_agent};
use crate::models::session::{SESSION_COOKIE, USER_COOKIE};
use crate::security::events::{self, SecurityEvent, SecurityEventKind};
use crate::state::AppState;
use crate::utils::cookie_value;

/// Header clients present their CSRF token in.
pub const CSRF_TOKEN_HEADER: &str = "x-csrf-token";

/// Enforce CSRF on a state-changing request.
///
/// Requires a `sid` cookie naming the session and a matching, unexpired
/// token in the `X-CSRF-Token` header. Every failure mode (no session, no
/// token, bad token) fails closed, emits a `csrf_failure` event and maps to
/// 403.
///
/// Returns the session id so the caller can rotate the token afterwards.
pub fn require_csrf(state: &AppState, headers: &HeaderMap) -> AppResult<String> {
    let session_id = cookie_value(headers, SESSION_COOKIE);
    let presented = headers
        .get(CSRF_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Some(session_id) = session_id
        && let Some(presented) = presented
        && state.csrf.validate(&session_id, presented)
    {
        return Ok(session_id);
    }

    events::emit(
        &SecurityEvent::new(
            SecurityEventKind::CsrfFailure,
            client_identity(headers).into_owned(),
            user_agent(headers),
        )
        .with_details(serde_json::json!({ "token_presented": presented.is_some() })),
    );
    metrics::record_csrf_failure();

    Err(AppError::CsrfRejected)
}

/// `Set-Cookie` value carrying the serialized session user.
pub fn user_cookie(payload: &str) -> String {
    format!("{USER_COOKIE}={payload}; Path=/; SameSite=Lax")
}

/// `Set-Cookie` value clearing the session user (logout).
pub fn clear_user_cookie() -> String {
    format!("{USER_COOKIE}=; Path=/; Max-Age=0")
}

/// `Set-Cookie` value for the opaque session id keying CSRF tokens.
pub fn session_cookie(session_id: &str) -> String {
    format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax")
}
