//! The request gate: rate limiting, admin authorization and abuse filtering
//! composed in front of every route.
//!
//! # Per-request state machine
//!
//! ```text
//! Request
//!    │
//!    ▼
//! derive client identity (X-Forwarded-For / X-Real-IP / "unknown")
//!    │
//!    ▼
//! ┌───────────────────┐  denied   429 JSON + Retry-After   (API paths)
//! │  Rate limit by    │ ────────► 307 → cooldown page      (page paths)
//! │  route class      │
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐  missing/malformed  307 → login?redirect=<path>
//! │  Admin gating     │ ──────────────────►
//! │  (/admin prefix)  │  customer           307 → home
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐  signature match or bot-on-admin
//! │  Abuse scan       │ ────────► 403 Forbidden (generic body)
//! └─────────┬─────────┘
//!           ▼
//!        Handler
//! ```
//!
//! Every response leaving the gate, denials included, carries the baseline
//! security header set. Allowed rate-limited requests are annotated with
//! `X-RateLimit-Remaining` and `X-RateLimit-Reset`. The gate never retries
//! anything; retry timing is reported to the caller and acting on it is the
//! caller's responsibility.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, LOCATION, RETRY_AFTER};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::config::Config;
use crate::metrics;
use crate::middleware::ip::{client_identity, user_agent};
use crate::models::session::{SessionPresence, SessionUser};
use crate::security::abuse::AbuseDetector;
use crate::security::events::{self, SecurityEvent, SecurityEventKind};
use crate::security::headers::apply_security_headers;
use crate::security::rate_limit::{FixedWindowLimiter, RateLimitDecision, RouteClass};

/// Remaining-quota annotation on allowed rate-limited responses.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Window-reset annotation (epoch ms) on allowed rate-limited responses.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Request gate layer for the Tower middleware stack.
#[derive(Clone)]
pub struct RequestGateLayer {
    limiter: Arc<FixedWindowLimiter>,
    abuse: Arc<AbuseDetector>,
    config: Arc<Config>,
}

impl RequestGateLayer {
    pub fn new(
        limiter: Arc<FixedWindowLimiter>,
        abuse: Arc<AbuseDetector>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            limiter,
            abuse,
            config,
        }
    }
}

impl<S> Layer<S> for RequestGateLayer {
    type Service = RequestGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestGateService {
            inner,
            limiter: self.limiter.clone(),
            abuse: self.abuse.clone(),
            config: self.config.clone(),
        }
    }
}

/// Request gate service wrapper.
#[derive(Clone)]
pub struct RequestGateService<S> {
    inner: S,
    limiter: Arc<FixedWindowLimiter>,
    abuse: Arc<AbuseDetector>,
    config: Arc<Config>,
}

impl<S> Service<Request<Body>> for RequestGateService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let abuse = self.abuse.clone();
        let config = self.config.clone();
        let mut inner = self.inner.clone();

        // Everything the gate needs survives the request being moved into
        // the inner service.
        let path = req.uri().path().to_string();
        let full_url = req.uri().to_string();
        let query = req.uri().query().unwrap_or("").to_string();
        let identity = client_identity(req.headers()).into_owned();
        let agent = user_agent(req.headers());

        Box::pin(async move {
            // =================================================================
            // 1. Rate limiting by route class
            // =================================================================
            let mut quota: Option<RateLimitDecision> = None;
            if let Some(class) = RouteClass::classify(&path, &config) {
                let decision = limiter.check(&identity, class);

                if !decision.allowed {
                    warn!(
                        client = %identity,
                        path = %path,
                        class = %class,
                        retry_after_secs = decision.retry_after_secs,
                        "Rate limit exceeded"
                    );
                    events::emit(
                        &SecurityEvent::new(
                            SecurityEventKind::RateLimit,
                            &identity,
                            agent.clone(),
                        )
                        .with_details(json!({ "path": path, "class": class.as_str() })),
                    );
                    metrics::record_rate_limit_denial(class.as_str());
                    metrics::record_gate_decision("denied_rate_limit");

                    let response = if config.is_api_path(&path) {
                        rate_limited_json(&decision)
                    } else {
                        redirect_to(&format!(
                            "{}?retryAfter={}",
                            config.cooldown_path, decision.retry_after_secs
                        ))
                    };
                    return Ok(finish(response));
                }

                quota = Some(decision);
            }

            // =================================================================
            // 2. Admin route authorization
            // =================================================================
            if config.is_admin_path(&path) {
                match SessionUser::from_headers(req.headers()) {
                    SessionPresence::Present(user) if user.is_admin() => {}
                    SessionPresence::Present(_) => {
                        debug!(client = %identity, path = %path, "Non-admin session on admin route");
                        metrics::record_gate_decision("denied_auth");
                        return Ok(finish(redirect_to(&config.home_path)));
                    }
                    // A cookie that does not parse counts as no session.
                    SessionPresence::Missing | SessionPresence::Malformed => {
                        debug!(client = %identity, path = %path, "Unauthenticated admin access");
                        metrics::record_gate_decision("denied_auth");
                        return Ok(finish(redirect_to(&login_redirect(&config, &path))));
                    }
                }
            }

            // =================================================================
            // 3. Abuse scan and bot filtering
            // =================================================================
            let verdict = abuse.scan(
                &full_url,
                &query,
                agent.as_deref().unwrap_or(""),
                config.is_admin_target(&path),
            );
            if verdict.blocked() {
                warn!(
                    client = %identity,
                    url = %full_url,
                    reason = verdict.reason(),
                    "Suspicious request blocked"
                );
                events::emit(
                    &SecurityEvent::new(
                        SecurityEventKind::SuspiciousActivity,
                        &identity,
                        agent.clone(),
                    )
                    .with_details(json!({
                        "url": full_url,
                        "query": query,
                        "reason": verdict.reason(),
                        "blocked": true,
                    })),
                );
                metrics::record_abuse_block(verdict.reason());
                metrics::record_gate_decision("denied_abuse");

                // Generic body: which signature matched is never leaked.
                return Ok(finish(
                    (StatusCode::FORBIDDEN, "Forbidden").into_response(),
                ));
            }

            // =================================================================
            // 4. Hand off to rendering
            // =================================================================
            let mut response = inner.call(req).await?;
            apply_security_headers(response.headers_mut());
            if let Some(decision) = quota {
                annotate_quota(response.headers_mut(), &decision);
            }
            metrics::record_gate_decision("allowed");
            Ok(response)
        })
    }
}

/// Apply the security header set to a short-circuit response.
fn finish(mut response: Response<Body>) -> Response<Body> {
    apply_security_headers(response.headers_mut());
    response
}

/// Build a 429 response for API paths.
fn rate_limited_json(decision: &RateLimitDecision) -> Response<Body> {
    let body = json!({
        "error": "too_many_requests",
        "message": "Rate limit exceeded. Please try again later.",
        "retry_after_secs": decision.retry_after_secs,
    });

    (
        StatusCode::TOO_MANY_REQUESTS,
        [
            (RETRY_AFTER, decision.retry_after_secs.to_string()),
            (CONTENT_TYPE, "application/json".to_string()),
        ],
        body.to_string(),
    )
        .into_response()
}

/// Temporary redirect preserving the request method semantics of a page
/// navigation.
fn redirect_to(target: &str) -> Response<Body> {
    let location = HeaderValue::from_str(target)
        .unwrap_or_else(|_| HeaderValue::from_static("/"));
    (StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response()
}

/// Login path carrying the original path for post-login return.
fn login_redirect(config: &Config, original_path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(original_path.as_bytes()).collect();
    format!("{}?redirect={}", config.login_path, encoded)
}

/// Annotate an allowed response with its remaining quota.
fn annotate_quota(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_RESET_HEADER),
        HeaderValue::from(decision.reset_at_ms),
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_original_path() {
        let config = Config::default();
        assert_eq!(
            login_redirect(&config, "/admin/dashboard"),
            "/login?redirect=%2Fadmin%2Fdashboard"
        );
    }

    #[test]
    fn test_redirect_response_shape() {
        let response = redirect_to("/rate-limit?retryAfter=42");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/rate-limit?retryAfter=42"
        );
    }

    #[test]
    fn test_rate_limited_json_carries_retry_after() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at_ms: 1_000_000,
            retry_after_secs: 37,
        };

        let response = rate_limited_json(&decision);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "37");
    }

    #[test]
    fn test_annotate_quota_headers() {
        let decision = RateLimitDecision {
            allowed: true,
            remaining: 4,
            reset_at_ms: 1_234_567,
            retry_after_secs: 0,
        };

        let mut headers = HeaderMap::new();
        annotate_quota(&mut headers, &decision);
        assert_eq!(headers.get(RATE_LIMIT_REMAINING_HEADER).unwrap(), "4");
        assert_eq!(headers.get(RATE_LIMIT_RESET_HEADER).unwrap(), "1234567");
    }
}
