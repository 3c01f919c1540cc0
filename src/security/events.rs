//! Append-only security audit events.
//!
//! Every component that denies a request emits one of these. Events flow to
//! the structured log (dedicated `storegate::security` target, warn level)
//! and to the Prometheus counter; there is no mutable store behind them.
//! Plain validation failures are expected traffic and never become events.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::metrics;

/// Category of a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    /// A rate-limit ceiling was hit.
    RateLimit,
    /// A CSRF token was missing, mismatched or expired.
    CsrfFailure,
    /// A login attempt against an unknown or mismatched account.
    InvalidLogin,
    /// An abuse signature matched, or a bot targeted admin routes.
    SuspiciousActivity,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventKind::RateLimit => "rate_limit",
            SecurityEventKind::CsrfFailure => "csrf_failure",
            SecurityEventKind::InvalidLogin => "invalid_login",
            SecurityEventKind::SuspiciousActivity => "suspicious_activity",
        }
    }
}

impl std::fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub kind: SecurityEventKind,
    pub client_identity: String,
    pub user_agent: Option<String>,
    pub details: Value,
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(
        kind: SecurityEventKind,
        client_identity: impl Into<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            kind,
            client_identity: client_identity.into(),
            user_agent,
            details: Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Attach free-form context (path, route class, matched category, ...).
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Emit an event to the log and the metrics counter.
pub fn emit(event: &SecurityEvent) {
    tracing::warn!(
        target: "storegate::security",
        kind = event.kind.as_str(),
        client = %event.client_identity,
        user_agent = event.user_agent.as_deref().unwrap_or(""),
        details = %event.details,
        timestamp = %event.timestamp.to_rfc3339(),
        "Security event"
    );

    metrics::record_security_event(event.kind.as_str());
}
