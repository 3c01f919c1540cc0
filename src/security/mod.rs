//! Security services consulted by the request gate.
//!
//! This module provides the stateful security components:
//!
//! - **Rate Limiting**: Fixed-window counters per (route class, client identity)
//! - **CSRF Tokens**: Per-session issuance, expiry and constant-time validation
//! - **Abuse Detection**: Signature scan over URLs and bot filtering for admin routes
//! - **Security Events**: Append-only audit records for every denial
//! - **Security Headers**: The baseline response header set
//!
//! # Architecture
//!
//! ```text
//! Request Gate ──► FixedWindowLimiter ──► allow / deny + reset
//!       │
//!       ├──────► AbuseDetector ─────────► clean / signature / bot-on-admin
//!       │
//!       └──────► headers::apply_security_headers (every response)
//!
//! Handlers ─────► CsrfTokenManager ─────► issue / validate / rotate
//! ```
//!
//! All denials emit a [`events::SecurityEvent`]; plain validation failures
//! never do.

pub mod abuse;
pub mod csrf;
pub mod events;
pub mod headers;
pub mod rate_limit;

pub use abuse::{AbuseDetector, ScanVerdict};
pub use csrf::CsrfTokenManager;
pub use events::{SecurityEvent, SecurityEventKind};
pub use rate_limit::{FixedWindowLimiter, RateLimitDecision, RateLimitPolicy, RouteClass};
