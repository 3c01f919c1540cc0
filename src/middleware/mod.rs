//! HTTP middleware: the request gate and its supporting layers.
//!
//! - **Request Gate**: rate limiting by route class, admin authorization,
//!   abuse filtering and security headers, composed per request
//! - **Request ID**: generation and propagation for audit correlation
//! - **Client identity**: derivation from forwarded-IP headers
//!
//! # Architecture
//!
//! ```text
//! Request → Request Gate → Request ID → Trace → CORS → Handler
//!               ↓
//!     429 / 307 / 403 short-circuits, security headers on every exit
//! ```

pub mod gate;
pub mod ip;
pub mod request_id;

pub use gate::{RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER, RequestGateLayer};
pub use ip::{UNKNOWN_IDENTITY, client_identity, user_agent};
pub use request_id::RequestIdLayer;
