//! HTTP request handlers.
//!
//! Handlers sit behind the request gate: by the time one runs, rate limits,
//! admin authorization and the abuse scan have already passed. What remains
//! here is input validation, CSRF enforcement on state-changing routes, and
//! the demo business surface.

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod health;
pub mod pages;
pub mod util;

pub use admin::dashboard;
pub use auth::{login, logout, register, session};
pub use checkout::submit_checkout;
pub use health::{health_check, readiness_check};
pub use pages::{cooldown, home};
