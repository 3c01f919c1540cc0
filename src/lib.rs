//! # storegate
//!
//! The request-gating service layer of a storefront: every inbound request
//! passes a composed security gate before it reaches page rendering.
//!
//! - **Rate Limiting**: Fixed-window counters per (route class, client identity)
//! - **CSRF Protection**: Per-session tokens, rotated on every auth state change
//! - **Abuse Detection**: Signature scan + bot filtering for admin routes
//! - **Input Validation**: One set of pure validators shared by every form
//! - **Cart State**: Client-held line collection with merge semantics and
//!   write-through persistence
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Request Gate (rate limit → admin auth → abuse scan)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → CORS)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (session, login, register, checkout, admin)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Security services (limiter, CSRF manager, abuse detector)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storegate::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config)?;
//!     state.spawn_housekeeping();
//!     let app = build_router(state);
//!
//!     // Start the server...
//!     Ok(())
//! }
//! ```
//!
//! ## Security Configuration
//!
//! Tighten a rate-limit class:
//! ```bash
//! RATE_LIMIT_LOGIN_MAX=3 RATE_LIMIT_LOGIN_WINDOW_SECS=1800 cargo run
//! ```

pub mod cart;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod state;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
