//! Domain models: session representation and API request/response types.

pub mod api;
pub mod session;

pub use api::{
    AuthResponse, CheckoutRequest, CheckoutResponse, CooldownResponse, HealthResponse,
    LoginRequest, RegisterRequest, SessionResponse,
};
pub use session::{AccountType, DemoAccounts, SessionPresence, SessionUser};
