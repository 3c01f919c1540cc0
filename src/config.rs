//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Security Configuration
//!
//! - `RATE_LIMIT_*`: Per route-class fixed-window quotas (login, register,
//!   checkout, api)
//! - `CSRF_TTL_SECS`: Lifetime of issued CSRF tokens (default: 24 hours)
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated list of allowed origins (default: `*` for dev)
//!
//! # Route Surface
//!
//! The gate classifies requests by path. The sensitive page paths and the
//! API/admin prefixes are configurable so deployments can mount the service
//! under localized or versioned routes.

use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::security::rate_limit::{RateLimitPolicy, RatePolicies};

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    // =========================================================================
    // Route Surface
    // =========================================================================
    /// Prefix for the generic API namespace (default: "/api")
    pub api_prefix: String,

    /// Prefix for the admin namespace (default: "/admin")
    pub admin_prefix: String,

    /// Login page path, rate-limited under the `login` class (default: "/login")
    pub login_path: String,

    /// Registration page path, rate-limited under the `register` class
    /// (default: "/register")
    pub register_path: String,

    /// Checkout page path, rate-limited under the `checkout` class
    /// (default: "/checkout")
    pub checkout_path: String,

    /// Home page path, the redirect target for non-admin sessions hitting
    /// admin routes (default: "/")
    pub home_path: String,

    /// Cooldown page path, the redirect target for rate-limited page
    /// navigation (default: "/rate-limit")
    pub cooldown_path: String,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Fixed-window quotas per route class
    pub rate_policies: RatePolicies,

    // =========================================================================
    // CSRF Configuration
    // =========================================================================
    /// Lifetime of issued CSRF tokens (default: 24 hours)
    pub csrf_ttl: Duration,

    // =========================================================================
    // Housekeeping Configuration
    // =========================================================================
    /// Interval for the background sweep that evicts expired rate-limit
    /// records and CSRF tokens (default: 5 minutes)
    pub sweep_interval: Duration,

    // =========================================================================
    // Request Limits
    // =========================================================================
    /// Maximum request body size in bytes (default: 1MB)
    /// Prevents denial-of-service via large payloads
    pub max_request_body_size: usize,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Comma-separated list of allowed CORS origins
    /// Use "*" to allow all origins (not recommended for production)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Demo Account Configuration
    // =========================================================================
    /// Email of the built-in admin account
    pub demo_admin_email: String,

    /// Password of the built-in admin account
    pub demo_admin_password: String,

    /// Email of the built-in customer account
    pub demo_customer_email: String,

    /// Password of the built-in customer account
    pub demo_customer_password: String,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any required configuration is invalid
    /// (e.g., non-numeric PORT value, a zero-length rate-limit window).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,

            // Route surface
            api_prefix: Self::parse_path("API_PREFIX", "/api"),
            admin_prefix: Self::parse_path("ADMIN_PREFIX", "/admin"),
            login_path: Self::parse_path("LOGIN_PATH", "/login"),
            register_path: Self::parse_path("REGISTER_PATH", "/register"),
            checkout_path: Self::parse_path("CHECKOUT_PATH", "/checkout"),
            home_path: Self::parse_path("HOME_PATH", "/"),
            cooldown_path: Self::parse_path("COOLDOWN_PATH", "/rate-limit"),

            // Rate limiting
            rate_policies: RatePolicies {
                login: RateLimitPolicy::new(
                    Self::parse_env("RATE_LIMIT_LOGIN_MAX", 5)?,
                    Self::parse_env("RATE_LIMIT_LOGIN_WINDOW_SECS", 15 * 60)?,
                ),
                register: RateLimitPolicy::new(
                    Self::parse_env("RATE_LIMIT_REGISTER_MAX", 3)?,
                    Self::parse_env("RATE_LIMIT_REGISTER_WINDOW_SECS", 60 * 60)?,
                ),
                api: RateLimitPolicy::new(
                    Self::parse_env("RATE_LIMIT_API_MAX", 100)?,
                    Self::parse_env("RATE_LIMIT_API_WINDOW_SECS", 15 * 60)?,
                ),
                checkout: RateLimitPolicy::new(
                    Self::parse_env("RATE_LIMIT_CHECKOUT_MAX", 10)?,
                    Self::parse_env("RATE_LIMIT_CHECKOUT_WINDOW_SECS", 60 * 60)?,
                ),
            },

            // CSRF
            csrf_ttl: Duration::from_secs(Self::parse_env("CSRF_TTL_SECS", 24 * 60 * 60)?),

            // Housekeeping
            sweep_interval: Duration::from_secs(Self::parse_env(
                "SECURITY_SWEEP_INTERVAL_SECS",
                5 * 60,
            )?),

            // Request limits
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 1024 * 1024)?, // 1MB

            // Security
            cors_allowed_origins: Self::parse_cors_origins(),

            // Demo accounts
            demo_admin_email: env::var("DEMO_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@store.test".to_string()),
            demo_admin_password: env::var("DEMO_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "Admin123!".to_string()),
            demo_customer_email: env::var("DEMO_CUSTOMER_EMAIL")
                .unwrap_or_else(|_| "customer@store.test".to_string()),
            demo_customer_password: env::var("DEMO_CUSTOMER_PASSWORD")
                .unwrap_or_else(|_| "Customer123!".to_string()),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        for (name, policy) in [
            ("login", &self.rate_policies.login),
            ("register", &self.rate_policies.register),
            ("api", &self.rate_policies.api),
            ("checkout", &self.rate_policies.checkout),
        ] {
            if policy.max_requests == 0 {
                return Err(AppError::ConfigError(format!(
                    "RATE_LIMIT_{}_MAX must be greater than 0",
                    name.to_uppercase()
                )));
            }
            if policy.window.is_zero() {
                return Err(AppError::ConfigError(format!(
                    "RATE_LIMIT_{}_WINDOW_SECS must be greater than 0",
                    name.to_uppercase()
                )));
            }
        }

        if self.csrf_ttl.is_zero() {
            return Err(AppError::ConfigError(
                "CSRF_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.sweep_interval.is_zero() {
            return Err(AppError::ConfigError(
                "SECURITY_SWEEP_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether `path` lives under the generic API namespace.
    pub fn is_api_path(&self, path: &str) -> bool {
        path.starts_with(&self.api_prefix)
    }

    /// Whether `path` lives under the admin page namespace.
    ///
    /// Only these paths require an authenticated admin session.
    pub fn is_admin_path(&self, path: &str) -> bool {
        path.starts_with(&self.admin_prefix)
    }

    /// Whether `path` targets admin functionality at all, page or API.
    ///
    /// This wider match is what the bot filter guards: automated clients are
    /// kept away from both `/admin` pages and `/api/admin` endpoints.
    pub fn is_admin_target(&self, path: &str) -> bool {
        self.is_admin_path(path)
            || path.starts_with(&format!(
                "{}{}",
                self.api_prefix.trim_end_matches('/'),
                self.admin_prefix
            ))
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse a path-valued environment variable, enforcing a leading slash.
    fn parse_path(name: &str, default: &str) -> String {
        match env::var(name) {
            Ok(val) if val.starts_with('/') => val,
            Ok(val) => format!("/{val}"),
            Err(_) => default.to_string(),
        }
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            // Route surface
            api_prefix: "/api".to_string(),
            admin_prefix: "/admin".to_string(),
            login_path: "/login".to_string(),
            register_path: "/register".to_string(),
            checkout_path: "/checkout".to_string(),
            home_path: "/".to_string(),
            cooldown_path: "/rate-limit".to_string(),
            // Rate limiting
            rate_policies: RatePolicies::default(),
            // CSRF
            csrf_ttl: Duration::from_secs(24 * 60 * 60),
            // Housekeeping
            sweep_interval: Duration::from_secs(5 * 60),
            // Request limits
            max_request_body_size: 1024 * 1024, // 1MB
            // Security
            cors_allowed_origins: vec!["*".to_string()],
            // Demo accounts
            demo_admin_email: "admin@store.test".to_string(),
            demo_admin_password: "Admin123!".to_string(),
            demo_customer_email: "customer@store.test".to_string(),
            demo_customer_password: "Customer123!".to_string(),
            // Observability
            log_level: "info".to_string(),
            metrics_port: 9090,
        }
    }
}
