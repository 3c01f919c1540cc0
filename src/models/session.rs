//! Session representation carried in cookies, and the demo account directory.
//!
//! The inbound session is a `user` cookie holding a small JSON object with at
//! minimum a `type` field (`admin` or `customer`). The gate only needs that
//! field for admin-route authorization; anything unparseable is treated as
//! unauthenticated rather than an error.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::utils::cookie_value;

/// Cookie carrying the serialized session user.
pub const USER_COOKIE: &str = "user";

/// Cookie carrying the opaque session id used to key CSRF tokens.
pub const SESSION_COOKIE: &str = "sid";

/// Role of an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Admin,
    Customer,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Admin => "admin",
            AccountType::Customer => "customer",
        }
    }
}

/// The session user as mirrored into the `user` cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// What the request carried in its `user` cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPresence {
    /// No `user` cookie at all.
    Missing,
    /// A cookie was present but did not parse; treated as unauthenticated.
    Malformed,
    /// A well-formed session.
    Present(SessionUser),
}

impl SessionUser {
    pub fn new(account_type: AccountType, email: impl Into<String>) -> Self {
        Self {
            account_type,
            email: Some(email.into()),
            name: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.account_type == AccountType::Admin
    }

    /// Parse the session out of the request's cookie header.
    pub fn from_headers(headers: &HeaderMap) -> SessionPresence {
        match cookie_value(headers, USER_COOKIE) {
            None => SessionPresence::Missing,
            Some(raw) => match serde_json::from_str::<SessionUser>(&raw) {
                Ok(user) => SessionPresence::Present(user),
                Err(_) => SessionPresence::Malformed,
            },
        }
    }

    /// Serialize for the `user` cookie.
    pub fn to_cookie_payload(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize session: {e}")))
    }
}

/// One mock account. There is no user database behind this service; the demo
/// directory stands in for it.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub email: String,
    password: String,
    pub account_type: AccountType,
}

/// The fixed demo account directory, built from configuration at startup.
#[derive(Debug, Clone)]
pub struct DemoAccounts {
    accounts: Vec<DemoAccount>,
}

impl DemoAccounts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            accounts: vec![
                DemoAccount {
                    email: config.demo_admin_email.clone(),
                    password: config.demo_admin_password.clone(),
                    account_type: AccountType::Admin,
                },
                DemoAccount {
                    email: config.demo_customer_email.clone(),
                    password: config.demo_customer_password.clone(),
                    account_type: AccountType::Customer,
                },
            ],
        }
    }

    /// Check credentials against the directory.
    ///
    /// Password comparison is constant-time; the email lookup is not secret.
    pub fn verify(&self, email: &str, password: &str) -> Option<&DemoAccount> {
        let account = self
            .accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email))?;

        let matches: bool = account
            .password
            .as_bytes()
            .ct_eq(password.as_bytes())
            .into();
        matches.then_some(account)
    }
}
