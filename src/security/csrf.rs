//! Per-session CSRF token issuance and validation.
//!
//! # Lifecycle
//!
//! A token is issued when a session first asks for one and replaced on every
//! auth state change (login, register, logout), so tokens are scoped to a
//! single authentication generation. Tokens carry a 24-hour expiry; an
//! expired or absent record always fails closed and is evicted on the spot.
//!
//! # Security
//!
//! - 32 bytes of OS-sourced entropy per token, hex-encoded
//! - Validation compares in constant time to avoid timing side-channels

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::clock::Clock;

/// Entropy per token before hex encoding.
pub const CSRF_TOKEN_BYTES: usize = 32;

#[derive(Debug)]
struct TokenRecord {
    token: String,
    expires_at_ms: i64,
}

/// Issues and validates per-session CSRF tokens.
pub struct CsrfTokenManager {
    tokens: DashMap<String, TokenRecord>,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

impl CsrfTokenManager {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl_ms: ttl.as_millis() as i64,
            clock,
        }
    }

    /// Issue a fresh token for `session_id`, replacing any previous one.
    ///
    /// Returns the raw token for embedding in the client's subsequent
    /// requests.
    pub fn issue(&self, session_id: &str) -> String {
        let mut bytes = [0u8; CSRF_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();

        self.tokens.insert(
            session_id.to_string(),
            TokenRecord {
                token: token.clone(),
                expires_at_ms: self.clock.now_ms() + self.ttl_ms,
            },
        );

        token
    }

    /// Validate `presented` against the stored token for `session_id`.
    ///
    /// Fails closed on an absent or expired record; expired records are
    /// evicted here rather than waiting for the background sweep.
    pub fn validate(&self, session_id: &str, presented: &str) -> bool {
        let now = self.clock.now_ms();

        let expired = match self.tokens.get(session_id) {
            None => return false,
            Some(record) => {
                if now < record.expires_at_ms {
                    let matches: bool = record
                        .token
                        .as_bytes()
                        .ct_eq(presented.as_bytes())
                        .into();
                    return matches;
                }
                true
            }
        };

        // Ref dropped above; safe to remove now.
        if expired {
            self.tokens.remove(session_id);
        }
        false
    }

    /// Drop tokens past their expiry. Returns the number of evicted sessions.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.tokens.len();
        self.tokens.retain(|_, record| now < record.expires_at_ms);
        before.saturating_sub(self.tokens.len())
    }

    /// Number of sessions with a live token.
    pub fn tracked_sessions(&self) -> usize {
        self.tokens.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn manager_with_clock() -> (CsrfTokenManager, Arc<ManualClock>) {
        let clock = ManualClock::shared(1_000_000);
        let manager = CsrfTokenManager::new(Duration::from_secs(24 * 60 * 60), clock.clone());
        (manager, clock)
    }

    #[test]
    fn test_token_valid_immediately_after_issue() {
        let (manager, _clock) = manager_with_clock();

        let token = manager.issue("session-1");
        assert!(manager.validate("session-1", &token));
    }

    #[test]
    fn test_token_is_hex_of_expected_length() {
        let (manager, _clock) = manager_with_clock();

        let token = manager.issue("session-1");
        assert_eq!(token.len(), CSRF_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_differ_across_issues() {
        let (manager, _clock) = manager_with_clock();

        let a = manager.issue("session-1");
        let b = manager.issue("session-2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_token_rejected() {
        let (manager, _clock) = manager_with_clock();

        let token = manager.issue("session-1");
        assert!(!manager.validate("session-1", "not-the-token"));
        // a prefix of the real token is still wrong
        assert!(!manager.validate("session-1", &token[..32]));
    }

    #[test]
    fn test_unknown_session_rejected() {
        let (manager, _clock) = manager_with_clock();

        assert!(!manager.validate("never-seen", "anything"));
    }

    #[test]
    fn test_expired_token_rejected_and_evicted() {
        let (manager, clock) = manager_with_clock();

        let token = manager.issue("session-1");
        clock.advance(DAY_MS); // exactly at expiry: no longer valid
        assert!(!manager.validate("session-1", &token));
        assert_eq!(manager.tracked_sessions(), 0);
    }

    #[test]
    fn test_token_valid_just_before_expiry() {
        let (manager, clock) = manager_with_clock();

        let token = manager.issue("session-1");
        clock.advance(DAY_MS - 1);
        assert!(manager.validate("session-1", &token));
    }

    #[test]
    fn test_reissue_invalidates_previous_token() {
        let (manager, _clock) = manager_with_clock();

        let old = manager.issue("session-1");
        let new = manager.issue("session-1");

        assert!(!manager.validate("session-1", &old));
        assert!(manager.validate("session-1", &new));
    }

    #[test]
    fn test_evict_expired_sweeps_only_stale_sessions() {
        let (manager, clock) = manager_with_clock();

        manager.issue("old-session");
        clock.advance(DAY_MS - 1);
        manager.issue("fresh-session");
        clock.advance(2);

        let evicted = manager.evict_expired();
        assert_eq!(evicted, 1);
        assert_eq!(manager.tracked_sessions(), 1);
    }
}
