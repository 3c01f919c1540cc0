//! Fixed-window request counting per (route class, client identity).
//!
//! # Algorithm
//!
//! Each key owns a single counter and a window start timestamp. On every
//! check:
//!
//! - No record, or the window has elapsed: reset to `count = 1`, allow.
//! - `count < max`: increment, allow.
//! - `count >= max`: deny without incrementing; the reset instant stays at
//!   `window_start + window`, so repeated denials report a stable retry time.
//!
//! A fixed window admits up to `2 x max` requests in a short span straddling
//! a window boundary. That is a known property of the algorithm and is kept
//! deliberately: smoothing it out (sliding window, token bucket) would change
//! the observable quota behavior.
//!
//! # Concurrency
//!
//! Counters live in a [`DashMap`]; the entry API holds the shard lock for the
//! whole read-modify-write, so concurrent checks for the same key can never
//! push a counter past its ceiling.
//!
//! # Memory
//!
//! Records are created lazily and never removed on the hot path. The
//! background sweep calls [`FixedWindowLimiter::evict_expired`] periodically
//! so identities that stop sending traffic do not accumulate forever.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::clock::Clock;
use crate::config::Config;

/// A named category of endpoints sharing one rate-limit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Login page submissions
    Login,
    /// Registration page submissions
    Register,
    /// Checkout submissions
    Checkout,
    /// Everything under the generic API prefix
    Api,
}

impl RouteClass {
    /// Stable label for logging and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Login => "login",
            RouteClass::Register => "register",
            RouteClass::Checkout => "checkout",
            RouteClass::Api => "api",
        }
    }

    /// Classify a request path against the configured route surface.
    ///
    /// The API prefix is matched first (so `/api/...` is always the `api`
    /// class), then the sensitive page paths by exact match. Paths outside
    /// the table are not rate-limited at all.
    pub fn classify(path: &str, config: &Config) -> Option<Self> {
        if config.is_api_path(path) {
            return Some(RouteClass::Api);
        }
        if path == config.login_path {
            return Some(RouteClass::Login);
        }
        if path == config.register_path {
            return Some(RouteClass::Register);
        }
        if path == config.checkout_path {
            return Some(RouteClass::Checkout);
        }
        None
    }
}

impl std::fmt::Display for RouteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quota for one route class: `max_requests` per `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// The full per-class quota table.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicies {
    pub login: RateLimitPolicy,
    pub register: RateLimitPolicy,
    pub api: RateLimitPolicy,
    pub checkout: RateLimitPolicy,
}

impl RatePolicies {
    pub fn for_class(&self, class: RouteClass) -> RateLimitPolicy {
        match class {
            RouteClass::Login => self.login,
            RouteClass::Register => self.register,
            RouteClass::Api => self.api,
            RouteClass::Checkout => self.checkout,
        }
    }
}

impl Default for RatePolicies {
    fn default() -> Self {
        Self {
            login: RateLimitPolicy::new(5, 15 * 60),
            register: RateLimitPolicy::new(3, 60 * 60),
            api: RateLimitPolicy::new(100, 15 * 60),
            checkout: RateLimitPolicy::new(10, 60 * 60),
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Instant (epoch ms) at which the window resets.
    pub reset_at_ms: i64,
    /// Whole seconds until the window resets; 0 on allowed decisions.
    pub retry_after_secs: u64,
}

/// One counter record; created lazily on first use of a key.
#[derive(Debug)]
struct WindowRecord {
    count: u32,
    window_start_ms: i64,
}

/// Fixed-window request counter keyed by (route class, client identity).
pub struct FixedWindowLimiter {
    records: DashMap<(RouteClass, String), WindowRecord>,
    policies: RatePolicies,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(policies: RatePolicies, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            policies,
            clock,
        }
    }

    /// Check and count one request for `identity` under `class`.
    ///
    /// Denial is not an error; callers translate an `allowed: false` decision
    /// into a 429 or a cooldown redirect using `retry_after_secs`.
    pub fn check(&self, identity: &str, class: RouteClass) -> RateLimitDecision {
        let policy = self.policies.for_class(class);
        let now = self.clock.now_ms();
        let window_ms = policy.window_ms();

        // The entry guard holds the key's shard lock for the whole
        // read-modify-write, which is what keeps concurrent checks from
        // pushing past the ceiling.
        let mut record = self
            .records
            .entry((class, identity.to_string()))
            .or_insert_with(|| WindowRecord {
                count: 0,
                window_start_ms: now,
            });

        if now - record.window_start_ms > window_ms {
            // Window elapsed: this request starts a fresh one.
            record.count = 0;
            record.window_start_ms = now;
        }

        let reset_at_ms = record.window_start_ms + window_ms;
        if record.count < policy.max_requests {
            record.count += 1;
            return RateLimitDecision {
                allowed: true,
                remaining: policy.max_requests - record.count,
                reset_at_ms,
                retry_after_secs: 0,
            };
        }

        // At the ceiling: deny without incrementing further.
        RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at_ms,
            retry_after_secs: retry_after_secs(reset_at_ms, now),
        }
    }

    /// Drop records whose window has fully elapsed.
    ///
    /// Returns the number of evicted keys.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.records.len();
        self.records.retain(|(class, _), record| {
            now - record.window_start_ms <= self.policies.for_class(*class).window_ms()
        });
        before.saturating_sub(self.records.len())
    }

    /// Number of live counter keys, for the housekeeping gauge.
    pub fn tracked_keys(&self) -> usize {
        self.records.len()
    }
}

/// Whole seconds until `reset_at_ms`, rounded up, at least 1.
fn retry_after_secs(reset_at_ms: i64, now_ms: i64) -> u64 {
    let delta_ms = reset_at_ms.saturating_sub(now_ms).max(0) as u64;
    delta_ms.div_ceil(1000).max(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter_with_clock() -> (FixedWindowLimiter, Arc<ManualClock>) {
        let clock = ManualClock::shared(1_000_000);
        let limiter = FixedWindowLimiter::new(RatePolicies::default(), clock.clone());
        (limiter, clock)
    }

    #[test]
    fn test_quota_exhaustion_and_remaining() {
        let (limiter, _clock) = limiter_with_clock();

        // login allows 5 per window; the 5th allowed check reports remaining 0
        for expected_remaining in (0..5).rev() {
            let decision = limiter.check("1.2.3.4", RouteClass::Login);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let denied = limiter.check("1.2.3.4", RouteClass::Login);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[test]
    fn test_denial_does_not_advance_reset() {
        let (limiter, clock) = limiter_with_clock();

        for _ in 0..5 {
            limiter.check("1.2.3.4", RouteClass::Login);
        }

        let first_denial = limiter.check("1.2.3.4", RouteClass::Login);
        clock.advance(60_000);
        let second_denial = limiter.check("1.2.3.4", RouteClass::Login);

        assert!(!first_denial.allowed);
        assert!(!second_denial.allowed);
        // reset stays anchored at window_start + window
        assert_eq!(first_denial.reset_at_ms, second_denial.reset_at_ms);
        assert!(second_denial.retry_after_secs < first_denial.retry_after_secs);
    }

    #[test]
    fn test_window_elapse_resets_counter() {
        let (limiter, clock) = limiter_with_clock();
        let window_ms = RatePolicies::default().login.window_ms();

        for _ in 0..5 {
            limiter.check("1.2.3.4", RouteClass::Login);
        }
        assert!(!limiter.check("1.2.3.4", RouteClass::Login).allowed);

        // denied at t, allowed at t + window + epsilon
        clock.advance(window_ms + 1);
        let decision = limiter.check("1.2.3.4", RouteClass::Login);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[test]
    fn test_identities_are_independent() {
        let (limiter, _clock) = limiter_with_clock();

        for _ in 0..5 {
            limiter.check("1.2.3.4", RouteClass::Login);
        }
        assert!(!limiter.check("1.2.3.4", RouteClass::Login).allowed);

        // a different identity still has its full quota
        let other = limiter.check("5.6.7.8", RouteClass::Login);
        assert!(other.allowed);
        assert_eq!(other.remaining, 4);
    }

    #[test]
    fn test_classes_are_independent() {
        let (limiter, _clock) = limiter_with_clock();

        for _ in 0..5 {
            limiter.check("1.2.3.4", RouteClass::Login);
        }
        assert!(!limiter.check("1.2.3.4", RouteClass::Login).allowed);

        // the same identity is unaffected on another class
        assert!(limiter.check("1.2.3.4", RouteClass::Api).allowed);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let (limiter, clock) = limiter_with_clock();

        for _ in 0..5 {
            limiter.check("1.2.3.4", RouteClass::Login);
        }
        clock.advance(1_500);
        let denied = limiter.check("1.2.3.4", RouteClass::Login);

        let window_secs = RatePolicies::default().login.window.as_secs();
        // 1.5s into the window: 898.5s left, reported as 899
        assert_eq!(denied.retry_after_secs, window_secs - 1);
    }

    #[test]
    fn test_evict_expired_drops_stale_keys() {
        let (limiter, clock) = limiter_with_clock();

        limiter.check("1.2.3.4", RouteClass::Login);
        limiter.check("5.6.7.8", RouteClass::Api);
        assert_eq!(limiter.tracked_keys(), 2);

        // past the login window but within the api window? both 15min; go past both
        clock.advance(RatePolicies::default().api.window_ms() + 1);
        let evicted = limiter.evict_expired();
        assert_eq!(evicted, 2);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_classify_api_prefix_wins() {
        let config = Config::default();

        assert_eq!(
            RouteClass::classify("/api/session", &config),
            Some(RouteClass::Api)
        );
        assert_eq!(
            RouteClass::classify("/api/admin/stats", &config),
            Some(RouteClass::Api)
        );
    }

    #[test]
    fn test_classify_sensitive_pages_exact() {
        let config = Config::default();

        assert_eq!(
            RouteClass::classify("/login", &config),
            Some(RouteClass::Login)
        );
        assert_eq!(
            RouteClass::classify("/register", &config),
            Some(RouteClass::Register)
        );
        assert_eq!(
            RouteClass::classify("/checkout", &config),
            Some(RouteClass::Checkout)
        );
        // exact match only: subpaths are not classified
        assert_eq!(RouteClass::classify("/login/help", &config), None);
    }

    #[test]
    fn test_classify_unlisted_paths_unlimited() {
        let config = Config::default();

        assert_eq!(RouteClass::classify("/", &config), None);
        assert_eq!(RouteClass::classify("/products/42", &config), None);
    }
}
