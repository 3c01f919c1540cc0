//! Shared application state for Axum handlers.
//!
//! One service object holds every stateful security component, constructed
//! once at process start and handed to the gate and the handlers by
//! reference. Nothing lives in module-level globals, which keeps the
//! components testable with an injected clock.
//!
//! # Thread Safety
//!
//! All components are wrapped in `Arc`; the counter and token maps use
//! per-key locking internally, so the state clones cheaply into every
//! request handler.
//!
//! # Structured Concurrency
//!
//! The housekeeping sweep runs under a `tokio_util::task::TaskTracker` with
//! a `CancellationToken` for orderly shutdown. Call `shutdown()` before
//! process exit.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::AppResult;
use crate::metrics;
use crate::models::session::DemoAccounts;
use crate::security::abuse::AbuseDetector;
use crate::security::csrf::CsrfTokenManager;
use crate::security::rate_limit::FixedWindowLimiter;

/// Shared application state.
///
/// Cloned for each request handler; all internal data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Fixed-window rate limiter consulted by the gate
    pub limiter: Arc<FixedWindowLimiter>,
    /// CSRF token manager consulted by state-changing handlers
    pub csrf: Arc<CsrfTokenManager>,
    /// Compiled abuse signatures
    pub abuse: Arc<AbuseDetector>,
    /// The demo account directory
    pub accounts: Arc<DemoAccounts>,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Tracks spawned background tasks for graceful shutdown
    task_tracker: TaskTracker,
    /// Cancellation token for signaling background tasks to stop
    cancellation_token: CancellationToken,
}

impl AppState {
    /// Create application state on the system clock.
    ///
    /// # Errors
    ///
    /// Fails if the abuse signature set does not compile, which is a
    /// startup-time configuration fault.
    pub fn new(config: Config) -> AppResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create application state with an injected clock (used by tests).
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let abuse = Arc::new(AbuseDetector::new()?);
        let limiter = Arc::new(FixedWindowLimiter::new(
            config.rate_policies,
            clock.clone(),
        ));
        let csrf = Arc::new(CsrfTokenManager::new(config.csrf_ttl, clock));
        let accounts = Arc::new(DemoAccounts::from_config(&config));

        Ok(Self {
            config: Arc::new(config),
            limiter,
            csrf,
            abuse,
            accounts,
            started_at: Instant::now(),
            task_tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Spawn the housekeeping sweep.
    ///
    /// Separate from construction so state can be built outside a runtime;
    /// call this once from `main` after the runtime is up.
    ///
    /// The sweep periodically evicts expired rate-limit records and CSRF
    /// tokens. Without it, identities that are never seen again would hold
    /// their map entries for the life of the process.
    pub fn spawn_housekeeping(&self) {
        let limiter = self.limiter.clone();
        let csrf = self.csrf.clone();
        let sweep_interval = self.config.sweep_interval;
        let cancel = self.cancellation_token.clone();

        self.task_tracker.spawn(async move {
            let mut ticker = interval(sweep_interval);
            ticker.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    biased; // Check cancellation first

                    _ = cancel.cancelled() => {
                        debug!("Housekeeping task received cancellation signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted_counters = limiter.evict_expired();
                        let evicted_tokens = csrf.evict_expired();
                        metrics::set_rate_limit_tracked_keys(limiter.tracked_keys());

                        if evicted_counters > 0 || evicted_tokens > 0 {
                            debug!(
                                evicted_counters,
                                evicted_tokens,
                                "Swept expired security state"
                            );
                        }
                    }
                }
            }

            debug!("Housekeeping task shutting down");
        });
    }

    /// Gracefully shutdown all background tasks.
    ///
    /// 1. Signals tasks to stop via the cancellation token
    /// 2. Closes the tracker (prevents new tasks)
    /// 3. Waits for all tasks to complete
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown of background tasks");

        self.cancellation_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("All background tasks have completed");
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::security::rate_limit::RouteClass;

    #[test]
    fn test_state_construction_without_runtime() {
        // No housekeeping spawn here, so no runtime is needed.
        let state = AppState::new(Config::default()).unwrap();
        assert_eq!(state.limiter.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_housekeeping_sweeps_expired_state() {
        let clock = ManualClock::shared(1_000_000);
        let config = Config {
            sweep_interval: std::time::Duration::from_millis(10),
            ..Config::default()
        };
        let state = AppState::with_clock(config, clock.clone()).unwrap();

        state.limiter.check("1.2.3.4", RouteClass::Api);
        state.csrf.issue("session-1");
        assert_eq!(state.limiter.tracked_keys(), 1);
        assert_eq!(state.csrf.tracked_sessions(), 1);

        // Move time past both the api window and the csrf ttl, then let the
        // sweep run.
        clock.advance(25 * 60 * 60 * 1000);
        state.spawn_housekeeping();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(state.limiter.tracked_keys(), 0);
        assert_eq!(state.csrf.tracked_sessions(), 0);

        state.shutdown().await;
    }
}
