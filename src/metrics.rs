//! Prometheus metrics for the request gate.
//!
//! Metrics are exposed via a dedicated HTTP listener (default port: 9090).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `storegate_gate_requests_total` - Gate decisions (label: outcome)
//! - `storegate_rate_limit_denials_total` - Denied checks (label: class)
//! - `storegate_csrf_failures_total` - Rejected CSRF validations
//! - `storegate_abuse_blocked_total` - Blocked requests (label: reason)
//! - `storegate_security_events_total` - Emitted audit events (label: kind)
//!
//! ## Gauges
//! - `storegate_rate_limit_tracked_keys` - Live counter keys between sweeps

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const GATE_REQUESTS_TOTAL: &str = "storegate_gate_requests_total";
    pub const RATE_LIMIT_DENIALS_TOTAL: &str = "storegate_rate_limit_denials_total";
    pub const CSRF_FAILURES_TOTAL: &str = "storegate_csrf_failures_total";
    pub const ABUSE_BLOCKED_TOTAL: &str = "storegate_abuse_blocked_total";
    pub const SECURITY_EVENTS_TOTAL: &str = "storegate_security_events_total";
    pub const RATE_LIMIT_TRACKED_KEYS: &str = "storegate_rate_limit_tracked_keys";
}

/// Initialize the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns an error message if the exporter cannot be installed.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::GATE_REQUESTS_TOTAL,
        "Requests processed by the gate, by terminal outcome"
    );
    describe_counter!(
        names::RATE_LIMIT_DENIALS_TOTAL,
        "Rate-limit denials, by route class"
    );
    describe_counter!(
        names::CSRF_FAILURES_TOTAL,
        "CSRF validations that failed closed"
    );
    describe_counter!(
        names::ABUSE_BLOCKED_TOTAL,
        "Requests blocked by the abuse detector, by reason"
    );
    describe_counter!(
        names::SECURITY_EVENTS_TOTAL,
        "Security audit events emitted, by kind"
    );

    describe_gauge!(
        names::RATE_LIMIT_TRACKED_KEYS,
        "Live rate-limit counter keys between housekeeping sweeps"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a gate decision (allowed, denied_rate_limit, denied_auth, denied_abuse).
pub fn record_gate_decision(outcome: &str) {
    counter!(names::GATE_REQUESTS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record a rate-limit denial for a route class.
pub fn record_rate_limit_denial(class: &str) {
    counter!(names::RATE_LIMIT_DENIALS_TOTAL, "class" => class.to_string()).increment(1);
}

/// Record a failed CSRF validation.
pub fn record_csrf_failure() {
    counter!(names::CSRF_FAILURES_TOTAL).increment(1);
}

/// Record an abuse block, by signature category or bot rule.
pub fn record_abuse_block(reason: &str) {
    counter!(names::ABUSE_BLOCKED_TOTAL, "reason" => reason.to_string()).increment(1);
}

/// Record an emitted security event.
pub fn record_security_event(kind: &str) {
    counter!(names::SECURITY_EVENTS_TOTAL, "kind" => kind.to_string()).increment(1);
}

/// Update the live-key gauge after a sweep.
pub fn set_rate_limit_tracked_keys(count: usize) {
    gauge!(names::RATE_LIMIT_TRACKED_KEYS).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These verify the recording functions don't panic without an installed
    // exporter; full metrics testing needs a Prometheus scraper.

    #[test]
    fn test_record_gate_decision() {
        record_gate_decision("allowed");
        record_gate_decision("denied_rate_limit");
    }

    #[test]
    fn test_record_denials() {
        record_rate_limit_denial("login");
        record_csrf_failure();
        record_abuse_block("sql_injection");
        record_security_event("rate_limit");
    }

    #[test]
    fn test_set_tracked_keys() {
        set_rate_limit_tracked_keys(0);
        set_rate_limit_tracked_keys(42);
    }
}
