//! Client identity derivation for rate limiting and audit events.
//!
//! The identity is the string that keys rate-limit counters and abuse state
//! for a caller. It comes from proxy-set headers, in priority order:
//!
//! 1. `X-Forwarded-For` (first entry of the comma-separated list)
//! 2. `X-Real-IP`
//! 3. The shared `"unknown"` sentinel
//!
//! # Security Warning: IP Spoofing Risk
//!
//! These headers are client-controlled unless a trusted reverse proxy
//! overwrites them. Deploy this service behind a proxy that sets (not
//! appends) the client IP headers and block direct internet access;
//! otherwise callers can rotate identities and bypass per-identity quotas.
//!
//! All requests without identifiable IPs share the `"unknown"` key, so
//! headerless traffic is still collectively rate-limited. Monitor for high
//! "unknown" volume in production logs.

use std::borrow::Cow;

use axum::http::HeaderMap;

/// Fallback identity when no client IP can be determined.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Derive the client identity from request headers.
///
/// Returns a borrowed `Cow` for the common "unknown" fallback (no
/// allocation) and an owned value when a header yields an IP. Use
/// `.into_owned()` when the identity must outlive the request.
#[inline]
pub fn client_identity(headers: &HeaderMap) -> Cow<'static, str> {
    // X-Forwarded-For: "client, proxy1, proxy2" - the first entry is the
    // original client
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
    {
        return Cow::Owned(first.trim().to_string());
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
    {
        return Cow::Owned(value.trim().to_string());
    }

    Cow::Borrowed(UNKNOWN_IDENTITY)
}

/// The request's user agent, if it sent a well-formed one.
#[inline]
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
