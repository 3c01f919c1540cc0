//! Baseline security response headers.
//!
//! Attached to every response the service produces, including denials, so a
//! blocked request never receives a weaker header set than an allowed one.
//!
//! The content-security-policy keeps the payment-widget origins (Stripe,
//! PayPal) that the storefront embeds; everything else is restricted to
//! same-origin.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// The restrictive CSP applied to every response.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     script-src 'self' 'unsafe-inline' https://js.stripe.com https://www.paypal.com; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data: https:; \
     connect-src 'self' https://api.stripe.com https://www.paypal.com; \
     frame-src https://js.stripe.com https://www.paypal.com;";

/// The full baseline header set.
const SECURITY_HEADERS: [(&str, &str); 7] = [
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=()",
    ),
];

/// Attach the baseline security headers, overwriting any existing values.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_headers_attached() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers);

        assert_eq!(headers.len(), SECURITY_HEADERS.len());
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert!(headers.contains_key("content-security-policy"));
        assert!(headers.contains_key("strict-transport-security"));
        assert!(headers.contains_key("permissions-policy"));
    }

    #[test]
    fn test_existing_values_overwritten() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("SAMEORIGIN"),
        );

        apply_security_headers(&mut headers);
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    }

    #[test]
    fn test_csp_allows_payment_widgets_only() {
        assert!(CONTENT_SECURITY_POLICY.contains("https://js.stripe.com"));
        assert!(CONTENT_SECURITY_POLICY.contains("https://www.paypal.com"));
        assert!(CONTENT_SECURITY_POLICY.starts_with("default-src 'self'"));
    }
}
