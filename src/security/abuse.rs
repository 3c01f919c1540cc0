//! Signature-based abuse detection for inbound requests.
//!
//! A coarse, allow-by-default filter in front of page rendering: a fixed set
//! of regex signatures covering path traversal, script injection, SQL
//! injection and code-execution markers is scanned over the raw URL and the
//! percent-decoded query string. Separately, requests with an automated-agent
//! user agent are kept out of admin territory (pages and admin API alike).
//!
//! Not a WAF. Anything this misses is the application's problem to handle;
//! anything it matches is blocked unconditionally with a generic 403 so the
//! matched signature is never leaked to the caller.

use regex::Regex;

use crate::error::{AppError, AppResult};

/// Outcome of scanning one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVerdict {
    /// No signature matched; request may proceed.
    Clean,
    /// A signature matched the URL or query string; the label names the
    /// signature category for logging, never for the client.
    Signature(&'static str),
    /// An automated agent targeted an admin path.
    BotOnAdmin,
}

impl ScanVerdict {
    pub fn blocked(&self) -> bool {
        !matches!(self, ScanVerdict::Clean)
    }

    /// Logging label for the block reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ScanVerdict::Clean => "clean",
            ScanVerdict::Signature(label) => label,
            ScanVerdict::BotOnAdmin => "bot_on_admin",
        }
    }
}

/// Compiled signature and bot-agent patterns.
pub struct AbuseDetector {
    signatures: Vec<(Regex, &'static str)>,
    bot_pattern: Regex,
}

impl AbuseDetector {
    /// Compile the fixed signature set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a pattern fails to compile; this is
    /// a startup-time failure, not a per-request one.
    pub fn new() -> AppResult<Self> {
        let patterns: [(&str, &'static str); 5] = [
            (r"\.\./", "path_traversal"),
            (r"(?i)<script", "script_injection"),
            (r"(?i)union\s+select", "sql_injection"),
            (r"(?i)exec\s*\(", "code_execution"),
            (r"(?i)eval\s*\(", "code_execution"),
        ];

        let mut signatures = Vec::with_capacity(patterns.len());
        for (pattern, label) in patterns {
            let regex = Regex::new(pattern).map_err(|e| {
                AppError::ConfigError(format!("Invalid abuse signature {pattern:?}: {e}"))
            })?;
            signatures.push((regex, label));
        }

        let bot_pattern = Regex::new(r"(?i)bot|crawler|spider|scraper")
            .map_err(|e| AppError::ConfigError(format!("Invalid bot pattern: {e}")))?;

        Ok(Self {
            signatures,
            bot_pattern,
        })
    }

    /// Scan one request.
    ///
    /// `full_url` is the raw request URI; `query` is the raw query string
    /// (percent-decoded internally before matching). The bot rule only fires
    /// when `targets_admin` is set, but a signature match blocks regardless
    /// of route.
    pub fn scan(
        &self,
        full_url: &str,
        query: &str,
        user_agent: &str,
        targets_admin: bool,
    ) -> ScanVerdict {
        let decoded_query = decode_query(query);

        for (regex, label) in &self.signatures {
            if regex.is_match(full_url) || regex.is_match(&decoded_query) {
                return ScanVerdict::Signature(label);
            }
        }

        if targets_admin && self.is_bot(user_agent) {
            return ScanVerdict::BotOnAdmin;
        }

        ScanVerdict::Clean
    }

    /// Whether the user agent looks like an automated client.
    pub fn is_bot(&self, user_agent: &str) -> bool {
        self.bot_pattern.is_match(user_agent)
    }
}

/// Percent-decode a query string into `key=value&...` form for matching.
///
/// Attackers routinely hide signatures behind percent-encoding; matching the
/// decoded form catches `union%20select` as well as the literal spelling.
fn decode_query(query: &str) -> String {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| {
            if value.is_empty() {
                key.into_owned()
            } else {
                format!("{key}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn detector() -> AbuseDetector {
        AbuseDetector::new().unwrap()
    }

    #[test]
    fn test_clean_request_passes() {
        let verdict = detector().scan("/products?page=2", "page=2", "Mozilla/5.0", false);
        assert_eq!(verdict, ScanVerdict::Clean);
        assert!(!verdict.blocked());
    }

    #[test]
    fn test_path_traversal_blocked() {
        let verdict = detector().scan("/files?name=../../etc/passwd", "name=../../etc/passwd", "", false);
        assert_eq!(verdict, ScanVerdict::Signature("path_traversal"));
    }

    #[test]
    fn test_sql_injection_blocked_regardless_of_route() {
        let verdict = detector().scan(
            "/products?q=1 union select password from users",
            "q=1 union select password from users",
            "Mozilla/5.0",
            false,
        );
        assert_eq!(verdict, ScanVerdict::Signature("sql_injection"));
    }

    #[test]
    fn test_sql_injection_detected_when_percent_encoded() {
        let verdict = detector().scan(
            "/products?q=1%20union%20select%202",
            "q=1%20union%20select%202",
            "",
            false,
        );
        assert_eq!(verdict, ScanVerdict::Signature("sql_injection"));
    }

    #[test]
    fn test_script_injection_blocked_case_insensitive() {
        let verdict = detector().scan("/search?q=<SCRIPT>alert(1)</SCRIPT>", "q=<SCRIPT>", "", false);
        assert_eq!(verdict, ScanVerdict::Signature("script_injection"));
    }

    #[test]
    fn test_code_execution_markers_blocked() {
        let detector = detector();
        assert_eq!(
            detector.scan("/run?cmd=exec(ls)", "cmd=exec(ls)", "", false),
            ScanVerdict::Signature("code_execution")
        );
        assert_eq!(
            detector.scan("/run?cmd=eval (payload)", "cmd=eval (payload)", "", false),
            ScanVerdict::Signature("code_execution")
        );
    }

    #[test]
    fn test_bot_blocked_only_on_admin_targets() {
        let detector = detector();

        let on_admin = detector.scan("/admin/dashboard", "", "Googlebot/2.1", true);
        assert_eq!(on_admin, ScanVerdict::BotOnAdmin);

        let on_public = detector.scan("/products", "", "Googlebot/2.1", false);
        assert_eq!(on_public, ScanVerdict::Clean);
    }

    #[test]
    fn test_bot_patterns_case_insensitive() {
        let detector = detector();

        assert!(detector.is_bot("SneakyCrawler/1.0"));
        assert!(detector.is_bot("spider"));
        assert!(detector.is_bot("web-SCRAPER"));
        assert!(!detector.is_bot("Mozilla/5.0 (X11; Linux x86_64)"));
    }

    #[test]
    fn test_signature_outranks_bot_rule() {
        // a bot sending an injection gets the signature verdict, which is
        // what ends up in the audit log
        let verdict = detector().scan(
            "/admin/search?q=union select 1",
            "q=union select 1",
            "Googlebot/2.1",
            true,
        );
        assert_eq!(verdict, ScanVerdict::Signature("sql_injection"));
    }

    #[test]
    fn test_decode_query_preserves_plain_pairs() {
        assert_eq!(decode_query("a=1&b=2"), "a=1&b=2");
        assert_eq!(decode_query(""), "");
    }
}
