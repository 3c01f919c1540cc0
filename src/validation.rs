//! Input sanitization and validation.
//!
//! Pure functions, no side effects, never panic: every function returns a
//! normalized value, a boolean, or a violation list, and callers decide how
//! to surface failures. Registration, login, checkout and admin forms all go
//! through these same functions so the rules cannot diverge between callers.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length (in characters) of any sanitized free-text field.
///
/// Bounds storage and log size for text that ends up persisted or logged.
pub const MAX_TEXT_LENGTH: usize = 1000;

/// Maximum email length per RFC 5321.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Symbol class a password must draw from at least once.
const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Maximum accepted product price.
pub const MAX_PRICE: u32 = 100_000;

#[allow(clippy::expect_used)]
static JS_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("static pattern compiles"));

#[allow(clippy::expect_used)]
static EVENT_HANDLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+\s*=").expect("static pattern compiles"));

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static pattern compiles"));

#[allow(clippy::expect_used)]
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+90|0)?5\d{9}$").expect("static pattern compiles"));

#[allow(clippy::expect_used)]
static PERSON_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-ZçÇğĞıİöÖşŞüÜ\s]+$").expect("static pattern compiles")
});

/// Normalize free-form text for storage and display.
///
/// Strips angle brackets, `javascript:` scheme prefixes and inline event
/// handler patterns (`onclick=` and friends), trims surrounding whitespace
/// and truncates to [`MAX_TEXT_LENGTH`] characters.
pub fn sanitize_text(input: &str) -> String {
    let without_angles: String = input.chars().filter(|c| *c != '<' && *c != '>').collect();
    let without_scheme = JS_SCHEME_RE.replace_all(&without_angles, "");
    let without_handlers = EVENT_HANDLER_RE.replace_all(&without_scheme, "");

    without_handlers.trim().chars().take(MAX_TEXT_LENGTH).collect()
}

/// Validate an email address: `local@domain.tld` shape, bounded length.
///
/// Deliberately RFC-light; the shape check catches typos, not every corner
/// of RFC 5322.
pub fn validate_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_RE.is_match(email)
}

/// A password rule that was not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    TooShort,
    TooLong,
    MissingLowercase,
    MissingUppercase,
    MissingDigit,
    MissingSymbol,
}

impl std::fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            PasswordRule::TooShort => "password must be at least 8 characters",
            PasswordRule::TooLong => "password must be at most 128 characters",
            PasswordRule::MissingLowercase => "password must contain a lowercase letter",
            PasswordRule::MissingUppercase => "password must contain an uppercase letter",
            PasswordRule::MissingDigit => "password must contain a digit",
            PasswordRule::MissingSymbol => "password must contain a symbol",
        };
        f.write_str(message)
    }
}

/// Result of a password strength check: valid when no rules were violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordCheck {
    pub violations: Vec<PasswordRule>,
}

impl PasswordCheck {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// User-facing messages, one per unmet rule.
    pub fn violation_messages(&self) -> Vec<String> {
        self.violations.iter().map(|rule| rule.to_string()).collect()
    }
}

/// Check password strength, reporting every unmet rule.
pub fn validate_password(password: &str) -> PasswordCheck {
    let mut violations = Vec::new();
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        violations.push(PasswordRule::TooShort);
    }
    if length > MAX_PASSWORD_LENGTH {
        violations.push(PasswordRule::TooLong);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push(PasswordRule::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push(PasswordRule::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PasswordRule::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        violations.push(PasswordRule::MissingSymbol);
    }

    PasswordCheck { violations }
}

/// Validate a Turkish mobile number.
///
/// Internal whitespace is stripped before matching, so `0555 123 45 67` and
/// `05551234567` are the same number. Accepted shapes: optional `+90` or `0`
/// prefix, then `5` and nine digits.
pub fn validate_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}

/// Validate a person's name after sanitization: 2-50 characters, letters
/// (Turkish alphabet included) and spaces only.
pub fn validate_person_name(name: &str) -> bool {
    let sanitized = sanitize_text(name);
    let length = sanitized.chars().count();
    (2..=50).contains(&length) && PERSON_NAME_RE.is_match(&sanitized)
}

/// Validate a product title after sanitization: 3-200 characters.
pub fn validate_product_title(title: &str) -> bool {
    let length = sanitize_text(title).chars().count();
    (3..=200).contains(&length)
}

/// Validate a product description after sanitization: 10-2000 characters.
pub fn validate_product_description(description: &str) -> bool {
    let length = sanitize_text(description).chars().count();
    (10..=2000).contains(&length)
}

/// Validate a product price: positive and at most [`MAX_PRICE`].
pub fn validate_price(price: Decimal) -> bool {
    price > Decimal::ZERO && price <= Decimal::from(MAX_PRICE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // ==========================================================================
    // sanitize_text
    // ==========================================================================

    #[test]
    fn test_sanitize_strips_angle_brackets() {
        assert_eq!(sanitize_text("<script>alert(1)</script>"), "scriptalert(1)/script");
        assert_eq!(sanitize_text("a < b > c"), "a  b  c");
    }

    #[test]
    fn test_sanitize_strips_javascript_scheme() {
        assert_eq!(sanitize_text("javascript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_text("JavaScript:alert(1)"), "alert(1)");
    }

    #[test]
    fn test_sanitize_strips_event_handlers() {
        assert_eq!(sanitize_text("img onerror=alert(1)"), "img alert(1)");
        assert_eq!(sanitize_text("onClick = doEvil()"), "doEvil()");
    }

    #[test]
    fn test_sanitize_trims_whitespace() {
        assert_eq!(sanitize_text("  hello world  "), "hello world");
    }

    #[test]
    fn test_sanitize_truncates_to_limit() {
        let long = "a".repeat(2 * MAX_TEXT_LENGTH);
        assert_eq!(sanitize_text(&long).chars().count(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_sanitize_plain_text_untouched() {
        assert_eq!(sanitize_text("Kadife Ceket, M beden"), "Kadife Ceket, M beden");
    }

    // ==========================================================================
    // validate_email
    // ==========================================================================

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!validate_email(""));
        assert!(!validate_email("no-at-sign"));
        assert!(!validate_email("user@nodot"));
        assert!(!validate_email("user @example.com"));
        assert!(!validate_email("user@exa mple.com"));
    }

    #[test]
    fn test_email_length_bound() {
        let local = "a".repeat(250);
        let long_email = format!("{local}@b.co");
        assert!(long_email.len() > MAX_EMAIL_LENGTH);
        assert!(!validate_email(&long_email));
    }

    // ==========================================================================
    // validate_password
    // ==========================================================================

    #[test]
    fn test_weak_password_reports_all_rules() {
        let check = validate_password("abc");
        assert!(!check.is_valid());
        // too short + missing uppercase, digit, symbol
        assert_eq!(check.violations.len(), 4);
        assert!(check.violations.contains(&PasswordRule::TooShort));
        assert!(check.violations.contains(&PasswordRule::MissingUppercase));
        assert!(check.violations.contains(&PasswordRule::MissingDigit));
        assert!(check.violations.contains(&PasswordRule::MissingSymbol));
    }

    #[test]
    fn test_strong_password_valid() {
        let check = validate_password("Abcdef1!");
        assert!(check.is_valid());
        assert!(check.violations.is_empty());
    }

    #[test]
    fn test_overlong_password_rejected() {
        let long = format!("Aa1!{}", "x".repeat(130));
        let check = validate_password(&long);
        assert!(check.violations.contains(&PasswordRule::TooLong));
    }

    #[test]
    fn test_violation_messages_are_user_facing() {
        let messages = validate_password("abc").violation_messages();
        assert!(messages.iter().any(|m| m.contains("at least 8")));
    }

    // ==========================================================================
    // validate_phone
    // ==========================================================================

    #[test]
    fn test_valid_phone_shapes() {
        assert!(validate_phone("+905551234567"));
        assert!(validate_phone("05551234567"));
        assert!(validate_phone("5551234567"));
        assert!(validate_phone("0555 123 45 67"));
    }

    #[test]
    fn test_invalid_phones() {
        assert!(!validate_phone(""));
        assert!(!validate_phone("1234567890")); // does not start with 5
        assert!(!validate_phone("555123456")); // too few digits
        assert!(!validate_phone("+15551234567")); // wrong country code
        assert!(!validate_phone("555-123-45-67")); // dashes are not stripped
    }

    // ==========================================================================
    // Supplementary field validators
    // ==========================================================================

    #[test]
    fn test_person_names() {
        assert!(validate_person_name("Ayşe Yılmaz"));
        assert!(validate_person_name("John Smith"));
        assert!(!validate_person_name("A")); // too short
        assert!(!validate_person_name("Robert); DROP TABLE--"));
        assert!(!validate_person_name(&"x".repeat(60)));
    }

    #[test]
    fn test_product_title_bounds() {
        assert!(validate_product_title("Kadife Ceket"));
        assert!(!validate_product_title("ab"));
        assert!(!validate_product_title(&"t".repeat(201)));
    }

    #[test]
    fn test_product_description_bounds() {
        assert!(validate_product_description("Soft velvet jacket, M size."));
        assert!(!validate_product_description("too short"));
        assert!(!validate_product_description(&"d".repeat(2001)));
    }

    #[test]
    fn test_price_bounds() {
        assert!(validate_price(Decimal::new(1999, 2))); // 19.99
        assert!(validate_price(Decimal::from(100_000)));
        assert!(!validate_price(Decimal::ZERO));
        assert!(!validate_price(Decimal::from(-5)));
        assert!(!validate_price(Decimal::from(100_001)));
    }
}
