//! Fuzz testing for the input sanitizer and validators.
//!
//! These functions sit directly behind every form the storefront exposes,
//! so they must hold their contract on arbitrary input:
//!
//! - Never panic
//! - Always return a normalized value, boolean or violation list
//! - `sanitize_text` output never exceeds the length bound and never
//!   contains angle brackets
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the validation fuzz target
//! cargo +nightly fuzz run fuzz_validation
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use storegate::validation::{
    MAX_TEXT_LENGTH, sanitize_text, validate_email, validate_password, validate_person_name,
    validate_phone, validate_product_description, validate_product_title,
};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Sanitizer invariants hold on any input
        let sanitized = sanitize_text(s);
        assert!(sanitized.chars().count() <= MAX_TEXT_LENGTH);
        assert!(!sanitized.contains('<'));
        assert!(!sanitized.contains('>'));

        // Validators must not panic on any input
        let _ = validate_email(s);
        let _ = validate_phone(s);
        let _ = validate_person_name(s);
        let _ = validate_product_title(s);
        let _ = validate_product_description(s);

        // Password checks return a coherent violation list
        let check = validate_password(s);
        assert_eq!(check.is_valid(), check.violations.is_empty());
    }
});
