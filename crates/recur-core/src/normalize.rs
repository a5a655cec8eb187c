//! Merchant name normalization
//!
//! Bank descriptions for the same merchant vary from charge to charge
//! ("NETFLIX.COM 8/01", "NETFLIX.COM*10/01"). Normalization reduces them to a
//! stable lowercase merchant pattern that detection groups on.

use std::sync::LazyLock;

use regex::Regex;

/// Trailing corporate suffix ("Inc.", "LLC", "Company")
static CORPORATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?:llc|inc|corp|ltd|co|company)\.?$").expect("valid regex")
});

/// Trailing transaction or store number ("12345", "#123")
static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s+#?|#)\d+$").expect("valid regex"));

/// Trailing statement date ("8/01", "12/15/2024")
static TRAILING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\d{1,2}/\d{1,2}(?:/\d{2,4})?$").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Reduce a raw transaction description to its merchant pattern
pub fn normalize_merchant(description: &str) -> String {
    let lowered = description.trim().to_lowercase();

    let without_suffix = CORPORATE_SUFFIX.replace(&lowered, "");
    let without_number = TRAILING_NUMBER.replace(&without_suffix, "");
    let without_date = TRAILING_DATE.replace(&without_number, "");
    let without_stars = without_date.replace('*', "");

    WHITESPACE
        .replace_all(&without_stars, " ")
        .trim()
        .to_string()
}

/// Whether a pattern is long enough to group transactions on
pub fn is_groupable(pattern: &str, min_len: usize) -> bool {
    pattern.chars().count() >= min_len
}

/// Title-case a merchant pattern for display ("netflix.com" -> "Netflix.com")
pub fn display_name(pattern: &str) -> String {
    pattern
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
