use std::sync::LazyLock;

use regex::Regex;

use crate::domain::DisclosureMode;

/// Literal placeholder substituted for every masked SSN.
pub const SSN_REDACTION: &str = "[SSN]";

/// Three digits, two digits, four digits; dash or space separators are optional.
pub static SSN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3}[- ]?\d{2}[- ]?\d{4}\b").expect("static SSN pattern compiles")
});

pub fn contains_ssn(text: &str) -> bool {
    SSN_PATTERN.is_match(text)
}

/// All SSN-like substrings, distinct, in order of first appearance.
pub fn find_ssns(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in SSN_PATTERN.find_iter(text) {
        if !out.iter().any(|s| s == m.as_str()) {
            out.push(m.as_str().to_string());
        }
    }
    out
}

/// Textual substitution only; names and other PII pass through untouched.
pub fn mask_ssns(text: &str) -> String {
    SSN_PATTERN.replace_all(text, SSN_REDACTION).into_owned()
}

/// Apply the disclosure policy to an answer.
///
/// Pure per-call decision. Idempotent: the placeholder carries no digits, so a
/// second pass finds nothing left to mask.
pub fn enforce(text: &str, mode: DisclosureMode, grounded: bool, authorized: bool) -> String {
    match mode {
        DisclosureMode::Open => text.to_string(),
        DisclosureMode::Authorized => {
            if authorized && grounded {
                text.to_string()
            } else {
                mask_ssns(text)
            }
        }
        DisclosureMode::Redacted => mask_ssns(text),
    }
}
