//! Sensitive-field handling: question routing, name/SSN pairing, requested-name
//! resolution. Everything here is pure and works on already-retrieved text.

mod classify;
mod names;
mod pairs;

pub use classify::{is_sensitive_question, SENSITIVE_TRIGGERS};
pub use names::{best_name_match, extract_requested_name};
pub use pairs::{
    extract_candidate_names, extract_pairs, extract_pairs_from_text, EntityPairs, NAME_BLACKLIST,
    PROXIMITY_WINDOW_CHARS,
};

/// Uppercase, ASCII letters only, single spaces between words.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphabetic() || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}
