use std::sync::LazyLock;

use regex::Regex;

use super::normalize_name;

// "<name>'s SSN" / "<name>'s social security ...". The name must not start right
// after an apostrophe, so "What's Smith's SSN" captures "Smith" and not "s Smith".
static POSSESSIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^'’\w])([a-z]+(?:\s+[a-z]+){0,3})['’]s\s+(?:ssn|social\s+security)")
        .expect("static possessive pattern compiles")
});

// "SSN for <name>" / "social security number for <name>"
static FOR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ssn|social\s+security(?:\s+number)?)\s+for\s+([a-z]+(?:\s+[a-z]+){0,3})")
        .expect("static ssn-for pattern compiles")
});

/// Words the capture groups swallow from the surrounding question.
const FILLER_WORDS: &[&str] = &[
    "A", "AN", "ARE", "CAN", "DO", "DOES", "FIND", "FOR", "FROM", "GET", "GIVE", "I", "IN",
    "IS", "KNOW", "ME", "OF", "ON", "PLEASE", "SHOW", "TELL", "THE", "WAS", "WHAT", "YOU",
];

/// Person name the question asks about, normalized, if one of the two supported
/// phrasings is present.
pub fn extract_requested_name(question: &str) -> Option<String> {
    let q = question.trim();
    let captured = POSSESSIVE
        .captures(q)
        .or_else(|| FOR_NAME.captures(q))
        .and_then(|c| c.get(1))?;
    let name = trim_filler(&normalize_name(captured.as_str()));
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn trim_filler(name: &str) -> String {
    let words: Vec<&str> = name.split(' ').filter(|w| !w.is_empty()).collect();
    let start = words
        .iter()
        .position(|w| !FILLER_WORDS.contains(w))
        .unwrap_or(words.len());
    let end = words
        .iter()
        .rposition(|w| !FILLER_WORDS.contains(w))
        .map(|i| i + 1)
        .unwrap_or(start);
    words[start..end.max(start)].join(" ")
}

/// Resolve `target` against extracted names: exact match first, then containment in
/// either direction. Candidates are tried in the order given.
pub fn best_name_match<I, S>(target: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let target = normalize_name(target);
    if target.is_empty() {
        return None;
    }
    let candidates: Vec<S> = candidates.into_iter().collect();

    if let Some(c) = candidates.iter().find(|c| c.as_ref() == target) {
        return Some(c.as_ref().to_string());
    }
    candidates
        .iter()
        .map(|c| c.as_ref())
        .find(|c| !c.is_empty() && (c.contains(target.as_str()) || target.contains(c)))
        .map(str::to_string)
}
