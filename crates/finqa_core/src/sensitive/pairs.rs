use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::RetrievedResult;
use crate::policy::SSN_PATTERN;

use super::normalize_name;

/// Normalized name -> SSN. Sorted keys give callers a deterministic candidate order.
pub type EntityPairs = BTreeMap<String, String>;

/// Default size of the forward scan used when a name has no SSN on its own line.
pub const PROXIMITY_WINDOW_CHARS: usize = 200;

/// Form boilerplate that looks like an all-caps name.
pub const NAME_BLACKLIST: &[&str] = &[
    "UNITED STATES",
    "INTERNAL REVENUE SERVICE",
    "DEPARTMENT OF THE TREASURY",
    "PREVIEW COPY",
    "DO NOT FILE",
];

const MIN_NAME_CHARS: usize = 5;
const MAX_NAME_WORDS: usize = 4;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z]{2,}(?:[ \t]+[A-Z]{2,})+\b").expect("static name pattern compiles")
});

/// All-caps runs of two or more words that plausibly name a person, distinct and
/// in order of first appearance. A run never crosses a line break.
pub fn extract_candidate_names(text: &str) -> Vec<String> {
    let upper = text.to_uppercase();
    let mut out: Vec<String> = Vec::new();
    for m in NAME_PATTERN.find_iter(&upper) {
        let name = normalize_name(m.as_str());
        if name.len() < MIN_NAME_CHARS
            || NAME_BLACKLIST.contains(&name.as_str())
            || name.split(' ').count() > MAX_NAME_WORDS
        {
            continue;
        }
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Pair names with SSNs across the text of every retrieved result.
pub fn extract_pairs(results: &[RetrievedResult], window: usize) -> EntityPairs {
    let text = results
        .iter()
        .map(|r| r.text())
        .collect::<Vec<_>>()
        .join("\n");
    extract_pairs_from_text(&text, window)
}

/// Two passes over the uppercased text.
///
/// 1. Same line: every name on a line takes the first SSN on that line, unless the
///    name is already paired.
/// 2. Proximity: names still unpaired take the first SSN that starts within `window`
///    characters of one of their occurrences, trying occurrences in order.
pub fn extract_pairs_from_text(text: &str, window: usize) -> EntityPairs {
    let upper = text.to_uppercase();
    let mut pairs = EntityPairs::new();

    for line in upper.lines() {
        let Some(ssn) = SSN_PATTERN.find(line) else {
            continue;
        };
        for name in extract_candidate_names(line) {
            pairs.entry(name).or_insert_with(|| ssn.as_str().to_string());
        }
    }
    let same_line = pairs.len();

    for name in extract_candidate_names(&upper) {
        if pairs.contains_key(&name) {
            continue;
        }
        if let Some(ssn) = first_ssn_after(&upper, &name, window) {
            pairs.insert(name, ssn);
        }
    }

    tracing::debug!(
        same_line,
        proximity = pairs.len() - same_line,
        "paired names with SSNs"
    );
    pairs
}

fn first_ssn_after(upper: &str, name: &str, window: usize) -> Option<String> {
    let mut from = 0usize;
    while let Some(pos) = upper[from..].find(name) {
        let start = from + pos;
        let rest = &upper[start..];
        let end = rest
            .char_indices()
            .nth(window)
            .map(|(i, _)| start + i)
            .unwrap_or(upper.len());
        if let Some(m) = SSN_PATTERN.find(&upper[start..end]) {
            return Some(m.as_str().to_string());
        }
        // Names are ASCII, so the byte after a match start is a char boundary.
        from = start + 1;
    }
    None
}
