/// Lowercase substrings that route a question to the extraction path.
pub const SENSITIVE_TRIGGERS: &[&str] = &["ssn", "social security"];

/// Case-insensitive substring match against [`SENSITIVE_TRIGGERS`].
///
/// Misclassification is tolerated downstream: a miss answers through generation, a
/// false hit ends in a "not found" answer.
pub fn is_sensitive_question(question: &str) -> bool {
    let q = question.to_lowercase();
    SENSITIVE_TRIGGERS.iter().any(|t| q.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_match_in_any_case() {
        assert!(is_sensitive_question("What is Sally Smith's SSN?"));
        assert!(is_sensitive_question("social SECURITY number for John"));
        assert!(!is_sensitive_question("What was the total wages in box 1?"));
    }
}
