use finqa_core::sensitive::{best_name_match, extract_requested_name, is_sensitive_question};
use pretty_assertions::assert_eq;

#[test]
fn surname_resolves_by_containment() {
    assert_eq!(
        best_name_match("SMITH", ["JOHN SMITH", "JANE DOE"]).as_deref(),
        Some("JOHN SMITH")
    );
}

#[test]
fn containment_needs_a_contiguous_run() {
    // A middle initial splitting the candidate defeats containment.
    assert_eq!(
        best_name_match("John Q Smith", ["JOHN SMITH"]).as_deref(),
        None
    );
    assert_eq!(
        best_name_match("John Smith Jr", ["JANE DOE", "JOHN SMITH"]).as_deref(),
        Some("JOHN SMITH")
    );
}

#[test]
fn first_candidate_in_caller_order_wins() {
    let candidates = ["JOHN SMITH", "SALLY SMITH"];
    assert_eq!(best_name_match("smith", candidates).as_deref(), Some("JOHN SMITH"));
}

#[test]
fn empty_or_unknown_names_resolve_to_nothing() {
    assert_eq!(best_name_match("", ["JOHN SMITH"]), None);
    assert_eq!(best_name_match("!!", ["JOHN SMITH"]), None);
    assert_eq!(best_name_match("ALEX KIM", ["JOHN SMITH"]), None);
    assert_eq!(best_name_match("SMITH", Vec::<String>::new()), None);
}

#[test]
fn question_phrasings_round_trip_to_candidates() {
    let candidates = ["GARRETT MCGOVERN", "SALLY SMITH"];
    for q in [
        "What is Garrett McGovern's SSN?",
        "ssn for garrett mcgovern",
        "Show me the social security number for Garrett McGovern please",
    ] {
        let name = extract_requested_name(q).unwrap_or_else(|| panic!("no name in {q:?}"));
        assert_eq!(
            best_name_match(&name, candidates).as_deref(),
            Some("GARRETT MCGOVERN"),
            "question: {q}"
        );
    }
}

#[test]
fn classifier_misses_are_a_known_limitation() {
    // No trigger word: routed to the general path even though it asks for an SSN.
    assert!(!is_sensitive_question("What is Sally Smith's taxpayer identification number?"));
    // Trigger substring inside an unrelated word: routed to extraction.
    assert!(is_sensitive_question("Which assn. dues were deducted?"));
}
