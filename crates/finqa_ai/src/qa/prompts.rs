use finqa_core::domain::RetrievedResult;

pub const SYSTEM_INSTRUCTION: &str = "You are a careful financial document assistant. \
Answer using ONLY the provided context. \
If the answer is not in the context, say you cannot find it.";

/// Retrieved passages, each headed by its source tag, separated by blank lines.
pub fn build_context(results: &[RetrievedResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "[source={}, page={}]\n{}",
                r.chunk.source, r.chunk.page, r.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn not_found_for_name(name: &str) -> String {
    format!("No SSN found for {name} in the retrieved documents.")
}

pub const NO_SSN_FOUND: &str = "No SSN found in the retrieved documents.";

pub fn disambiguate(names: &[&str]) -> String {
    format!(
        "I found SSNs for these people: {}. Which person do you mean?",
        names.join(", ")
    )
}
