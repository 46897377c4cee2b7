use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(p) = stack.pop() {
        let entries = match fs::read_dir(&p) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for ent in entries.flatten() {
            let path = ent.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

#[test]
fn finqa_core_never_touches_the_network() {
    // Document text and extracted SSNs stay in-process; only finqa_ai talks to Ollama.
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    let files = collect_rs_files(&src_root);
    assert!(!files.is_empty());

    for f in files {
        let text = fs::read_to_string(&f).unwrap_or_default();
        for forbidden in ["ureq", "std::net", "TcpStream"] {
            assert!(
                !text.contains(forbidden),
                "forbidden network use `{forbidden}` found in {}",
                f.display()
            );
        }
    }
}

const SENSITIVE_FIELDS: &[&str] = &["ssn", "ssns", "name", "names", "question", "text"];

#[test]
fn sensitive_values_are_never_logged() {
    // Tracing events may carry counts and flags, never names or SSN values.
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    for f in collect_rs_files(&src_root) {
        let text = fs::read_to_string(&f).unwrap_or_default();
        let found = logged_sensitive_fields(&text, SENSITIVE_FIELDS);
        assert!(found.is_empty(), "sensitive field {found:?} in log call in {}", f.display());
    }
}

#[test]
fn multi_line_log_calls_are_scanned_to_the_end() {
    let src = "tracing::info!(\n    same_line,\n    ssn = %ssn,\n    \"paired name\"\n);\nlet name = 1;";
    assert_eq!(logged_sensitive_fields(src, SENSITIVE_FIELDS), vec!["ssn", "ssn"]);

    let clean = "tracing::debug!(\n    pairs = pairs.len(),\n    \"paired names with SSNs\"\n);";
    assert!(logged_sensitive_fields(clean, SENSITIVE_FIELDS).is_empty());
}

/// Every `tracing::` macro invocation in `text`, through its closing `);`.
fn log_invocations(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("tracing::") {
        let tail = &rest[start..];
        let end = tail.find(");").map(|i| i + 2).unwrap_or(tail.len());
        out.push(&tail[..end]);
        rest = &tail[end..];
    }
    out
}

/// Identifiers used in a log call, with string literals removed.
fn field_tokens(call: &str) -> Vec<String> {
    let mut code = String::new();
    let mut in_str = false;
    let mut prev = '\0';
    for c in call.chars() {
        if c == '"' && prev != '\\' {
            in_str = !in_str;
        } else if !in_str {
            code.push(c);
        }
        prev = c;
    }
    code.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn logged_sensitive_fields(text: &str, forbidden: &[&str]) -> Vec<String> {
    log_invocations(text)
        .into_iter()
        .flat_map(field_tokens)
        .filter(|t| forbidden.contains(&t.as_str()))
        .collect()
}
