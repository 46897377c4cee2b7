use std::fs;
use std::path::Path;

use finqa_core::audit::TraceContext;
use finqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::qa::{AskRequest, FinancialQa};

#[derive(Debug, Deserialize)]
struct QuestionsFile {
    #[serde(default)]
    questions: Vec<String>,
}

/// Questions from `.txt` (one per line) or `.json` (`{"questions": [...]}`).
pub fn load_questions(path: &Path) -> Result<Vec<String>, AppError> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ext != "txt" && ext != "json" {
        return Err(AppError::input(
            "EVAL_QUESTIONS_UNSUPPORTED",
            "Unsupported questions file; use .txt or .json",
        )
        .with_details(format!("path={}", path.display())));
    }

    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::io("EVAL_QUESTIONS_NOT_FOUND", "Failed to read questions file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;

    if ext == "txt" {
        return Ok(raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect());
    }
    let parsed: QuestionsFile = serde_json::from_str(&raw).map_err(|e| {
        AppError::input("EVAL_QUESTIONS_INVALID", "Failed to parse questions file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    Ok(parsed.questions)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvalOutcome {
    pub index: u32,
    pub question: String,
    pub grounded: bool,
    /// Error code when the attempt failed.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvalReport {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    pub outcomes: Vec<EvalOutcome>,
}

/// Ask every question in order. A failed question is recorded and the batch
/// continues; answers themselves are left to the trace sink.
pub fn run_eval(
    qa: &FinancialQa<'_>,
    questions: &[String],
    template: &AskRequest,
    questions_file: Option<&str>,
) -> EvalReport {
    let mut outcomes = Vec::with_capacity(questions.len());
    for (i, q) in questions.iter().enumerate() {
        let index = i as u32 + 1;
        let req = template.clone().with_trace(TraceContext {
            ui: Some("eval".to_string()),
            question_index: Some(index),
            questions_file: questions_file.map(str::to_string),
        });
        let outcome = match qa.ask(q, &req) {
            Ok(answer) => EvalOutcome {
                index,
                question: q.clone(),
                grounded: answer.grounded,
                error: None,
            },
            Err(e) => EvalOutcome {
                index,
                question: q.clone(),
                grounded: false,
                error: Some(e.code),
            },
        };
        tracing::info!(
            index,
            total = questions.len(),
            ok = outcome.error.is_none(),
            "evaluated question"
        );
        outcomes.push(outcome);
    }

    let errors = outcomes.iter().filter(|o| o.error.is_some()).count();
    EvalReport {
        total: outcomes.len(),
        ok: outcomes.len() - errors,
        errors,
        outcomes,
    }
}
