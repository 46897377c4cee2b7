#![allow(dead_code)]

use std::cell::RefCell;

use finqa_ai::llm::Generator;
use finqa_ai::retrieve::Retriever;
use finqa_core::audit::{TraceRecord, TraceSink};
use finqa_core::domain::{Chunk, RetrievedResult};
use finqa_core::error::AppError;

/// Returns a fixed result list (truncated to k) and remembers every requested k.
pub struct StaticRetriever {
    pub results: Vec<RetrievedResult>,
    pub ready: bool,
    pub fail_on: Option<&'static str>,
    pub calls: RefCell<Vec<usize>>,
}

impl StaticRetriever {
    pub fn with_texts(texts: &[(&str, u32, &str)]) -> Self {
        let results = texts
            .iter()
            .enumerate()
            .map(|(i, (source, page, text))| {
                RetrievedResult::new(Chunk::new(*source, *page, i as u32 * 100, *text), i as u32)
            })
            .collect();
        Self {
            results,
            ready: true,
            fail_on: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_texts(&[])
    }

    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::empty()
        }
    }

    pub fn failing_on(mut self, needle: &'static str) -> Self {
        self.fail_on = Some(needle);
        self
    }
}

impl Retriever for StaticRetriever {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedResult>, AppError> {
        self.calls.borrow_mut().push(k);
        if self.fail_on.is_some_and(|n| query.contains(n)) {
            return Err(AppError::collaborator("AI_RETRIEVAL_FAILED", "vector store unavailable")
                .with_retryable(true));
        }
        Ok(self.results.iter().take(k).cloned().collect())
    }
}

pub struct MockGenerator {
    pub out: String,
    pub calls: RefCell<Vec<(String, String, String)>>,
}

impl MockGenerator {
    pub fn new(out: &str) -> Self {
        Self {
            out: out.to_string(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl Generator for MockGenerator {
    fn generate(&self, system_instruction: &str, context: &str, question: &str) -> Result<String, AppError> {
        self.calls.borrow_mut().push((
            system_instruction.to_string(),
            context.to_string(),
            question.to_string(),
        ));
        Ok(self.out.clone())
    }
}

pub struct FailingGenerator;

impl Generator for FailingGenerator {
    fn generate(&self, _: &str, _: &str, _: &str) -> Result<String, AppError> {
        Err(AppError::collaborator("AI_GENERATION_FAILED", "model crashed"))
    }
}

pub struct FailingSink;

impl TraceSink for FailingSink {
    fn record(&self, _trace: &TraceRecord) -> Result<(), AppError> {
        Err(AppError::io("AUDIT_WRITE_FAILED", "disk full"))
    }
}
