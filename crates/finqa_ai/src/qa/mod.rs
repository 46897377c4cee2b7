use std::time::Instant;

use finqa_core::audit::{build_trace, TraceContext, TraceInput, TraceSink};
use finqa_core::domain::{distinct_citations, AnswerResult, Citation, DisclosureMode, RetrievedResult};
use finqa_core::error::AppError;
use finqa_core::policy;
use finqa_core::sensitive::{
    best_name_match, extract_pairs, extract_requested_name, is_sensitive_question,
    PROXIMITY_WINDOW_CHARS,
};

use crate::llm::Generator;
use crate::retrieve::Retriever;

pub mod prompts;

/// Retrieval widths and the pairing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AskSettings {
    pub sensitive_top_k: usize,
    pub general_top_k: usize,
    pub proximity_window: usize,
}

impl AskSettings {
    /// k values are clamped to at least 1.
    pub fn new(sensitive_top_k: usize, general_top_k: usize, proximity_window: usize) -> Self {
        Self {
            sensitive_top_k: sensitive_top_k.max(1),
            general_top_k: general_top_k.max(1),
            proximity_window: proximity_window.max(1),
        }
    }
}

impl Default for AskSettings {
    fn default() -> Self {
        Self::new(12, 4, PROXIMITY_WINDOW_CHARS)
    }
}

/// Per-request inputs. Nothing here outlives the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub mode: DisclosureMode,
    pub authorized: bool,
    pub include_citations: bool,
    pub trace: TraceContext,
}

impl AskRequest {
    pub fn new(mode: DisclosureMode) -> Self {
        Self {
            mode,
            authorized: false,
            include_citations: true,
            trace: TraceContext::default(),
        }
    }

    pub fn authorized(mut self, authorized: bool) -> Self {
        self.authorized = authorized;
        self
    }

    pub fn with_citations(mut self, include: bool) -> Self {
        self.include_citations = include;
        self
    }

    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = trace;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Sensitive,
    General,
}

impl Route {
    fn as_str(self) -> &'static str {
        match self {
            Route::Sensitive => "sensitive",
            Route::General => "general",
        }
    }
}

/// Answers questions over the indexed corpus and enforces the disclosure policy.
///
/// Holds no per-call state: every `ask` builds its own retrieval results and pairs,
/// and hands exactly one trace record to the sink.
pub struct FinancialQa<'a> {
    retriever: &'a dyn Retriever,
    generator: &'a dyn Generator,
    sink: &'a dyn TraceSink,
    settings: AskSettings,
}

impl<'a> FinancialQa<'a> {
    pub fn new(
        retriever: &'a dyn Retriever,
        generator: &'a dyn Generator,
        sink: &'a dyn TraceSink,
    ) -> Self {
        Self {
            retriever,
            generator,
            sink,
            settings: AskSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AskSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> AskSettings {
        self.settings
    }

    /// Answer one question.
    ///
    /// Collaborator and precondition errors are returned unchanged after a trace
    /// carrying the error and elapsed time has been recorded.
    pub fn ask(&self, question: &str, req: &AskRequest) -> Result<AnswerResult, AppError> {
        let started = Instant::now();
        let mut retrieved: Vec<RetrievedResult> = Vec::new();
        let outcome = self.answer(question, req, &mut retrieved);
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let trace = build_trace(TraceInput {
            question,
            mode: req.mode,
            authorized: req.authorized,
            grounded: outcome.as_ref().is_ok_and(|(a, _)| a.grounded),
            retrieved: &retrieved,
            latency_ms,
            error: outcome.as_ref().err(),
            context: &req.trace,
        });
        if let Err(e) = self.sink.record(&trace) {
            tracing::warn!(code = %e.code, "failed to record answer trace");
        }

        match outcome {
            Ok((answer, route)) => {
                tracing::info!(
                    route = route.as_str(),
                    mode = %req.mode,
                    grounded = answer.grounded,
                    sources = retrieved.len(),
                    latency_ms,
                    "answered question"
                );
                Ok(answer)
            }
            Err(e) => {
                tracing::warn!(code = %e.code, mode = %req.mode, latency_ms, "answer attempt failed");
                Err(e)
            }
        }
    }

    fn answer(
        &self,
        question: &str,
        req: &AskRequest,
        retrieved: &mut Vec<RetrievedResult>,
    ) -> Result<(AnswerResult, Route), AppError> {
        if !self.retriever.is_ready() {
            return Err(AppError::precondition(
                "QA_INDEX_NOT_READY",
                "Index not ready; build or load the index before asking",
            ));
        }

        let route = if is_sensitive_question(question) {
            Route::Sensitive
        } else {
            Route::General
        };
        let (raw, grounded) = match route {
            Route::Sensitive => self.answer_sensitive(question, retrieved)?,
            Route::General => self.answer_general(question, retrieved)?,
        };

        let mut text = policy::enforce(&raw, req.mode, grounded, req.authorized);
        let citations = distinct_citations(retrieved);
        if req.include_citations && !citations.is_empty() {
            text = append_citations(&text, &citations);
        }

        Ok((
            AnswerResult {
                text,
                citations,
                grounded,
                authorized: req.authorized,
                disclosure_mode: req.mode,
            },
            route,
        ))
    }

    fn answer_sensitive(
        &self,
        question: &str,
        retrieved: &mut Vec<RetrievedResult>,
    ) -> Result<(String, bool), AppError> {
        *retrieved = self.retriever.retrieve(question, self.settings.sensitive_top_k)?;
        let pairs = extract_pairs(retrieved, self.settings.proximity_window);
        tracing::debug!(results = retrieved.len(), pairs = pairs.len(), "extracted entity pairs");

        let answer = match extract_requested_name(question) {
            Some(name) => match best_name_match(&name, pairs.keys()).and_then(|m| pairs.get(&m)) {
                Some(ssn) => (ssn.clone(), true),
                None => (prompts::not_found_for_name(&name), false),
            },
            None if !pairs.is_empty() => {
                let names: Vec<&str> = pairs.keys().map(String::as_str).collect();
                (prompts::disambiguate(&names), true)
            }
            None => (prompts::NO_SSN_FOUND.to_string(), false),
        };
        Ok(answer)
    }

    fn answer_general(
        &self,
        question: &str,
        retrieved: &mut Vec<RetrievedResult>,
    ) -> Result<(String, bool), AppError> {
        *retrieved = self.retriever.retrieve(question, self.settings.general_top_k)?;
        let context = prompts::build_context(retrieved);
        let text = self
            .generator
            .generate(prompts::SYSTEM_INSTRUCTION, &context, question)?;
        Ok((text, !retrieved.is_empty()))
    }
}

fn append_citations(text: &str, citations: &[Citation]) -> String {
    let mut out = String::from(text);
    out.push_str("\n\nSources:");
    for c in citations {
        out.push_str("\n- ");
        out.push_str(&c.to_string());
    }
    out
}
