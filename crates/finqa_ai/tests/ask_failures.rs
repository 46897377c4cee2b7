mod common;

use common::{FailingGenerator, FailingSink, MockGenerator, StaticRetriever};
use finqa_ai::qa::{AskRequest, FinancialQa};
use finqa_core::audit::{MemoryTraceSink, TraceContext};
use finqa_core::domain::DisclosureMode;
use finqa_core::error::ErrorClass;
use pretty_assertions::assert_eq;

#[test]
fn retrieval_failure_is_surfaced_and_traced() {
    let retriever = StaticRetriever::with_texts(&[("w2.pdf", 0, "SALLY SMITH 222-22-2222")]).failing_on("SSN");
    let generator = MockGenerator::new("unused");
    let sink = MemoryTraceSink::new();
    let qa = FinancialQa::new(&retriever, &generator, &sink);

    let req = AskRequest::new(DisclosureMode::Authorized)
        .authorized(true)
        .with_trace(TraceContext::ui("cli"));
    let err = qa.ask("What is Sally Smith's SSN?", &req).expect_err("should fail");
    assert_eq!(err.code, "AI_RETRIEVAL_FAILED");
    assert_eq!(err.class, ErrorClass::Collaborator);

    let traces = sink.records();
    assert_eq!(traces.len(), 1);
    let t = &traces[0];
    assert!(!t.grounded);
    assert!(t.sources.is_empty());
    assert_eq!(t.error.as_deref(), Some("[AI_RETRIEVAL_FAILED] vector store unavailable"));
    assert_eq!(t.ui.as_deref(), Some("cli"));
    assert!(t.latency_ms >= 0.0);
}

#[test]
fn generation_failure_is_not_downgraded_to_not_found() {
    let retriever = StaticRetriever::with_texts(&[("w2.pdf", 0, "wages 52,000")]);
    let generator = FailingGenerator;
    let sink = MemoryTraceSink::new();
    let qa = FinancialQa::new(&retriever, &generator, &sink);

    let req = AskRequest::new(DisclosureMode::Open);
    let err = qa.ask("What were wages?", &req).expect_err("should fail");
    assert_eq!(err.code, "AI_GENERATION_FAILED");

    let t = &sink.records()[0];
    assert_eq!(t.error.as_deref(), Some("[AI_GENERATION_FAILED] model crashed"));
    assert!(!t.grounded);
    assert!(t.sources.is_empty());
}

#[test]
fn unready_index_is_a_precondition_failure() {
    let retriever = StaticRetriever::not_ready();
    let generator = MockGenerator::new("unused");
    let sink = MemoryTraceSink::new();
    let qa = FinancialQa::new(&retriever, &generator, &sink);

    let err = qa
        .ask("What were wages?", &AskRequest::new(DisclosureMode::Open))
        .expect_err("should fail");
    assert_eq!(err.code, "QA_INDEX_NOT_READY");
    assert!(err.is_precondition());
    assert!(!err.retryable);
    assert!(retriever.calls.borrow().is_empty());
    assert_eq!(sink.records().len(), 1);
}

#[test]
fn sink_failure_does_not_change_the_outcome() {
    let retriever = StaticRetriever::with_texts(&[("w2.pdf", 0, "SALLY SMITH 222-22-2222")]);
    let generator = MockGenerator::new("unused");
    let qa = FinancialQa::new(&retriever, &generator, &FailingSink);

    let req = AskRequest::new(DisclosureMode::Open).with_citations(false);
    let answer = qa.ask("SSN for Sally Smith", &req).expect("ask");
    assert_eq!(answer.text, "222-22-2222");

    let failing = StaticRetriever::empty().failing_on("wages");
    let qa = FinancialQa::new(&failing, &generator, &FailingSink);
    let err = qa.ask("wages?", &req).expect_err("should fail");
    assert_eq!(err.code, "AI_RETRIEVAL_FAILED");
}
