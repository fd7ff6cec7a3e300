use std::io::Cursor;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use ragline::chat::run_repl;
use ragline::generation::AnswerGenerator;
use ragline::index::VectorIndex;
use ragline::models::Document;
use ragline::monitor::QueryMonitor;
use ragline::pipeline::Pipeline;
use ragline::prompt::Language;

struct OneDocIndex;

#[async_trait]
impl VectorIndex for OneDocIndex {
    async fn add_documents(&self, _chunks: &[Document]) -> Result<usize> {
        Ok(0)
    }

    async fn similarity_search(&self, _query: &str, _k: usize) -> Result<Vec<Document>> {
        Ok(vec![Document::new("Rust has no garbage collector.", "rust.md")])
    }

    fn len(&self) -> usize {
        1
    }
}

struct BrokenGenerator;

#[async_trait]
impl AnswerGenerator for BrokenGenerator {
    fn model(&self) -> &str {
        "broken"
    }

    async fn invoke(&self, _prompt: &str) -> Result<String> {
        bail!("boom")
    }
}

struct EchoGenerator;

#[async_trait]
impl AnswerGenerator for EchoGenerator {
    fn model(&self) -> &str {
        "echo"
    }

    async fn invoke(&self, _prompt: &str) -> Result<String> {
        Ok("Rust has no garbage collector.".to_string())
    }
}

async fn drive(generator: Arc<dyn AnswerGenerator>, script: &str) -> (String, String, QueryMonitor) {
    let pipeline = Pipeline::new(Arc::new(OneDocIndex), generator, Language::English);
    let mut monitor = QueryMonitor::new();
    let mut out = Vec::new();
    let mut err = Vec::new();

    run_repl(
        &pipeline,
        &mut monitor,
        Cursor::new(script.as_bytes().to_vec()),
        &mut out,
        &mut err,
    )
    .await
    .unwrap();

    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
        monitor,
    )
}

#[tokio::test]
async fn failed_query_reports_error_and_loop_continues() {
    let (out, err, monitor) = drive(
        Arc::new(BrokenGenerator),
        "q1\nstats\nquit\nnever asked\n",
    )
    .await;

    assert!(err.contains("Error: Generation failed"), "{}", err);
    assert!(err.contains("boom"), "{}", err);
    assert!(out.contains("Total queries: 0"), "{}", out);
    assert!(!out.contains("Question: q1"));
    assert!(!out.contains("never asked"));
    assert!(monitor.entries().is_empty());
}

#[tokio::test]
async fn answered_query_is_reported_and_recorded() {
    let (out, err, monitor) = drive(Arc::new(EchoGenerator), "  \nDoes Rust have a GC?\nSTATS\n").await;

    assert!(err.is_empty(), "{}", err);
    assert!(out.contains("Question: Does Rust have a GC?"));
    assert!(out.contains("Confidence: high"));
    assert!(out.contains("  1. rust.md: Rust has no garbage collector."));
    assert!(out.contains("Total queries: 1"));
    assert!(out.contains("High confidence: 100.00%"));
    assert_eq!(monitor.entries().len(), 1);
}
