//! Query pipeline: retrieve, generate, validate.
//!
//! A question moves through three stages, each taking the previous
//! [`QueryState`] by value and returning a new one:
//!
//! ```text
//! question ─▶ retrieve ─▶ generate ─▶ (policy) ─▶ validate ─▶ QueryResult
//!                                          └──────── Finish ───────▲
//! ```
//!
//! When retrieval finds nothing the generator is never called; the state
//! carries the language's "no information" answer at [`Confidence::Low`].
//! Otherwise the answer starts at [`Confidence::Medium`]. Either way the
//! policy decides whether the validator runs; when it does, its label
//! replaces the earlier one.
//!
//! Collaborators are injected as trait objects, so tests swap in stubs for
//! the index and the model.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::generation::AnswerGenerator;
use crate::index::VectorIndex;
use crate::models::{Confidence, Document, QueryResult};
use crate::monitor::QueryMonitor;
use crate::prompt::{build_context, Language};
use crate::validate::validate_answer;

/// Number of chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Intermediate state of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    question: String,
    documents: Vec<Document>,
    answer: Option<String>,
    confidence: Confidence,
}

impl QueryState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            documents: Vec::new(),
            answer: None,
            confidence: Confidence::Unknown,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Retrieved chunks, most relevant first.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn with_documents(self, documents: Vec<Document>) -> Self {
        Self { documents, ..self }
    }

    pub fn with_answer(self, answer: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            answer: Some(answer.into()),
            confidence,
            ..self
        }
    }

    fn into_result(self) -> Result<QueryResult> {
        let answer = self
            .answer
            .ok_or_else(|| anyhow!("Query finished without an answer"))?;
        Ok(QueryResult {
            answer,
            confidence: self.confidence,
            sources: self.documents,
        })
    }
}

/// What happens after generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStage {
    Validate,
    Finish,
}

/// Decides, from the generated state, whether the validator runs.
pub type ValidationPolicy = fn(&QueryState) -> NextStage;

/// Default policy: every generated answer is validated.
pub fn always_validate(_state: &QueryState) -> NextStage {
    NextStage::Validate
}

/// Retrieval-augmented question answering over a [`VectorIndex`].
pub struct Pipeline {
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn AnswerGenerator>,
    language: Language,
    top_k: usize,
    policy: ValidationPolicy,
}

impl Pipeline {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn AnswerGenerator>,
        language: Language,
    ) -> Self {
        Self {
            index,
            generator,
            language,
            top_k: DEFAULT_TOP_K,
            policy: always_validate,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Answer `question` from the indexed documents.
    ///
    /// Index and generator errors propagate; an empty retrieval does not.
    pub async fn query(&self, question: &str) -> Result<QueryResult> {
        info!(question = %question, "Processing query");

        let state = self.retrieve(QueryState::new(question)).await?;
        let state = self.generate(state).await?;

        let state = match (self.policy)(&state) {
            NextStage::Validate => self.validate(state),
            NextStage::Finish => state,
        };

        debug!(confidence = %state.confidence(), "Query finished");
        state.into_result()
    }

    /// [`query`](Self::query), timed and logged to `monitor` on success.
    ///
    /// A failed query is not recorded.
    pub async fn query_recorded(
        &self,
        question: &str,
        monitor: &mut QueryMonitor,
    ) -> Result<QueryResult> {
        let start = Instant::now();
        let result = self.query(question).await?;
        let elapsed = start.elapsed().as_secs_f64();

        monitor.log_query(
            question,
            &result.answer,
            result.confidence,
            &result.sources,
            elapsed,
        );
        info!(
            confidence = %result.confidence,
            sources = result.sources.len(),
            "Answered in {:.2}s",
            elapsed
        );
        Ok(result)
    }

    /// Fetch the top-`k` chunks for the state's question.
    pub async fn retrieve(&self, state: QueryState) -> Result<QueryState> {
        let documents = self
            .index
            .similarity_search(state.question(), self.top_k)
            .await
            .context("Retrieval failed")?;
        debug!("Retrieved {} documents", documents.len());
        Ok(state.with_documents(documents))
    }

    /// Ask the model to answer from the retrieved chunks.
    pub async fn generate(&self, state: QueryState) -> Result<QueryState> {
        if state.documents().is_empty() {
            debug!("No documents retrieved, using fallback answer");
            let answer = self.language.no_information_answer();
            return Ok(state.with_answer(answer, Confidence::Low));
        }

        let context = build_context(state.documents());
        let prompt = self.language.build_prompt(&context, state.question());
        let answer = self
            .generator
            .invoke(&prompt)
            .await
            .with_context(|| format!("Generation failed (model {})", self.generator.model()))?;

        Ok(state.with_answer(answer, Confidence::Medium))
    }

    /// Label the generated answer. A state without an answer is returned as is.
    pub fn validate(&self, state: QueryState) -> QueryState {
        let (confidence, answer) = match state.answer() {
            Some(answer) => validate_answer(answer, self.language),
            None => return state,
        };
        state.with_answer(answer, confidence)
    }
}
