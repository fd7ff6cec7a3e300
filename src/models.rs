//! Core data models shared by the loader, index, pipeline, and monitor.
//!
//! A [`Document`] is the unit that flows from the loader through the
//! splitter into the index and back out of retrieval. Once created it is
//! never mutated; stages clone documents rather than edit them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key every document carries.
pub const SOURCE_KEY: &str = "source";

/// A piece of text plus string metadata (at minimum a `source`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with a single `source` metadata entry.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Create a document with arbitrary metadata.
    pub fn with_metadata(content: impl Into<String>, metadata: BTreeMap<String, String>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// The `source` metadata value, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// Coarse trust label attached to an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
    Unknown,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
            Confidence::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single `query` returns to its caller.
///
/// `sources` keeps the retrieval order: the first entry is the chunk that
/// was ranked most relevant and appeared first in the model's context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub answer: String,
    pub confidence: Confidence,
    pub sources: Vec<Document>,
}

impl QueryResult {
    /// `source` labels of the retrieved documents, in rank order.
    ///
    /// Documents without a `source` entry are reported as `"unknown"`.
    pub fn source_labels(&self) -> Vec<String> {
        source_labels(&self.sources)
    }
}

pub(crate) fn source_labels(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .map(|d| d.source().unwrap_or("unknown").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_source() {
        let doc = Document::new("body", "ml_intro");
        assert_eq!(doc.source(), Some("ml_intro"));
        assert_eq!(doc.content(), "body");
    }

    #[test]
    fn test_missing_source_is_unknown() {
        let doc = Document::with_metadata("body", BTreeMap::new());
        assert_eq!(source_labels(&[doc]), vec!["unknown".to_string()]);
    }

    #[test]
    fn test_confidence_serializes_lowercase() {
        let json = serde_json::to_string(&Confidence::High).unwrap();
        assert_eq!(json, "\"high\"");
        assert_eq!(Confidence::Unknown.to_string(), "unknown");
    }
}
