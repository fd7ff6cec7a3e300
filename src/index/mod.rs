//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is the only way the query pipeline reaches
//! stored chunks: it hands over a question and gets back the `k` most
//! similar documents, most relevant first. How vectors are computed and
//! compared is the implementation's business.
//!
//! Implementations must be `Send + Sync` so they can be shared as
//! `Arc<dyn VectorIndex>`.

mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Document;

pub use memory::{InMemoryIndex, INDEX_FILE};

/// Similarity index over document chunks.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`add_documents`](VectorIndex::add_documents) | Embed and store chunks |
/// | [`similarity_search`](VectorIndex::similarity_search) | Top-`k` chunks for a query |
/// | [`len`](VectorIndex::len) | Number of stored chunks |
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed and store `chunks`. Returns how many were actually added;
    /// chunks already present are skipped.
    async fn add_documents(&self, chunks: &[Document]) -> Result<usize>;

    /// Up to `k` stored chunks ordered by decreasing similarity to `query`.
    ///
    /// An empty result is not an error.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
