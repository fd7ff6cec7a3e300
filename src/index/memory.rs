//! Brute-force in-memory [`VectorIndex`] with optional directory persistence.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`. Search scores every
//! stored vector by cosine similarity, which is fine for the few thousand
//! chunks of a local document folder.
//!
//! On disk the index is a single JSON file, [`INDEX_FILE`], inside the
//! persist directory:
//!
//! ```json
//! { "model": "all-minilm-l6-v2", "dims": 384,
//!   "entries": [ { "id": "…", "hash": "…", "document": { … }, "vector": [ … ] } ] }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::embedding::{cosine_similarity, embed_query, Embedder};
use crate::document::CHUNK_INDEX_KEY;
use crate::models::Document;
use crate::progress::{IndexProgressEvent, ProgressReporter};

use super::VectorIndex;

/// File name of the persisted index inside its directory.
pub const INDEX_FILE: &str = "index.json";

const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct IndexEntry {
    id: String,
    hash: String,
    document: Document,
    vector: Vec<f32>,
}

/// (content hash, source, chunk index): a repeated passage within one
/// file is a separate chunk, re-adding the same file is not.
type ChunkKey = (String, String, String);

impl IndexEntry {
    fn key(&self) -> ChunkKey {
        chunk_key(self.hash.clone(), &self.document)
    }
}

#[derive(Deserialize)]
struct IndexFile {
    model: String,
    dims: usize,
    entries: Vec<IndexEntry>,
}

#[derive(Serialize)]
struct IndexFileRef<'a> {
    model: &'a str,
    dims: usize,
    entries: &'a [IndexEntry],
}

/// In-memory vector index.
pub struct InMemoryIndex {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<IndexEntry>>,
    persist_dir: Option<PathBuf>,
    batch_size: usize,
    progress: Option<Box<dyn ProgressReporter>>,
}

impl InMemoryIndex {
    /// Empty index that lives only in memory.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
            persist_dir: None,
            batch_size: DEFAULT_BATCH_SIZE,
            progress: None,
        }
    }

    /// Embed `chunks` into a fresh in-memory index.
    pub async fn build(chunks: &[Document], embedder: Arc<dyn Embedder>) -> Result<Self> {
        let index = Self::new(embedder);
        index.add_documents(chunks).await?;
        Ok(index)
    }

    /// Open the index persisted in `dir`, or an empty one bound to `dir`
    /// if nothing has been written there yet.
    ///
    /// Fails when the stored index was built with a different embedding
    /// model or dimensionality than `embedder`.
    pub fn open(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        let mut index = Self::new(embedder);
        index.persist_dir = Some(dir.to_path_buf());

        if !path.exists() {
            debug!("No index at {}, starting empty", path.display());
            return Ok(index);
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read index file: {}", path.display()))?;
        let file: IndexFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse index file: {}", path.display()))?;

        let embedder = &index.embedder;
        if file.model != embedder.model_name() || file.dims != embedder.dims() {
            bail!(
                "Index at {} was built with model '{}' ({} dims) but the configured embedder is '{}' ({} dims). \
                 Delete the directory or re-run `ragline index` with the original embedding settings.",
                dir.display(),
                file.model,
                file.dims,
                embedder.model_name(),
                embedder.dims()
            );
        }

        info!("Loaded {} chunks from {}", file.entries.len(), path.display());
        index.entries = RwLock::new(file.entries);
        Ok(index)
    }

    /// Chunks per embedding call during [`add_documents`](VectorIndex::add_documents).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Report embedding progress while adding documents.
    pub fn with_progress(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.progress = Some(reporter);
        self
    }

    /// Write the index to its persist directory.
    pub fn persist(&self) -> Result<()> {
        let dir = self
            .persist_dir
            .as_deref()
            .ok_or_else(|| anyhow!("Index has no persist directory; open it with InMemoryIndex::open"))?;
        self.persist_to(dir)
    }

    /// Write the index to `dir/index.json`, creating `dir` if needed.
    pub fn persist_to(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create index directory: {}", dir.display()))?;

        let entries = self.read_entries()?;
        let json = serde_json::to_string(&IndexFileRef {
            model: self.embedder.model_name(),
            dims: self.embedder.dims(),
            entries: &entries,
        })?;
        let count = entries.len();
        drop(entries);

        let path = dir.join(INDEX_FILE);
        let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write index file: {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to write index file: {}", path.display()))?;

        info!("Persisted {} chunks to {}", count, path.display());
        Ok(())
    }

    fn read_entries(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<IndexEntry>>> {
        self.entries
            .read()
            .map_err(|_| anyhow!("Index lock poisoned"))
    }

    fn report(&self, event: IndexProgressEvent) {
        if let Some(reporter) = &self.progress {
            reporter.report(event);
        }
    }
}

fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

fn chunk_key(hash: String, doc: &Document) -> ChunkKey {
    let chunk_index = doc
        .metadata()
        .get(CHUNK_INDEX_KEY)
        .cloned()
        .unwrap_or_default();
    (hash, doc.source().unwrap_or_default().to_string(), chunk_index)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add_documents(&self, chunks: &[Document]) -> Result<usize> {
        let mut seen: HashSet<ChunkKey> = {
            let entries = self.read_entries()?;
            entries.iter().map(IndexEntry::key).collect()
        };

        let mut pending: Vec<(String, &Document)> = Vec::new();
        for chunk in chunks {
            let hash = content_hash(chunk.content());
            if seen.insert(chunk_key(hash.clone(), chunk)) {
                pending.push((hash, chunk));
            }
        }

        let skipped = chunks.len() - pending.len();
        if skipped > 0 {
            debug!("Skipping {} chunks already in the index", skipped);
        }
        if pending.is_empty() {
            return Ok(0);
        }

        let total = pending.len() as u64;
        let dims = self.embedder.dims();
        let mut added = 0usize;

        for batch in pending.chunks(self.batch_size) {
            let texts: Vec<String> = batch
                .iter()
                .map(|(_, doc)| doc.content().to_string())
                .collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                bail!(
                    "Embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                );
            }

            let mut new_entries = Vec::with_capacity(batch.len());
            for ((hash, doc), vector) in batch.iter().zip(vectors) {
                if vector.len() != dims {
                    bail!(
                        "Embedder '{}' returned a {}-dimensional vector, expected {}",
                        self.embedder.model_name(),
                        vector.len(),
                        dims
                    );
                }
                new_entries.push(IndexEntry {
                    id: uuid::Uuid::new_v4().to_string(),
                    hash: hash.clone(),
                    document: (*doc).clone(),
                    vector,
                });
            }

            {
                let mut entries = self
                    .entries
                    .write()
                    .map_err(|_| anyhow!("Index lock poisoned"))?;
                entries.extend(new_entries);
            }

            added += batch.len();
            self.report(IndexProgressEvent::Embedding {
                n: added as u64,
                total,
            });
        }

        Ok(added)
    }

    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = embed_query(self.embedder.as_ref(), query).await?;

        let entries = self.read_entries()?;
        let mut scored: Vec<(f32, &IndexEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(&query_vec, &e.vector), e))
            .collect();
        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        debug!(
            "Retrieved {} of {} chunks (top score {:.3})",
            scored.len(),
            entries.len(),
            scored.first().map(|(s, _)| *s).unwrap_or(0.0)
        );

        Ok(scored.into_iter().map(|(_, e)| e.document.clone()).collect())
    }

    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::new(64))
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("Rust is a systems programming language.", "rust.md"),
            Document::new("Bread is baked from flour, water and yeast.", "bread.md"),
            Document::new("Cargo builds Rust crates and manages dependencies.", "cargo.md"),
        ]
    }

    #[tokio::test]
    async fn test_build_and_search_ranks_related_first() {
        let index = InMemoryIndex::build(&corpus(), embedder()).await.unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.similarity_search("bread flour yeast", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source(), Some("bread.md"));
    }

    #[tokio::test]
    async fn test_k_larger_than_index() {
        let index = InMemoryIndex::build(&corpus(), embedder()).await.unwrap();
        let hits = index.similarity_search("rust", 10).await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let index = InMemoryIndex::new(embedder());
        assert!(index.is_empty());
        let hits = index.similarity_search("anything", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_chunks_are_skipped() {
        let index = InMemoryIndex::new(embedder());
        assert_eq!(index.add_documents(&corpus()).await.unwrap(), 3);
        assert_eq!(index.add_documents(&corpus()).await.unwrap(), 0);
        assert_eq!(index.len(), 3);

        // Same text under another source is a different chunk.
        let moved = vec![Document::new("Rust is a systems programming language.", "other.md")];
        assert_eq!(index.add_documents(&moved).await.unwrap(), 1);
        assert_eq!(index.len(), 4);
    }

    #[tokio::test]
    async fn test_repeated_passage_in_one_file_is_kept() {
        let index = InMemoryIndex::new(embedder());
        let doc = Document::new("Same paragraph.\n\nSame paragraph.", "notes.md");
        let chunks = crate::document::split_documents(&[doc], 20, 0);
        assert_eq!(chunks.len(), 2);

        assert_eq!(index.add_documents(&chunks).await.unwrap(), 2);
        assert_eq!(index.add_documents(&chunks).await.unwrap(), 0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_persist_without_directory_fails() {
        let index = InMemoryIndex::new(embedder());
        assert!(index.persist().is_err());
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        let hash = content_hash("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
