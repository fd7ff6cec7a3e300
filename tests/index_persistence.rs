use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use ragline::embedding::{Embedder, HashingEmbedder};
use ragline::index::{InMemoryIndex, VectorIndex, INDEX_FILE};
use ragline::models::Document;

fn embedder(dims: usize) -> Arc<dyn Embedder> {
    Arc::new(HashingEmbedder::new(dims))
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new("Tokio is an asynchronous runtime for Rust.", "tokio.md"),
        Document::new("Serde serializes and deserializes Rust data structures.", "serde.md"),
        Document::new("Sourdough bread needs a starter culture.", "bread.md"),
    ]
}

#[tokio::test]
async fn persisted_index_reloads_with_same_results() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("rag_index");

    let index = InMemoryIndex::open(&dir, embedder(128)).unwrap();
    assert!(index.is_empty());
    assert_eq!(index.add_documents(&corpus()).await.unwrap(), 3);
    index.persist().unwrap();
    assert!(dir.join(INDEX_FILE).exists());

    let before = index.similarity_search("asynchronous runtime", 2).await.unwrap();

    let reopened = InMemoryIndex::open(&dir, embedder(128)).unwrap();
    assert_eq!(reopened.len(), 3);
    let after = reopened.similarity_search("asynchronous runtime", 2).await.unwrap();

    assert_eq!(before, after);
    assert_eq!(after[0].source(), Some("tokio.md"));
}

#[tokio::test]
async fn reindexing_same_documents_adds_nothing() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("idx");

    let index = InMemoryIndex::open(&dir, embedder(64)).unwrap();
    index.add_documents(&corpus()).await.unwrap();
    index.persist().unwrap();

    let reopened = InMemoryIndex::open(&dir, embedder(64)).unwrap();
    assert_eq!(reopened.add_documents(&corpus()).await.unwrap(), 0);
    assert_eq!(reopened.len(), 3);
}

#[tokio::test]
async fn mismatched_embedder_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("idx");

    let index = InMemoryIndex::open(&dir, embedder(64)).unwrap();
    index.add_documents(&corpus()).await.unwrap();
    index.persist().unwrap();

    let err = InMemoryIndex::open(&dir, embedder(32)).err().unwrap();
    assert!(err.to_string().contains("was built with model"));
}

#[test]
fn corrupt_index_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(INDEX_FILE), "{ not json").unwrap();
    assert!(InMemoryIndex::open(tmp.path(), embedder(64)).is_err());
}

#[tokio::test]
async fn index_file_records_model_and_dims() {
    let tmp = TempDir::new().unwrap();
    let index = InMemoryIndex::build(&corpus(), embedder(16)).await.unwrap();
    index.persist_to(tmp.path()).unwrap();

    let raw = fs::read_to_string(tmp.path().join(INDEX_FILE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["model"], "hashing");
    assert_eq!(json["dims"], 16);
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["document"]["metadata"]["source"], "tokio.md");
    assert_eq!(entries[0]["vector"].as_array().unwrap().len(), 16);
}
