//! Deterministic feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed with SHA-256; the first four
//! digest bytes pick a bucket and the fifth picks a sign. The bucket counts
//! are L2-normalised, so cosine similarity approximates term overlap.
//! Useful offline and in tests; it has no notion of meaning.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::Embedder;

pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket =
                u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize % self.dims;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_tokenize_lowercases_and_strips_punctuation() {
        assert_eq!(tokenize("What is Machine-Learning?"), vec!["what", "is", "machine", "learning"]);
    }

    #[test]
    fn test_deterministic_and_normalised() {
        let e = HashingEmbedder::new(64);
        let a = e.embed_one("Deep learning uses neural networks.");
        let b = e.embed_one("Deep learning uses neural networks.");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_terms_score_higher() {
        let e = HashingEmbedder::new(256);
        let query = e.embed_one("What is machine learning?");
        let related = e.embed_one("Machine learning is a subset of AI.");
        let unrelated = e.embed_one("Kubernetes schedules containers onto nodes.");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(8);
        assert!(e.embed_one("  ...  ").iter().all(|x| *x == 0.0));
    }
}
