//! Embedding support for relevance ranking
//!
//! This module provides the similarity measure used to rank evidence, the
//! error type for embedding failures, and a deterministic mock model.
//!
//! # Architecture
//!
//! - **MockEmbeddingModel**: Hashed bag-of-words embeddings, deterministic and
//!   cheap, with texts sharing words landing close together
//! - Real models implement `verity_domain::traits::EmbeddingModel`
//!   (see `verity_llm::OllamaProvider`)
//!
//! # Examples
//!
//! ```
//! use verity_evidence::embedding::{cosine_similarity, MockEmbeddingModel};
//! use verity_domain::traits::EmbeddingModel;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let model = MockEmbeddingModel::new(128);
//! let a = model.embed("the sky is blue").await.unwrap();
//! let b = model.embed("the sky is blue").await.unwrap();
//! assert_eq!(a, b);
//! assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
//! # }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use verity_domain::traits::{EmbeddingModel, ProviderError};

/// Errors that can occur during embedding generation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    /// Embedding quota is used up
    #[error("Embedding quota exhausted")]
    QuotaExhausted,

    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ProviderError for EmbeddingError {
    fn is_rate_limited(&self) -> bool {
        false
    }

    fn is_quota_exhausted(&self) -> bool {
        matches!(self, EmbeddingError::QuotaExhausted)
    }
}

/// Mock embedding model for testing
///
/// Each lowercase word is hashed into one of `dimension` buckets and the
/// resulting count vector is normalized to unit length. The embeddings are:
///
/// - **Deterministic**: Same text always produces same embedding
/// - **Normalized**: All vectors have unit length
/// - **Lexical**: Texts that share words have higher cosine similarity
///
/// A model can be scripted to fail every call, for exercising fallbacks.
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    dimension: usize,
    failure: Option<EmbeddingError>,
    calls: Arc<AtomicUsize>,
}

impl MockEmbeddingModel {
    /// Create a new mock embedding model
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A model whose every call fails with `error`
    pub fn failing(dimension: usize, error: EmbeddingError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(dimension)
        }
    }

    /// Get the number of times embed was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Get the dimension of embeddings produced by this model
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn bucket(&self, word: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            embedding[self.bucket(&word.to_lowercase())] += 1.0;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }
        embedding
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    type Error = EmbeddingError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }
        Ok(self.vectorize(text))
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in `[-1, 1]`, or `0.0` when either vector is empty, the
/// lengths differ, or either vector has zero magnitude. The measure is
/// symmetric in its arguments.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_deterministic() {
        let model = MockEmbeddingModel::new(384);

        let text = "The quick brown fox jumps over the lazy dog";
        let embedding1 = model.embed(text).await.unwrap();
        let embedding2 = model.embed(text).await.unwrap();

        assert_eq!(embedding1, embedding2, "Same text should produce same embedding");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_embedding_normalized() {
        let model = MockEmbeddingModel::new(384);
        let embedding = model.embed("test text").await.unwrap();

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001, "Embedding should be normalized");
    }

    #[tokio::test]
    async fn test_shared_words_rank_higher() {
        let model = MockEmbeddingModel::new(512);
        let claim = model.embed("iPhone 15 released September 2023").await.unwrap();
        let related = model.embed("The iPhone 15 was released in September 2023.").await.unwrap();
        let unrelated = model.embed("Bananas are rich in potassium.").await.unwrap();

        assert!(cosine_similarity(&claim, &related) > cosine_similarity(&claim, &unrelated));
    }

    #[tokio::test]
    async fn test_mock_embedding_empty_text() {
        let model = MockEmbeddingModel::new(384);
        let result = model.embed("  ").await;
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_failing_model() {
        let model = MockEmbeddingModel::failing(16, EmbeddingError::QuotaExhausted);
        let err = model.embed("anything").await.unwrap_err();
        assert!(err.is_quota_exhausted());
        assert_eq!(model.call_count(), 1);
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let vec = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&vec, &vec) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(similarity.abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((similarity + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_symmetric() {
        let a = [0.3, -1.2, 4.0, 0.5];
        let b = [2.0, 0.1, -0.7, 1.1];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }
}
