//! Relevance ranking of source sentences against a claim

use crate::config::EvidenceConfig;
use crate::embedding::cosine_similarity;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};
use verity_domain::traits::{EmbeddingModel, ProviderError};
use verity_domain::{split_sentences, EvidenceChunk, SourceDocument};

/// Selects the most relevant sentences of each source for a claim
///
/// The selector remembers embedding failures: after one, embedding is
/// skipped for every call until the cooldown elapses.
pub struct EvidenceSelector<E>
where
    E: EmbeddingModel,
{
    model: Arc<E>,
    config: EvidenceConfig,
    cooldown_until: Mutex<Option<Instant>>,
}

impl<E> EvidenceSelector<E>
where
    E: EmbeddingModel + 'static,
{
    /// Create a new selector
    pub fn new(model: E, config: EvidenceConfig) -> Self {
        Self::from_shared(Arc::new(model), config)
    }

    /// Create a selector around a shared embedding model
    pub fn from_shared(model: Arc<E>, config: EvidenceConfig) -> Self {
        Self {
            model,
            config,
            cooldown_until: Mutex::new(None),
        }
    }

    /// Get the selector configuration
    pub fn config(&self) -> &EvidenceConfig {
        &self.config
    }

    /// Pick evidence for `claim` from `sources`
    ///
    /// Returns at most `max_sources` chunks, one per source with at least one
    /// sentence, in the order the sources were given.
    pub async fn select(&self, claim: &str, sources: &[SourceDocument]) -> Vec<EvidenceChunk> {
        let k = self.config.evidence_sentences;
        let mut claim_embedding: Option<Vec<f32>> = None;
        let mut chunks = Vec::new();

        for source in sources {
            if chunks.len() >= self.config.max_sources {
                break;
            }

            let sentences = split_sentences(&source.content);
            if sentences.is_empty() {
                debug!("Source '{}' has no sentences, skipping", source.source_id);
                continue;
            }

            if sentences.len() <= 2 * k {
                chunks.push(positional_chunk(source, sentences, k));
                continue;
            }

            if self.is_cooling_down() {
                debug!("Embedding cooldown active, using first {} sentences of '{}'", k, source.source_id);
                chunks.push(positional_chunk(source, sentences, k));
                continue;
            }

            match self.rank(claim, &mut claim_embedding, &sentences).await {
                Ok(picked) => chunks.push(ranked_chunk(source, &sentences, picked)),
                Err(e) => {
                    warn!(
                        "Embedding failed for source '{}' ({}), falling back to first {} sentences",
                        source.source_id, e, k
                    );
                    self.start_cooldown();
                    chunks.push(positional_chunk(source, sentences, k));
                }
            }
        }

        chunks
    }

    /// Whether embedding is currently disabled after a failure
    pub fn is_cooling_down(&self) -> bool {
        let mut until = self
            .cooldown_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match *until {
            Some(deadline) if Instant::now() < deadline => true,
            Some(_) => {
                *until = None;
                false
            }
            None => false,
        }
    }

    fn start_cooldown(&self) {
        let deadline = Instant::now() + self.config.embedding_cooldown();
        *self
            .cooldown_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(deadline);
    }

    /// Rank sentences by similarity; returns (index, score) of the top K
    async fn rank(
        &self,
        claim: &str,
        claim_embedding: &mut Option<Vec<f32>>,
        sentences: &[String],
    ) -> Result<Vec<(usize, f32)>, RankError> {
        let claim_vector = match claim_embedding {
            Some(vector) => vector.clone(),
            None => {
                let vector = embed_checked(self.model.as_ref(), claim).await?;
                *claim_embedding = Some(vector.clone());
                vector
            }
        };

        let sentence_vectors = self.embed_all(sentences).await?;

        let mut scored: Vec<(usize, f32)> = sentence_vectors
            .iter()
            .enumerate()
            .map(|(idx, vector)| (idx, cosine_similarity(&claim_vector, vector)))
            .collect();

        // Stable sort: equal scores keep document order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.config.evidence_sentences);
        scored.sort_by_key(|(idx, _)| *idx);

        Ok(scored)
    }

    /// Embed every sentence with bounded concurrency, preserving order
    async fn embed_all(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, RankError> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_embeddings));
        let mut tasks = JoinSet::new();

        for (idx, sentence) in sentences.iter().enumerate() {
            let model = Arc::clone(&self.model);
            let permits = Arc::clone(&permits);
            let sentence = sentence.clone();
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| RankError::Join(e.to_string()))?;
                embed_checked(model.as_ref(), &sentence)
                    .await
                    .map(|vector| (idx, vector))
            });
        }

        let mut vectors = vec![Vec::new(); sentences.len()];
        while let Some(joined) = tasks.join_next().await {
            let (idx, vector) = joined.map_err(|e| RankError::Join(e.to_string()))??;
            vectors[idx] = vector;
        }
        Ok(vectors)
    }
}

#[derive(Debug, Error)]
enum RankError {
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("{0}")]
    Embedding(String),

    #[error("embedding task failed: {0}")]
    Join(String),
}

/// Embed one text, treating an empty vector as a failure
async fn embed_checked<E: EmbeddingModel>(model: &E, text: &str) -> Result<Vec<f32>, RankError> {
    match model.embed(text).await {
        Ok(vector) if vector.is_empty() => Err(RankError::Embedding("empty embedding".to_string())),
        Ok(vector) => Ok(vector),
        Err(e) if e.is_quota_exhausted() => Err(RankError::QuotaExhausted(e.to_string())),
        Err(e) => Err(RankError::Embedding(e.to_string())),
    }
}

fn positional_chunk(source: &SourceDocument, mut sentences: Vec<String>, k: usize) -> EvidenceChunk {
    sentences.truncate(k);
    EvidenceChunk {
        source_id: source.source_id.clone(),
        sentences,
        relevance_score: None,
    }
}

fn ranked_chunk(source: &SourceDocument, sentences: &[String], picked: Vec<(usize, f32)>) -> EvidenceChunk {
    let relevance_score = if picked.is_empty() {
        None
    } else {
        Some(picked.iter().map(|(_, score)| score).sum::<f32>() / picked.len() as f32)
    };

    EvidenceChunk {
        source_id: source.source_id.clone(),
        sentences: picked.iter().map(|(idx, _)| sentences[*idx].clone()).collect(),
        relevance_score,
    }
}
