//! Configuration for evidence selection

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Evidence Selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Sentences kept per source (K)
    ///
    /// Sources with at most 2K sentences skip ranking and return their first K.
    pub evidence_sentences: usize,

    /// Maximum evidence chunks per claim (one chunk per source)
    pub max_sources: usize,

    /// How long embedding stays disabled after a failure (seconds)
    pub embedding_cooldown_secs: u64,

    /// Maximum embedding calls in flight for one source
    pub max_concurrent_embeddings: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            evidence_sentences: 3,
            max_sources: 3,
            embedding_cooldown_secs: 300,
            max_concurrent_embeddings: 8,
        }
    }
}

impl EvidenceConfig {
    /// Aggressive preset: fewer sentences, longer cooldown, less fan-out
    pub fn aggressive() -> Self {
        Self {
            evidence_sentences: 2,
            max_sources: 2,
            embedding_cooldown_secs: 900,
            max_concurrent_embeddings: 4,
        }
    }

    /// Lenient preset: more context per source, shorter cooldown
    pub fn lenient() -> Self {
        Self {
            evidence_sentences: 5,
            max_sources: 3,
            embedding_cooldown_secs: 60,
            max_concurrent_embeddings: 16,
        }
    }

    /// Get the embedding cooldown as a Duration
    pub fn embedding_cooldown(&self) -> Duration {
        Duration::from_secs(self.embedding_cooldown_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.evidence_sentences == 0 {
            return Err("evidence_sentences must be greater than 0".to_string());
        }
        if self.max_sources == 0 {
            return Err("max_sources must be greater than 0".to_string());
        }
        if self.max_concurrent_embeddings == 0 {
            return Err("max_concurrent_embeddings must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
