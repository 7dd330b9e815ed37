//! Fact-check configuration
//!
//! One file configures every stage:
//!
//! ```toml
//! max_concurrent_claims = 4
//! max_urls_per_claim = 5
//!
//! [extractor]
//! max_text_length = 50000
//! # ...
//!
//! [evidence]
//! evidence_sentences = 3
//! # ...
//!
//! [scheduler]
//! requests_per_minute = 60
//! # ...
//!
//! [verifier]
//! max_reason_chars = 500
//! # ...
//! ```
//!
//! Missing tables fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use verity_evidence::EvidenceConfig;
use verity_extractor::ExtractorConfig;
use verity_scheduler::SchedulerConfig;
use verity_verifier::VerifierConfig;

/// Configuration for a [`FactChecker`](crate::FactChecker)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckConfig {
    /// Claims whose search, fetch and evidence selection run at once
    #[serde(default = "default_max_concurrent_claims")]
    pub max_concurrent_claims: usize,

    /// Search results fetched per claim
    #[serde(default = "default_max_urls_per_claim")]
    pub max_urls_per_claim: usize,

    /// Claim extraction settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Evidence selection settings
    #[serde(default)]
    pub evidence: EvidenceConfig,

    /// Rate limiting and retry settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Verification settings
    #[serde(default)]
    pub verifier: VerifierConfig,
}

fn default_max_concurrent_claims() -> usize {
    4
}

fn default_max_urls_per_claim() -> usize {
    5
}

impl Default for FactCheckConfig {
    fn default() -> Self {
        Self {
            max_concurrent_claims: default_max_concurrent_claims(),
            max_urls_per_claim: default_max_urls_per_claim(),
            extractor: ExtractorConfig::default(),
            evidence: EvidenceConfig::default(),
            scheduler: SchedulerConfig::default(),
            verifier: VerifierConfig::default(),
        }
    }
}

impl FactCheckConfig {
    /// Aggressive preset for every stage, with little fan-out
    pub fn aggressive() -> Self {
        Self {
            max_concurrent_claims: 2,
            max_urls_per_claim: 3,
            extractor: ExtractorConfig::aggressive(),
            evidence: EvidenceConfig::aggressive(),
            scheduler: SchedulerConfig::aggressive(),
            verifier: VerifierConfig::aggressive(),
        }
    }

    /// Lenient preset for every stage, with wide fan-out
    pub fn lenient() -> Self {
        Self {
            max_concurrent_claims: 16,
            max_urls_per_claim: 8,
            extractor: ExtractorConfig::lenient(),
            evidence: EvidenceConfig::lenient(),
            scheduler: SchedulerConfig::lenient(),
            verifier: VerifierConfig::lenient(),
        }
    }

    /// Validate this configuration and every stage's configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_claims == 0 {
            return Err("max_concurrent_claims must be greater than 0".to_string());
        }
        if self.max_urls_per_claim == 0 {
            return Err("max_urls_per_claim must be greater than 0".to_string());
        }
        self.extractor.validate().map_err(|e| format!("[extractor] {}", e))?;
        self.evidence.validate().map_err(|e| format!("[evidence] {}", e))?;
        self.scheduler.validate().map_err(|e| format!("[scheduler] {}", e))?;
        self.verifier.validate().map_err(|e| format!("[verifier] {}", e))?;
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        Self::from_toml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_presets_are_valid() {
        assert!(FactCheckConfig::default().validate().is_ok());
        assert!(FactCheckConfig::aggressive().validate().is_ok());
        assert!(FactCheckConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_missing_tables_use_defaults() {
        let config = FactCheckConfig::from_toml(
            r#"
            max_concurrent_claims = 8

            [scheduler]
            requests_per_minute = 10
            tokens_per_minute = 20000
            window_secs = 60
            cooldown_ms = 500
            idle_poll_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.max_concurrent_claims, 8);
        assert_eq!(config.max_urls_per_claim, 5);
        assert_eq!(config.scheduler.requests_per_minute, 10);
        assert_eq!(config.scheduler.retry.max_retries, 3);
        assert_eq!(config.verifier, VerifierConfig::default());
        assert_eq!(config.evidence.evidence_sentences, 3);
    }

    #[test]
    fn test_stage_errors_name_their_table() {
        let mut config = FactCheckConfig::default();
        config.verifier.claims_per_call = 0;
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("[verifier]"), "{}", err);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = FactCheckConfig::aggressive();
        let parsed = FactCheckConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.max_concurrent_claims, 2);
        assert_eq!(parsed.verifier, config.verifier);
        assert_eq!(parsed.scheduler.requests_per_minute, config.scheduler.requests_per_minute);
    }

    #[test]
    fn test_load_missing_file() {
        let result = FactCheckConfig::load("/nonexistent/verity.toml");
        assert!(result.unwrap_err().contains("Failed to read config file"));
    }
}
