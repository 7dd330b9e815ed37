//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum sentences processed per content item; the rest are dropped
    pub max_sentences: usize,

    /// Maximum time for a single oracle call (seconds)
    pub oracle_timeout_secs: u64,

    /// Whether rhetorical sentences are mined for implicit claims
    pub implicit_claims: bool,

    /// How many times derived sentences are mined again for implicit claims
    pub implicit_claim_depth: usize,

    /// Maximum implicit claims kept per parent sentence
    pub max_implicit_claims_per_sentence: usize,
}

impl ExtractorConfig {
    /// Get the oracle timeout as a Duration
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.max_sentences == 0 {
            return Err("max_sentences must be greater than 0".to_string());
        }
        if self.oracle_timeout_secs == 0 {
            return Err("oracle_timeout_secs must be greater than 0".to_string());
        }
        if self.implicit_claims && self.implicit_claim_depth == 0 {
            return Err("implicit_claim_depth must be at least 1 when implicit_claims is enabled".to_string());
        }
        if self.implicit_claims && self.max_implicit_claims_per_sentence == 0 {
            return Err("max_implicit_claims_per_sentence must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 50_000,
            max_sentences: 200,
            oracle_timeout_secs: 120,
            implicit_claims: true,
            implicit_claim_depth: 1,
            max_implicit_claims_per_sentence: 3,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: shorter inputs and timeouts, no implicit claims
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 20_000,
            max_sentences: 80,
            oracle_timeout_secs: 60,
            implicit_claims: false,
            implicit_claim_depth: 1,
            max_implicit_claims_per_sentence: 1,
        }
    }

    /// Lenient preset: longer inputs and timeouts, more implicit claims
    pub fn lenient() -> Self {
        Self {
            max_text_length: 100_000,
            max_sentences: 500,
            oracle_timeout_secs: 300,
            implicit_claims: true,
            implicit_claim_depth: 2,
            max_implicit_claims_per_sentence: 5,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str)
            .map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.implicit_claims);
        assert_eq!(config.implicit_claim_depth, 1);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_max_text_length() {
        let mut config = ExtractorConfig::default();
        config.max_text_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_depth_only_invalid_when_enabled() {
        let mut config = ExtractorConfig::default();
        config.implicit_claim_depth = 0;
        assert!(config.validate().is_err());

        config.implicit_claims = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parse() {
        let config = ExtractorConfig::from_toml(
            r#"
            max_text_length = 1000
            max_sentences = 10
            oracle_timeout_secs = 5
            implicit_claims = false
            implicit_claim_depth = 1
            max_implicit_claims_per_sentence = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.max_sentences, 10);
        assert_eq!(config.oracle_timeout(), Duration::from_secs(5));
        assert!(!config.implicit_claims);
        assert!(config.to_toml().unwrap().contains("max_sentences = 10"));
    }
}
