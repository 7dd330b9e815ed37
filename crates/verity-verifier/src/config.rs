//! Verifier configuration

use serde::{Deserialize, Serialize};

/// Configuration for verdict requests and response validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Claims sent in one verification call
    pub claims_per_call: usize,

    /// Evidence chunks (one per source) included per claim
    pub max_evidence_chunks: usize,

    /// Longest accepted reason, in characters
    pub max_reason_chars: usize,

    /// Most references accepted per verdict
    pub max_references: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            claims_per_call: 1,
            max_evidence_chunks: 3,
            max_reason_chars: 500,
            max_references: 3,
        }
    }
}

impl VerifierConfig {
    /// Aggressive preset: smaller prompts, terse reasons
    pub fn aggressive() -> Self {
        Self {
            claims_per_call: 1,
            max_evidence_chunks: 2,
            max_reason_chars: 280,
            max_references: 2,
        }
    }

    /// Lenient preset: batches claims and allows longer reasons
    pub fn lenient() -> Self {
        Self {
            claims_per_call: 4,
            max_evidence_chunks: 3,
            max_reason_chars: 1_000,
            max_references: 3,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.claims_per_call == 0 {
            return Err("claims_per_call must be greater than 0".to_string());
        }
        if self.max_evidence_chunks == 0 {
            return Err("max_evidence_chunks must be greater than 0".to_string());
        }
        if self.max_reason_chars == 0 {
            return Err("max_reason_chars must be greater than 0".to_string());
        }
        if self.max_references > 3 {
            return Err("max_references cannot exceed 3".to_string());
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VerifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.claims_per_call, 1);
        assert_eq!(config.max_references, 3);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(VerifierConfig::aggressive().validate().is_ok());
        assert!(VerifierConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_reference_limit_capped() {
        let config = VerifierConfig {
            max_references: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = VerifierConfig::lenient();
        let parsed = VerifierConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
