//! Verifier error types

use thiserror::Error;

/// Errors that can occur during verification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifierError {
    /// Response is not JSON
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Response is JSON but not shaped like a verdict list
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for VerifierError {
    fn from(err: serde_json::Error) -> Self {
        VerifierError::JsonParse(err.to_string())
    }
}
