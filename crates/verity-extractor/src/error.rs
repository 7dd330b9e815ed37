//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
///
/// Only precondition failures surface from [`Extractor::extract`](crate::Extractor::extract);
/// oracle errors are absorbed into per-sentence fallbacks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Content item has no text
    #[error("Content is empty")]
    EmptyContent,

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Oracle call timed out
    #[error("Oracle timeout")]
    Timeout,

    /// Oracle response did not have the expected shape
    #[error("Invalid oracle response: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
