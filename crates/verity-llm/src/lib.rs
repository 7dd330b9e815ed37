//! Verity LLM Provider Layer
//!
//! Implementations of the `LlmProvider` and `EmbeddingModel` traits from
//! `verity-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OllamaProvider`: Local Ollama API integration (generation and embeddings)
//!
//! The [`json`] module holds the helpers every oracle parser uses to read
//! JSON out of completions.
//!
//! # Examples
//!
//! ```
//! use verity_llm::MockProvider;
//! use verity_domain::traits::LlmProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod json;
pub mod ollama;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use verity_domain::traits::{LlmProvider, ProviderError};

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider throttled the request
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Provider-supplied wait hint
        retry_after: Option<Duration>,
    },

    /// Provider quota is used up
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl ProviderError for LlmError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    fn is_quota_exhausted(&self) -> bool {
        matches!(self, LlmError::QuotaExhausted(_))
    }
}

/// One scripted reply
#[derive(Debug, Clone)]
struct Rule {
    fragment: String,
    reply: Result<String, LlmError>,
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<Rule>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen by the first scripted rule whose fragment occurs in
/// the prompt, in the order rules were added. Rules can be limited to a number
/// of uses, which makes "fail twice, then succeed" sequences easy to script.
/// When no rule matches, the default response is returned.
///
/// # Examples
///
/// ```
/// use verity_llm::{LlmError, MockProvider};
/// use verity_domain::traits::LlmProvider;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::default();
/// provider.add_response("categorize", "[]");
/// provider.add_error_times("verify", LlmError::RateLimited { retry_after: None }, 1);
/// provider.add_response("verify", "{}");
///
/// assert_eq!(provider.generate("please categorize this").await.unwrap(), "[]");
/// assert!(provider.generate("verify claim").await.is_err());
/// assert_eq!(provider.generate("verify claim").await.unwrap(), "{}");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    model_name: String,
    latency: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            model_name: "mock".to_string(),
            latency: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Delay every reply by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Reply with `response` whenever the prompt contains `fragment`
    pub fn add_response(&self, fragment: impl Into<String>, response: impl Into<String>) {
        self.push_rule(fragment.into(), Ok(response.into()), None);
    }

    /// Reply with `response` the next `times` prompts containing `fragment`
    pub fn add_response_times(
        &self,
        fragment: impl Into<String>,
        response: impl Into<String>,
        times: usize,
    ) {
        self.push_rule(fragment.into(), Ok(response.into()), Some(times));
    }

    /// Fail every prompt containing `fragment`
    pub fn add_error(&self, fragment: impl Into<String>, error: LlmError) {
        self.push_rule(fragment.into(), Err(error), None);
    }

    /// Fail the next `times` prompts containing `fragment`
    pub fn add_error_times(&self, fragment: impl Into<String>, error: LlmError, times: usize) {
        self.push_rule(fragment.into(), Err(error), Some(times));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Number of prompts received that contained `fragment`
    pub fn calls_containing(&self, fragment: &str) -> usize {
        self.lock()
            .prompts
            .iter()
            .filter(|p| p.contains(fragment))
            .count()
    }

    /// All prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn push_rule(&self, fragment: String, reply: Result<String, LlmError>, remaining: Option<usize>) {
        self.lock().rules.push(Rule {
            fragment,
            reply,
            remaining,
        });
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply(&self, prompt: &str) -> Result<String, LlmError> {
        let mut state = self.lock();
        state.prompts.push(prompt.to_string());

        let matched = state.rules.iter_mut().find(|rule| {
            rule.remaining != Some(0) && prompt.contains(rule.fragment.as_str())
        });

        match matched {
            Some(rule) => {
                if let Some(remaining) = rule.remaining.as_mut() {
                    *remaining -= 1;
                }
                rule.reply.clone()
            }
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let reply = self.reply(prompt);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        reply
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt").await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_fragment_responses() {
        let provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("say hello").await.unwrap(), "world");
        assert_eq!(provider.generate("foo fighters").await.unwrap(), "bar");
        assert_eq!(provider.generate("unknown").await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_first_rule_wins() {
        let provider = MockProvider::default();
        provider.add_response("claim", "first");
        provider.add_response("claim", "second");
        assert_eq!(provider.generate("claim").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_mock_provider_limited_rules_expire() {
        let provider = MockProvider::new("fallback");
        provider.add_error_times("x", LlmError::RateLimited { retry_after: None }, 2);

        assert!(provider.generate("x").await.is_err());
        assert!(provider.generate("x").await.is_err());
        assert_eq!(provider.generate("x").await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn test_mock_provider_call_tracking() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate("alpha prompt").await.unwrap();
        provider.generate("beta prompt").await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls_containing("alpha"), 1);
        assert_eq!(provider.prompts()[1], "beta prompt");
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_json_defaults_to_generate() {
        let provider = MockProvider::new("{}");
        assert_eq!(provider.generate_json("prompt").await.unwrap(), "{}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_provider_latency() {
        let provider = MockProvider::new("slow").with_latency(Duration::from_secs(5));
        let start = tokio::time::Instant::now();
        provider.generate("p").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn test_error_classification() {
        let limited = LlmError::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert!(limited.is_rate_limited());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(7)));
        assert!(!limited.is_quota_exhausted());

        let quota = LlmError::QuotaExhausted("daily limit".to_string());
        assert!(quota.is_quota_exhausted());
        assert!(!quota.is_rate_limited());
        assert_eq!(quota.retry_after(), None);
    }
}
