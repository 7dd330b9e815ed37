//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local API for both text generation
//! (`/api/generate`) and embeddings (`/api/embeddings`).
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama API
//! - JSON mode for structured oracle prompts
//! - Throttling responses surfaced as `LlmError::RateLimited` with the
//!   `Retry-After` hint, so the caller's retry policy decides what to do
//! - One HTTP request per call by default. Transport failures and 5xx
//!   responses surface as `LlmError::Communication` for the scheduler's retry
//!   policy, so every attempt is charged to its request window
//!
//! # Examples
//!
//! ```no_run
//! use verity_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1")
//!     .unwrap()
//!     .with_embedding_model("nomic-embed-text");
//! ```

use crate::LlmError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use verity_domain::traits::{EmbeddingModel, LlmProvider};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of HTTP attempts per call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    embedding_model: String,
    client: reqwest::Client,
    max_attempts: u32,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Request body for Ollama embeddings API
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// The generation model is also used for embeddings until
    /// [`with_embedding_model`](Self::with_embedding_model) is called.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Other` if the HTTP client cannot be constructed.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let model = model.into();
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            embedding_model: model.clone(),
            model,
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Use a dedicated model for embeddings
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set the number of HTTP attempts for transport failures and 5xx
    ///
    /// Keep the default of 1 when calls go through a `Scheduler`: extra
    /// attempts made here are not counted against its request budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    async fn complete(&self, prompt: &str, format: Option<&str>) -> Result<String, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
        };
        let response: GenerateResponse = self.post_json("/api/generate", &body, &self.model).await?;
        Ok(response.response)
    }

    /// POST a JSON body, repeating transport failures and 5xx up to `max_attempts` times
    async fn post_json<B, R>(&self, path: &str, body: &B, model: &str) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint, path);
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                debug!(attempt, ?delay, "retrying Ollama request to {}", path);
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&url).json(body).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, "Ollama request failed");
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<R>()
                    .await
                    .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)));
            }
            if status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                last_error = Some(LlmError::Communication(format!("HTTP {}: {}", status, text)));
                continue;
            }
            return Err(classify_failure(response, model).await);
        }

        Err(last_error.unwrap_or_else(|| LlmError::Communication("No attempt made".to_string())))
    }
}

/// Map a non-retryable HTTP failure onto the error taxonomy
async fn classify_failure(response: Response, model: &str) -> LlmError {
    let status = response.status();
    let retry_after = parse_retry_after(&response);
    let text = response.text().await.unwrap_or_default();
    classify_status(status, retry_after, &text, model)
}

fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
    model: &str,
) -> LlmError {
    let mentions_quota = body.to_ascii_lowercase().contains("quota");
    match status {
        StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        StatusCode::TOO_MANY_REQUESTS if mentions_quota => LlmError::QuotaExhausted(body.to_string()),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { retry_after },
        StatusCode::FORBIDDEN if mentions_quota => LlmError::QuotaExhausted(body.to_string()),
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

/// Read a `Retry-After` header given in seconds
fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after_value)
}

fn parse_retry_after_value(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

impl LlmProvider for OllamaProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.complete(prompt, None).await
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, Self::Error> {
        self.complete(prompt, Some("json")).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

impl EmbeddingModel for OllamaProvider {
    type Error = LlmError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };
        let response: EmbeddingResponse = self
            .post_json("/api/embeddings", &body, &self.embedding_model)
            .await?;

        if response.embedding.is_empty() {
            return Err(LlmError::InvalidResponse("Empty embedding".to_string()));
        }
        Ok(response.embedding)
    }
}
