//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the verification core and the
//! services it consumes. Implementations live in other crates (`verity-llm`)
//! or in the request-handling glue that embeds the pipeline.
//!
//! Methods return `impl Future + Send` so implementors can write plain
//! `async fn` while callers can still spawn the futures onto a multi-threaded
//! runtime.

use crate::evidence::SourceDocument;
use std::future::Future;
use std::time::Duration;

/// Classification of provider failures
///
/// The scheduler's retry policy and the evidence selector's cooldown only need
/// to know *what kind* of failure happened, not which provider produced it.
pub trait ProviderError: std::error::Error + Send + Sync + 'static {
    /// The provider signalled throttling (HTTP 429 or equivalent)
    fn is_rate_limited(&self) -> bool;

    /// Provider-supplied hint for how long to wait before retrying
    fn retry_after(&self) -> Option<Duration> {
        None
    }

    /// The provider reported that its quota is used up
    fn is_quota_exhausted(&self) -> bool {
        false
    }
}

/// Trait for LLM provider operations
///
/// Every oracle (classification, rewrite, disambiguation, implicit claims and
/// verification) is a prompt in, completion out call through this trait.
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: ProviderError;

    /// Generate a text completion
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Generate a completion constrained to JSON output (if supported)
    ///
    /// Providers without a JSON mode fall back to plain generation.
    fn generate_json(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send {
        self.generate(prompt)
    }

    /// Name of the model backing this provider
    fn model_name(&self) -> &str;
}

/// Trait for text embedding services
pub trait EmbeddingModel: Send + Sync {
    /// Error type for embedding operations
    type Error: ProviderError;

    /// Embed one text
    ///
    /// An empty vector is a failure signal, not a valid embedding.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, Self::Error>> + Send;
}

/// Where a content item comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A page, post or video to extract text from
    Url(String),

    /// Text supplied directly
    Text(String),
}

/// Output of a content extractor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Plain-text body (empty content is a precondition failure)
    pub content: String,

    /// Title, when the source has one
    pub title: Option<String>,

    /// Short excerpt or description
    pub excerpt: Option<String>,
}

/// Trait for turning a URL or raw text into plain content
pub trait ContentExtractor: Send + Sync {
    /// Error type for extraction
    type Error: std::error::Error + Send + Sync + 'static;

    /// Extract content from a source
    fn extract(
        &self,
        source: &ContentSource,
    ) -> impl Future<Output = Result<ExtractedContent, Self::Error>> + Send;
}

/// Trait for web search providers
pub trait SearchProvider: Send + Sync {
    /// Error type for search
    type Error: std::error::Error + Send + Sync + 'static;

    /// Candidate URLs for a claim (zero or more, in no guaranteed order)
    fn search(&self, claim: &str) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;
}

/// Trait for fetching and scraping a candidate source
pub trait SourceFetcher: Send + Sync {
    /// Error type for fetching
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch a URL and return its text content
    fn fetch(&self, url: &str) -> impl Future<Output = Result<SourceDocument, Self::Error>> + Send;
}

/// Pass-through extractor for content supplied as text
///
/// URLs are rejected; wire a real extractor for those.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

/// Error returned by [`PlainTextExtractor`] for URL sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedSource(pub String);

impl std::fmt::Display for UnsupportedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unsupported content source: {}", self.0)
    }
}

impl std::error::Error for UnsupportedSource {}

impl ContentExtractor for PlainTextExtractor {
    type Error = UnsupportedSource;

    async fn extract(&self, source: &ContentSource) -> Result<ExtractedContent, Self::Error> {
        match source {
            ContentSource::Text(text) => Ok(ExtractedContent {
                content: text.clone(),
                title: None,
                excerpt: None,
            }),
            ContentSource::Url(url) => Err(UnsupportedSource(url.clone())),
        }
    }
}
