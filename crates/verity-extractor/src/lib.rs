//! Verity Extractor
//!
//! Turns a content item into final, checkable claims.
//!
//! # Overview
//!
//! Every sentence of the input goes through a five-stage pipeline. The first
//! four stages are judgment calls to an LLM oracle, batched per content item;
//! the last is a pure, deterministic selection rule.
//!
//! # Architecture
//!
//! ```text
//! Text → sentences → categorize → implicit claims → rewrite → disambiguate → select → claims
//!                        ↑               │
//!                        └── derived ────┘
//! ```
//!
//! # Key Features
//!
//! - **Categorization**: Verifiable / partially verifiable / not verifiable, one category per sentence
//! - **Implicit Claims**: Rhetorical sentences surface the claims they imply, which are categorized in turn
//! - **Rewrite**: Hedging and opinion stripped from partially verifiable sentences
//! - **Disambiguation**: Ambiguous candidates are resolved from context or dropped
//! - **Graceful Degradation**: A failed oracle call degrades its sentences, never the run
//!
//! # Example Usage
//!
//! ```
//! use verity_extractor::{prompt, Extractor, ExtractorConfig, ExtractionRequest};
//! use verity_llm::MockProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::default();
//! llm.add_response(prompt::CATEGORIZE_TASK, r#"[{"id": 0, "category": "verifiable"}]"#);
//! llm.add_response(prompt::DISAMBIGUATE_TASK, r#"[{"id": 0, "is_ambiguous": false}]"#);
//!
//! let extractor = Extractor::new(llm, ExtractorConfig::default());
//! let result = extractor
//!     .extract(ExtractionRequest::new("Water boils at 100 degrees Celsius at sea level.", "doc_001"))
//!     .await?;
//!
//! assert_eq!(result.claim_texts(), vec!["Water boils at 100 degrees Celsius at sea level."]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
pub mod oracle;
pub mod parser;
mod pipeline;
pub mod prompt;
mod types;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use oracle::{ClassificationOracle, OracleReply, CLASSIFICATION_UNAVAILABLE};
pub use pipeline::Extractor;
pub use types::{ExtractedClaim, ExtractionMetadata, ExtractionRequest, ExtractionResult, SentenceTrace};
