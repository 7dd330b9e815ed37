//! Verity Evidence
//!
//! Picks the sentences of each source document most relevant to a claim.
//!
//! ```text
//! claim + sources → split sentences → (short source? first K) → embed → rank → top K in document order
//! ```
//!
//! Short sources skip embedding entirely. Embedding failures, including a
//! detected quota exhaustion, fall back to the first K sentences and open a
//! cooldown window during which embedding is not attempted at all.
//!
//! # Example
//!
//! ```
//! use verity_domain::SourceDocument;
//! use verity_evidence::{EvidenceConfig, EvidenceSelector, MockEmbeddingModel};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let selector = EvidenceSelector::new(MockEmbeddingModel::new(64), EvidenceConfig::default());
//! let sources = vec![SourceDocument::new("a", "One. Two. Three.")];
//! let chunks = selector.select("claim", &sources).await;
//! assert_eq!(chunks[0].sentences, vec!["One.", "Two.", "Three."]);
//! # }
//! ```

#![warn(missing_docs)]

mod config;
pub mod embedding;
mod selector;

pub use config::EvidenceConfig;
pub use embedding::{cosine_similarity, EmbeddingError, MockEmbeddingModel};
pub use selector::EvidenceSelector;
