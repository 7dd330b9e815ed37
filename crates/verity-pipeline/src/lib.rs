//! Verity fact-check pipeline
//!
//! Wires the stages together:
//!
//! ```text
//! content → claims (verity-extractor) → search + fetch → evidence (verity-evidence)
//!         → verdicts through the scheduler (verity-verifier) → FactCheckReport
//! ```
//!
//! Search, fetch and evidence selection run for several claims at once,
//! bounded by `max_concurrent_claims`. Verification calls are bounded by the
//! scheduler's request and token budgets.
//!
//! # Example
//!
//! ```
//! use verity_domain::traits::PlainTextExtractor;
//! use verity_evidence::MockEmbeddingModel;
//! use verity_llm::MockProvider;
//! use verity_pipeline::mock::{MockSearchProvider, MockSourceFetcher};
//! use verity_pipeline::{FactCheckConfig, FactChecker};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! verity_pipeline::init_tracing();
//!
//! // A real deployment wires an LLM, an embedding service, search and scraping
//! let checker = FactChecker::new(
//!     FactCheckConfig::default(),
//!     PlainTextExtractor,
//!     MockProvider::new("[]"),
//!     MockEmbeddingModel::new(128),
//!     MockSearchProvider::new(),
//!     MockSourceFetcher::new(),
//! )?;
//!
//! let report = checker.check_text("The Eiffel Tower is in Paris.").await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod checker;
mod config;
mod error;
mod gather;
pub mod mock;
mod report;
mod telemetry;

pub use checker::FactChecker;
pub use config::FactCheckConfig;
pub use error::FactCheckError;
pub use gather::EvidenceMetadata;
pub use report::FactCheckReport;
pub use telemetry::{init_tracing, init_tracing_with};
