//! Error types for the fact-check pipeline.

use thiserror::Error;
use verity_extractor::ExtractorError;
use verity_scheduler::SchedulerError;
use verity_verifier::VerifierError;

/// Fact-check errors
///
/// Only failures that leave nothing to report are errors. Per-claim failures
/// (search, fetch, verification) end up as Unclear results in the report.
#[derive(Debug, Error)]
pub enum FactCheckError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The content extractor could not produce text
    #[error("Content extraction failed: {0}")]
    Content(String),

    /// Claim extraction rejected the content
    #[error("Claim extraction failed: {0}")]
    Extraction(#[from] ExtractorError),

    /// The scheduler could not be started
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// The verifier could not be built
    #[error("Verifier error: {0}")]
    Verifier(#[from] VerifierError),
}
