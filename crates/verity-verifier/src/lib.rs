//! Verity Verifier
//!
//! Asks the verification oracle for a verdict on each claim and aggregates
//! the trust scores.
//!
//! The Verifier provides:
//! - Source-tagged verification prompts (`[Source 1: <id>] ...`)
//! - Scheduled calls, charged by their estimated token cost
//! - Strict response validation (verdict, trust score, reason, references)
//! - Unclear placeholders for anything that fails, so every claim gets a result
//!
//! Trust scores follow the verdict: Support is 100, Partially Support is 50,
//! Contradict and Refute are 0, and Unclear has no score. The average is taken
//! over scored, non-Unclear results and is 0 when there are none.
//!
//! # Examples
//!
//! ```
//! use verity_domain::{ClaimId, EvidenceChunk, Verdict};
//! use verity_llm::MockProvider;
//! use verity_scheduler::{Scheduler, SchedulerConfig};
//! use verity_verifier::{VerificationRequest, Verifier, VerifierConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(
//!     r#"{"verdict": "Support", "trust_score": 100, "reason": "The source states it."}"#,
//! );
//! let scheduler = Scheduler::new(SchedulerConfig::default())?;
//! let verifier = Verifier::new(llm, scheduler, VerifierConfig::default())?;
//!
//! let evidence = vec![EvidenceChunk {
//!     source_id: "example.org".to_string(),
//!     sentences: vec!["Water boils at 100 degrees Celsius at sea level.".to_string()],
//!     relevance_score: Some(0.92),
//! }];
//! let request = VerificationRequest::new(ClaimId::new(), "Water boils at 100C.", evidence);
//!
//! let outcome = verifier.verify_all(vec![request]).await;
//! assert_eq!(outcome.report.results[0].verdict, Verdict::Support);
//! assert_eq!(outcome.report.average_trust_score, 100);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
pub mod prompt;
mod types;
pub mod validator;
mod verifier;

pub use config::VerifierConfig;
pub use error::VerifierError;
pub use types::{VerificationMetadata, VerificationOutcome, VerificationRequest};
pub use validator::{RejectionReason, ResponseValidator, ValidatedVerdict};
pub use verifier::{Verifier, NO_EVIDENCE_REASON, NO_VERDICT_REASON, VERIFICATION_UNAVAILABLE_REASON};
