//! Verity Domain Layer
//!
//! This crate contains the core domain model for the Verity claim-verification
//! pipeline. Apart from `uuid` it has no external dependencies: it defines the
//! value types, the deterministic rules, and the trait interfaces that every
//! other layer depends upon.
//!
//! ## Key Concepts
//!
//! - **Sentence**: One unit of input text, classified exactly once
//! - **Final claim**: The checkable statement a sentence resolves to (or none)
//! - **Evidence chunk**: A short, source-attributed excerpt relevant to a claim
//! - **Verdict**: The verification oracle's judgment, with a fixed trust score
//! - **Aggregate report**: Per-claim results plus the averaged trust score
//!
//! ## Architecture
//!
//! - Pure business logic only (no I/O, no async runtime)
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external collaborators live in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claim;
pub mod evidence;
pub mod segment;
pub mod sentence;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use claim::{select_final_claim, ClaimId, ClaimState, FinalClaim, SelectionRule};
pub use evidence::{EvidenceChunk, SourceDocument};
pub use segment::split_sentences;
pub use sentence::{
    Ambiguity, AmbiguityKind, Category, ClassifiedSentence, DisambiguationResult,
    RewrittenSentence, Sentence,
};
pub use verdict::{AggregateReport, ClaimVerificationResult, Verdict};
