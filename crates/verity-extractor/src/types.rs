//! Request and response types for extraction

use verity_domain::{Category, ClaimId, ClaimState, DisambiguationResult, FinalClaim, SelectionRule, Sentence};

/// Request to extract claims from a content item
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Plain-text content to extract claims from
    pub text: String,

    /// Source identifier (URL, hash or user-provided)
    pub source_id: String,
}

impl ExtractionRequest {
    /// Create a request
    pub fn new(text: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
        }
    }
}

/// Everything the pipeline decided about one sentence
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceTrace {
    /// The sentence (original or derived)
    pub sentence: Sentence,

    /// Classification reasoning, or the fallback sentinel
    pub reasoning: String,

    /// Accumulated stage outputs
    pub state: ClaimState,

    /// Raw disambiguation verdict, when the sentence was a candidate
    pub disambiguation: Option<DisambiguationResult>,

    /// Outcome of final-claim selection
    pub final_claim: FinalClaim,
}

impl SentenceTrace {
    /// The sentence's category
    pub fn category(&self) -> Category {
        self.state.category
    }
}

/// A non-null final claim, ready for verification
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedClaim {
    /// Identifier used to correlate verification results
    pub claim_id: ClaimId,

    /// Claim text
    pub text: String,

    /// Index of the sentence the claim came from
    pub sentence_index: usize,

    /// Parent sentence index, for claims from implicit-claim extraction
    pub origin: Option<usize>,

    /// Rule that produced the claim
    pub rule: SelectionRule,
}

/// Result of an extraction run
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// One trace per sentence: originals in input order, then derived sentences
    pub traces: Vec<SentenceTrace>,

    /// Final claims of the original sentences, aligned to input order
    pub final_claims: Vec<FinalClaim>,

    /// Non-null claims; each original's claim is followed by claims derived from it
    pub claims: Vec<ExtractedClaim>,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// Trace for a sentence index
    pub fn trace(&self, index: usize) -> Option<&SentenceTrace> {
        self.traces.iter().find(|t| t.sentence.index == index)
    }

    /// Claim texts only, in flattened order
    pub fn claim_texts(&self) -> Vec<&str> {
        self.claims.iter().map(|c| c.text.as_str()).collect()
    }
}

/// Metadata about an extraction operation
#[derive(Debug, Clone, Default)]
pub struct ExtractionMetadata {
    /// Source identifier
    pub source_id: String,

    /// Timestamp when extraction occurred (Unix seconds)
    pub timestamp: u64,

    /// Name of the LLM model used
    pub model_name: String,

    /// Original sentences processed
    pub sentence_count: usize,

    /// Sentences dropped over `max_sentences`
    pub dropped_sentences: usize,

    /// Sentences surfaced by implicit-claim extraction
    pub derived_sentence_count: usize,

    /// Sentences per category (verifiable, partially verifiable, not verifiable)
    pub category_counts: (usize, usize, usize),

    /// Oracle calls made
    pub oracle_calls: usize,

    /// Oracle calls that failed or returned malformed output
    pub oracle_failures: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
