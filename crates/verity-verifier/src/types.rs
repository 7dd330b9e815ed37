//! Verifier request and report types

use verity_domain::{AggregateReport, ClaimId, EvidenceChunk};

/// One claim with the evidence gathered for it
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRequest {
    /// Claim identifier, carried through to the result
    pub claim_id: ClaimId,

    /// Claim text
    pub claim: String,

    /// Evidence chunks, at most one per source
    pub evidence: Vec<EvidenceChunk>,
}

impl VerificationRequest {
    /// Create a new verification request
    pub fn new(claim_id: ClaimId, claim: impl Into<String>, evidence: Vec<EvidenceChunk>) -> Self {
        Self {
            claim_id,
            claim: claim.into(),
            evidence,
        }
    }

    /// Whether there is anything to verify the claim against
    pub fn has_evidence(&self) -> bool {
        self.evidence.iter().any(|chunk| !chunk.sentences.is_empty())
    }
}

/// Counters describing one verification run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationMetadata {
    /// Claims received
    pub claim_count: usize,

    /// Claims with a validated verdict
    pub verified: usize,

    /// Claims that got an Unclear placeholder
    pub placeholders: usize,

    /// Claims skipped for lack of evidence (included in `placeholders`)
    pub missing_evidence: usize,

    /// Verification calls submitted to the scheduler
    pub oracle_calls: usize,

    /// Calls that failed after retries
    pub oracle_failures: usize,

    /// Verdicts rejected by validation
    pub invalid_responses: usize,

    /// Wall-clock time of the run (milliseconds)
    pub processing_time_ms: u64,
}

/// Report plus run counters
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationOutcome {
    /// Per-claim results in completion order, with the aggregate score
    pub report: AggregateReport,

    /// Run counters
    pub metadata: VerificationMetadata,
}
