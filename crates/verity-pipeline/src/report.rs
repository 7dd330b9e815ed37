//! Fact-check report

use crate::gather::EvidenceMetadata;
use std::fmt::Write;
use verity_domain::{AggregateReport, ClaimVerificationResult};
use verity_extractor::ExtractionResult;
use verity_scheduler::MetricsSnapshot;
use verity_verifier::VerificationMetadata;

/// Everything produced for one content item
#[derive(Debug, Clone)]
pub struct FactCheckReport {
    /// URL of the content, or "text" for supplied text
    pub source_id: String,

    /// Content title, when the extractor found one
    pub title: Option<String>,

    /// Content excerpt, when the extractor found one
    pub excerpt: Option<String>,

    /// Sentence traces and final claims
    pub extraction: ExtractionResult,

    /// Per-claim verdicts and the aggregate trust score
    pub verification: AggregateReport,

    /// Verification counters
    pub verification_metadata: VerificationMetadata,

    /// Search and fetch counters
    pub evidence_metadata: EvidenceMetadata,

    /// Scheduler counters at the end of the run
    pub scheduler: MetricsSnapshot,

    /// Total processing time in milliseconds
    pub processing_time_ms: u64,
}

impl FactCheckReport {
    /// Aggregate trust score (0 when nothing could be scored)
    pub fn average_trust_score(&self) -> u8 {
        self.verification.average_trust_score
    }

    /// Per-claim results, in completion order
    pub fn results(&self) -> &[ClaimVerificationResult] {
        &self.verification.results
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Fact check of {}", self.title.as_deref().unwrap_or(&self.source_id));
        let _ = writeln!(
            out,
            "  Sentences: {} ({} claims extracted)",
            self.extraction.metadata.sentence_count,
            self.extraction.claims.len()
        );
        let _ = writeln!(
            out,
            "  Verified: {}, unclear placeholders: {} ({} without evidence)",
            self.verification_metadata.verified,
            self.verification_metadata.placeholders,
            self.verification_metadata.missing_evidence
        );
        let _ = writeln!(out, "  Average trust score: {}", self.average_trust_score());
        for result in self.results() {
            let score = result
                .trust_score()
                .map_or_else(|| "-".to_string(), |s| s.to_string());
            let _ = writeln!(out, "  [{}] {} ({}): {}", score, result.claim, result.verdict, result.reason);
        }
        let _ = write!(out, "  Time: {}ms", self.processing_time_ms);
        out
    }
}
