//! Verdicts, trust scores and the aggregate report
//!
//! Trust scores are never stored independently of the verdict: a result's
//! score is derived from its verdict through one fixed mapping, so the two
//! cannot disagree.

use crate::claim::ClaimId;
use std::fmt;

/// Score assigned to a fully supported claim
pub const SUPPORT_SCORE: u8 = 100;

/// Score assigned to a partially supported claim
pub const PARTIAL_SUPPORT_SCORE: u8 = 50;

/// Score assigned to contradicted or refuted claims
pub const REJECTED_SCORE: u8 = 0;

/// Verification oracle judgment for one claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Evidence supports the claim
    Support,
    /// Evidence supports part of the claim
    PartiallySupport,
    /// Evidence is insufficient either way
    Unclear,
    /// Evidence conflicts with the claim
    Contradict,
    /// Evidence shows the claim is false
    Refute,
}

impl Verdict {
    /// All verdicts, in descending order of support
    pub const ALL: [Verdict; 5] = [
        Verdict::Support,
        Verdict::PartiallySupport,
        Verdict::Unclear,
        Verdict::Contradict,
        Verdict::Refute,
    ];

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Support => "Support",
            Verdict::PartiallySupport => "Partially Support",
            Verdict::Unclear => "Unclear",
            Verdict::Contradict => "Contradict",
            Verdict::Refute => "Refute",
        }
    }

    /// Parse a verdict, tolerating case, spacing and verb-form differences
    ///
    /// # Examples
    ///
    /// ```
    /// use verity_domain::Verdict;
    ///
    /// assert_eq!(Verdict::parse("partially_supports"), Some(Verdict::PartiallySupport));
    /// assert_eq!(Verdict::parse("REFUTED"), Some(Verdict::Refute));
    /// assert_eq!(Verdict::parse("true"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "support" | "supports" | "supported" => Some(Verdict::Support),
            "partiallysupport" | "partiallysupports" | "partiallysupported" => {
                Some(Verdict::PartiallySupport)
            }
            "unclear" => Some(Verdict::Unclear),
            "contradict" | "contradicts" | "contradicted" => Some(Verdict::Contradict),
            "refute" | "refutes" | "refuted" => Some(Verdict::Refute),
            _ => None,
        }
    }

    /// Fixed verdict-to-score mapping
    ///
    /// Unclear carries no score and is left out of averages.
    pub fn trust_score(&self) -> Option<u8> {
        match self {
            Verdict::Support => Some(SUPPORT_SCORE),
            Verdict::PartiallySupport => Some(PARTIAL_SUPPORT_SCORE),
            Verdict::Unclear => None,
            Verdict::Contradict | Verdict::Refute => Some(REJECTED_SCORE),
        }
    }

    /// Whether a score reported alongside this verdict is consistent with it
    ///
    /// Support must report 100 and PartiallySupport 50. Unclear, Contradict and
    /// Refute may report 0 or no score at all.
    pub fn accepts_score(&self, score: Option<i64>) -> bool {
        match self {
            Verdict::Support => score == Some(i64::from(SUPPORT_SCORE)),
            Verdict::PartiallySupport => score == Some(i64::from(PARTIAL_SUPPORT_SCORE)),
            Verdict::Unclear | Verdict::Contradict | Verdict::Refute => {
                matches!(score, None | Some(0))
            }
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification outcome for one claim
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimVerificationResult {
    /// Claim this result answers
    pub claim_id: ClaimId,

    /// Claim text
    pub claim: String,

    /// Oracle verdict
    pub verdict: Verdict,

    /// Oracle explanation, or a placeholder reason
    pub reason: String,

    /// Up to three quoted evidence fragments
    pub references: Vec<String>,
}

impl ClaimVerificationResult {
    /// Build a result from validated oracle output
    pub fn new(
        claim_id: ClaimId,
        claim: impl Into<String>,
        verdict: Verdict,
        reason: impl Into<String>,
        references: Vec<String>,
    ) -> Self {
        Self {
            claim_id,
            claim: claim.into(),
            verdict,
            reason: reason.into(),
            references,
        }
    }

    /// Unclear placeholder used when a claim could not be verified
    pub fn placeholder(claim_id: ClaimId, claim: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(claim_id, claim, Verdict::Unclear, reason, Vec::new())
    }

    /// Trust score implied by the verdict
    pub fn trust_score(&self) -> Option<u8> {
        self.verdict.trust_score()
    }
}

/// Per-claim results plus the averaged trust score
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    /// Results in completion order
    pub results: Vec<ClaimVerificationResult>,

    /// Rounded mean over scored, non-Unclear results (0 when none qualify)
    pub average_trust_score: u8,
}

impl AggregateReport {
    /// Aggregate a set of results
    ///
    /// # Examples
    ///
    /// ```
    /// use verity_domain::{AggregateReport, ClaimId, ClaimVerificationResult, Verdict};
    ///
    /// let results = vec![
    ///     ClaimVerificationResult::new(ClaimId::new(), "a", Verdict::Support, "ok", vec![]),
    ///     ClaimVerificationResult::placeholder(ClaimId::new(), "b", "no evidence"),
    ///     ClaimVerificationResult::new(ClaimId::new(), "c", Verdict::Refute, "false", vec![]),
    /// ];
    /// assert_eq!(AggregateReport::from_results(results).average_trust_score, 50);
    /// ```
    pub fn from_results(results: Vec<ClaimVerificationResult>) -> Self {
        let average_trust_score = average_trust_score(&results);
        Self {
            results,
            average_trust_score,
        }
    }

    /// Number of results that contributed to the average
    pub fn scored_count(&self) -> usize {
        self.results.iter().filter(|r| qualifies(r)).count()
    }

    /// Whether no result contributed, making the average a convention rather than a measurement
    pub fn is_unscored(&self) -> bool {
        self.scored_count() == 0
    }

    /// Look up the result for a claim
    pub fn result_for(&self, claim_id: ClaimId) -> Option<&ClaimVerificationResult> {
        self.results.iter().find(|r| r.claim_id == claim_id)
    }
}

fn qualifies(result: &ClaimVerificationResult) -> bool {
    result.verdict != Verdict::Unclear && result.trust_score().is_some()
}

/// Rounded mean of qualifying trust scores, 0 when nothing qualifies
pub fn average_trust_score(results: &[ClaimVerificationResult]) -> u8 {
    let scores: Vec<u32> = results
        .iter()
        .filter(|r| qualifies(r))
        .filter_map(|r| r.trust_score())
        .map(u32::from)
        .collect();

    if scores.is_empty() {
        return 0;
    }

    let mean = f64::from(scores.iter().sum::<u32>()) / scores.len() as f64;
    mean.round() as u8
}
