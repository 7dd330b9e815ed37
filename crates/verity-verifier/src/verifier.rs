//! Verdict requests through the scheduler

use crate::config::VerifierConfig;
use crate::error::VerifierError;
use crate::prompt::verify_prompt;
use crate::types::{VerificationMetadata, VerificationOutcome, VerificationRequest};
use crate::validator::{ResponseValidator, ValidationResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};
use verity_domain::traits::LlmProvider;
use verity_domain::{AggregateReport, ClaimId, ClaimVerificationResult};
use verity_scheduler::{estimate_tokens, Scheduler};

/// Placeholder reason for claims without evidence
pub const NO_EVIDENCE_REASON: &str = "no evidence found";

/// Placeholder reason when the verification call failed
pub const VERIFICATION_UNAVAILABLE_REASON: &str = "verification unavailable";

/// Placeholder reason when the response had no verdict for the claim
pub const NO_VERDICT_REASON: &str = "no verdict returned";

/// How one claim ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Verified,
    Rejected,
    CallFailed,
}

/// Results of one verification call
struct CallOutcome {
    results: Vec<(ClaimVerificationResult, Resolution)>,
}

/// Sends claims with their evidence to the verification oracle
///
/// Every call goes through the shared [`Scheduler`]. Whatever goes wrong, each
/// claim gets a result: failures become Unclear placeholders.
pub struct Verifier<L>
where
    L: LlmProvider + 'static,
{
    llm: Arc<L>,
    scheduler: Scheduler,
    config: VerifierConfig,
    validator: ResponseValidator,
}

impl<L> Clone for Verifier<L>
where
    L: LlmProvider + 'static,
{
    fn clone(&self) -> Self {
        Self {
            llm: Arc::clone(&self.llm),
            scheduler: self.scheduler.clone(),
            config: self.config.clone(),
            validator: self.validator.clone(),
        }
    }
}

impl<L> Verifier<L>
where
    L: LlmProvider + 'static,
{
    /// Create a new verifier
    ///
    /// # Errors
    ///
    /// Returns `VerifierError::Config` if the configuration is invalid.
    pub fn new(llm: L, scheduler: Scheduler, config: VerifierConfig) -> Result<Self, VerifierError> {
        Self::from_shared(Arc::new(llm), scheduler, config)
    }

    /// Create a verifier around a shared provider
    pub fn from_shared(llm: Arc<L>, scheduler: Scheduler, config: VerifierConfig) -> Result<Self, VerifierError> {
        config.validate().map_err(VerifierError::Config)?;
        let validator = ResponseValidator::new(&config);
        Ok(Self {
            llm,
            scheduler,
            config,
            validator,
        })
    }

    /// Get the verifier configuration
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a single claim
    pub async fn verify_claim(&self, request: VerificationRequest) -> ClaimVerificationResult {
        if !request.has_evidence() {
            return no_evidence(&request);
        }

        let claim_id = request.claim_id;
        let claim = request.claim.clone();
        let mut outcome = self.verify_batch(vec![request]).await;
        match outcome.results.pop() {
            Some((result, _)) => result,
            None => ClaimVerificationResult::placeholder(claim_id, claim, NO_VERDICT_REASON),
        }
    }

    /// Verify every claim and aggregate the verdicts
    ///
    /// Calls run concurrently, limited only by the scheduler's budgets.
    /// Results are listed in completion order.
    pub async fn verify_all(&self, requests: Vec<VerificationRequest>) -> VerificationOutcome {
        let start = Instant::now();
        let mut metadata = VerificationMetadata {
            claim_count: requests.len(),
            ..Default::default()
        };
        let mut results = Vec::with_capacity(requests.len());

        let (ready, missing): (Vec<_>, Vec<_>) = requests.into_iter().partition(|r| r.has_evidence());

        for request in &missing {
            debug!("No evidence for claim {}, skipping verification", request.claim_id);
            results.push(no_evidence(request));
            metadata.missing_evidence += 1;
            metadata.placeholders += 1;
        }

        let mut calls = JoinSet::new();
        let mut in_flight: HashMap<Id, Vec<(ClaimId, String)>> = HashMap::new();
        let mut ready = ready.into_iter().peekable();
        while ready.peek().is_some() {
            let batch: Vec<_> = ready.by_ref().take(self.config.claims_per_call).collect();
            let claims = batch.iter().map(|r| (r.claim_id, r.claim.clone())).collect();
            let verifier = self.clone();
            let handle = calls.spawn(async move { verifier.verify_batch(batch).await });
            in_flight.insert(handle.id(), claims);
            metadata.oracle_calls += 1;
        }

        info!(
            "Verifying {} claims in {} calls ({} without evidence)",
            metadata.claim_count - metadata.missing_evidence,
            metadata.oracle_calls,
            metadata.missing_evidence
        );

        while let Some(joined) = calls.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    in_flight.remove(&id);
                    outcome
                }
                Err(e) => {
                    error!("Verification task failed: {}", e);
                    metadata.oracle_failures += 1;
                    for (claim_id, claim) in in_flight.remove(&e.id()).unwrap_or_default() {
                        results.push(ClaimVerificationResult::placeholder(
                            claim_id,
                            claim,
                            VERIFICATION_UNAVAILABLE_REASON,
                        ));
                        metadata.placeholders += 1;
                    }
                    continue;
                }
            };

            if outcome.results.iter().any(|(_, r)| *r == Resolution::CallFailed) {
                metadata.oracle_failures += 1;
            }
            for (result, resolution) in outcome.results {
                match resolution {
                    Resolution::Verified => metadata.verified += 1,
                    Resolution::Rejected => {
                        metadata.invalid_responses += 1;
                        metadata.placeholders += 1;
                    }
                    Resolution::CallFailed => metadata.placeholders += 1,
                }
                results.push(result);
            }
        }

        metadata.processing_time_ms = start.elapsed().as_millis() as u64;
        let report = AggregateReport::from_results(results);

        info!(
            "Verification complete: {} verified, {} placeholders, average trust score {}",
            metadata.verified, metadata.placeholders, report.average_trust_score
        );

        VerificationOutcome { report, metadata }
    }

    async fn verify_batch(&self, batch: Vec<VerificationRequest>) -> CallOutcome {
        let prompt = Arc::new(verify_prompt(&batch, &self.config));
        let cost = estimate_tokens(&prompt);
        debug!("Verification call for {} claims, estimated {} tokens", batch.len(), cost);

        let llm = Arc::clone(&self.llm);
        let response = self
            .scheduler
            .submit(cost, move || {
                let llm = Arc::clone(&llm);
                let prompt = Arc::clone(&prompt);
                async move { llm.generate_json(&prompt).await }
            })
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Verification call failed for {} claims: {}", batch.len(), e);
                let reason = format!("{}: {}", VERIFICATION_UNAVAILABLE_REASON, e);
                return all_placeholders(&batch, &reason, Resolution::CallFailed);
            }
        };

        let entries = match self.validator.parse_response(&response) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Unreadable verification response: {}", e);
                let reason = format!("invalid verification response: {}", e);
                return all_placeholders(&batch, &reason, Resolution::Rejected);
            }
        };

        CallOutcome {
            results: assign_entries(&batch, entries),
        }
    }
}

/// Match response entries to the claims of the call
///
/// Entries of a multi-claim call are matched by id when it names a claim of
/// the call, otherwise by position. A single-claim call ignores ids.
fn assign_entries(
    batch: &[VerificationRequest],
    entries: Vec<ValidationResult>,
) -> Vec<(ClaimVerificationResult, Resolution)> {
    let mut slots: Vec<Option<ValidationResult>> = vec![None; batch.len()];

    for (position, entry) in entries.into_iter().enumerate() {
        let id = match &entry {
            Ok(verdict) if batch.len() > 1 => verdict
                .id
                .filter(|id| *id < batch.len())
                .unwrap_or(position),
            _ => position,
        };
        match slots.get_mut(id) {
            Some(slot) if slot.is_none() => *slot = Some(entry),
            Some(_) => debug!("Duplicate verdict for claim {}, keeping the first", id),
            None => debug!("Verdict for unknown claim {}", id),
        }
    }

    batch
        .iter()
        .zip(slots)
        .map(|(request, slot)| match slot {
            Some(Ok(verdict)) => (
                ClaimVerificationResult::new(
                    request.claim_id,
                    request.claim.clone(),
                    verdict.verdict,
                    verdict.reason,
                    verdict.references,
                ),
                Resolution::Verified,
            ),
            Some(Err(rejection)) => {
                warn!("Rejected verdict for claim {}: {}", request.claim_id, rejection);
                (
                    ClaimVerificationResult::placeholder(
                        request.claim_id,
                        request.claim.clone(),
                        format!("invalid verification response: {}", rejection),
                    ),
                    Resolution::Rejected,
                )
            }
            None => {
                warn!("No verdict returned for claim {}", request.claim_id);
                (
                    ClaimVerificationResult::placeholder(request.claim_id, request.claim.clone(), NO_VERDICT_REASON),
                    Resolution::Rejected,
                )
            }
        })
        .collect()
}

fn all_placeholders(batch: &[VerificationRequest], reason: &str, resolution: Resolution) -> CallOutcome {
    CallOutcome {
        results: batch
            .iter()
            .map(|request| {
                (
                    ClaimVerificationResult::placeholder(request.claim_id, request.claim.clone(), reason),
                    resolution,
                )
            })
            .collect(),
    }
}

fn no_evidence(request: &VerificationRequest) -> ClaimVerificationResult {
    ClaimVerificationResult::placeholder(request.claim_id, request.claim.clone(), NO_EVIDENCE_REASON)
}
