//! Search, fetch and evidence selection per claim

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};
use verity_domain::traits::{EmbeddingModel, SearchProvider, SourceFetcher};
use verity_domain::SourceDocument;
use verity_evidence::EvidenceSelector;
use verity_extractor::ExtractedClaim;
use verity_verifier::VerificationRequest;

/// Counters for the evidence-gathering stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceMetadata {
    /// Claims searched for
    pub claims_searched: usize,

    /// Searches that failed
    pub search_failures: usize,

    /// URLs fetched (successfully or not)
    pub urls_fetched: usize,

    /// Fetches that failed
    pub fetch_failures: usize,

    /// Claims left without any evidence
    pub claims_without_evidence: usize,
}

impl EvidenceMetadata {
    fn absorb(&mut self, other: &EvidenceMetadata) {
        self.claims_searched += other.claims_searched;
        self.search_failures += other.search_failures;
        self.urls_fetched += other.urls_fetched;
        self.fetch_failures += other.fetch_failures;
        self.claims_without_evidence += other.claims_without_evidence;
    }
}

/// Finds sources for claims and picks their evidence
pub(crate) struct EvidenceGatherer<E, S, F>
where
    E: EmbeddingModel + 'static,
    S: SearchProvider + 'static,
    F: SourceFetcher + 'static,
{
    search: S,
    fetcher: F,
    selector: EvidenceSelector<E>,
    max_urls_per_claim: usize,
    max_concurrent_claims: usize,
}

impl<E, S, F> EvidenceGatherer<E, S, F>
where
    E: EmbeddingModel + 'static,
    S: SearchProvider + 'static,
    F: SourceFetcher + 'static,
{
    pub(crate) fn new(
        search: S,
        fetcher: F,
        selector: EvidenceSelector<E>,
        max_urls_per_claim: usize,
        max_concurrent_claims: usize,
    ) -> Self {
        Self {
            search,
            fetcher,
            selector,
            max_urls_per_claim,
            max_concurrent_claims,
        }
    }

    /// Gather evidence for every claim, at most `max_concurrent_claims` at once
    ///
    /// Requests come back in claim order, one per claim.
    pub(crate) async fn gather_all(
        self: &Arc<Self>,
        claims: &[ExtractedClaim],
    ) -> (Vec<VerificationRequest>, EvidenceMetadata) {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_claims));
        let mut tasks = JoinSet::new();

        for (position, claim) in claims.iter().cloned().enumerate() {
            let gatherer = Arc::clone(self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let (request, stats) = gatherer.gather(&claim).await;
                (position, request, stats)
            });
        }

        let mut slots: Vec<Option<VerificationRequest>> = vec![None; claims.len()];
        let mut metadata = EvidenceMetadata::default();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, request, stats)) => {
                    metadata.absorb(&stats);
                    slots[position] = Some(request);
                }
                Err(e) => error!("Evidence task failed: {}", e),
            }
        }

        let requests = claims
            .iter()
            .zip(slots)
            .map(|(claim, slot)| {
                slot.unwrap_or_else(|| {
                    metadata.claims_without_evidence += 1;
                    VerificationRequest::new(claim.claim_id, claim.text.clone(), Vec::new())
                })
            })
            .collect();

        (requests, metadata)
    }

    async fn gather(&self, claim: &ExtractedClaim) -> (VerificationRequest, EvidenceMetadata) {
        let mut stats = EvidenceMetadata {
            claims_searched: 1,
            ..Default::default()
        };

        let urls = match self.search.search(&claim.text).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Search failed for claim {}: {}", claim.claim_id, e);
                stats.search_failures += 1;
                Vec::new()
            }
        };

        let max_sources = self.selector.config().max_sources;
        let mut seen = HashSet::new();
        let mut documents: Vec<SourceDocument> = Vec::new();

        for url in urls
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .take(self.max_urls_per_claim)
        {
            if documents.len() >= max_sources {
                break;
            }
            stats.urls_fetched += 1;
            match self.fetcher.fetch(&url).await {
                Ok(document) if document.content.trim().is_empty() => {
                    debug!("Source {} is empty, skipping", url);
                }
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!("Fetch failed for {}: {}", url, e);
                    stats.fetch_failures += 1;
                }
            }
        }

        let evidence = if documents.is_empty() {
            Vec::new()
        } else {
            self.selector.select(&claim.text, &documents).await
        };

        if evidence.is_empty() {
            debug!("No evidence for claim {}", claim.claim_id);
            stats.claims_without_evidence += 1;
        }

        (
            VerificationRequest::new(claim.claim_id, claim.text.clone(), evidence),
            stats,
        )
    }
}
