//! The fact-check orchestrator

use crate::config::FactCheckConfig;
use crate::error::FactCheckError;
use crate::gather::EvidenceGatherer;
use crate::report::FactCheckReport;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use verity_domain::traits::{
    ContentExtractor, ContentSource, EmbeddingModel, ExtractedContent, LlmProvider, SearchProvider, SourceFetcher,
};
use verity_evidence::EvidenceSelector;
use verity_extractor::{ExtractionRequest, Extractor};
use verity_scheduler::{MetricsSnapshot, Scheduler};
use verity_verifier::Verifier;

/// Runs content through extraction, evidence gathering and verification
///
/// One instance owns one scheduler; every check made through it shares the
/// same rate budgets.
pub struct FactChecker<C, L, E, S, F>
where
    C: ContentExtractor,
    L: LlmProvider + 'static,
    E: EmbeddingModel + 'static,
    S: SearchProvider + 'static,
    F: SourceFetcher + 'static,
{
    content: C,
    extractor: Extractor<L>,
    gatherer: Arc<EvidenceGatherer<E, S, F>>,
    verifier: Verifier<L>,
    scheduler: Scheduler,
    config: FactCheckConfig,
}

impl<C, L, E, S, F> FactChecker<C, L, E, S, F>
where
    C: ContentExtractor,
    L: LlmProvider + 'static,
    E: EmbeddingModel + 'static,
    S: SearchProvider + 'static,
    F: SourceFetcher + 'static,
{
    /// Build a fact checker from its collaborators
    ///
    /// `llm` serves both the classification and the verification oracles.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `FactCheckError::Config` if any stage configuration is invalid.
    pub fn new(
        config: FactCheckConfig,
        content: C,
        llm: L,
        embedder: E,
        search: S,
        fetcher: F,
    ) -> Result<Self, FactCheckError> {
        config.validate().map_err(FactCheckError::Config)?;

        let llm = Arc::new(llm);
        let scheduler = Scheduler::new(config.scheduler.clone())?;
        let extractor = Extractor::from_shared(Arc::clone(&llm), config.extractor.clone());
        let verifier = Verifier::from_shared(llm, scheduler.clone(), config.verifier.clone())?;
        let selector = EvidenceSelector::new(embedder, config.evidence.clone());
        let gatherer = Arc::new(EvidenceGatherer::new(
            search,
            fetcher,
            selector,
            config.max_urls_per_claim,
            config.max_concurrent_claims,
        ));

        Ok(Self {
            content,
            extractor,
            gatherer,
            verifier,
            scheduler,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &FactCheckConfig {
        &self.config
    }

    /// Current scheduler counters
    pub fn scheduler_metrics(&self) -> MetricsSnapshot {
        self.scheduler.metrics()
    }

    /// Fact-check supplied text
    pub async fn check_text(&self, text: impl Into<String>) -> Result<FactCheckReport, FactCheckError> {
        self.check(ContentSource::Text(text.into())).await
    }

    /// Fact-check a content item
    ///
    /// # Errors
    ///
    /// Fails only when there is nothing to check: the content extractor
    /// failed, or the content is empty or too long. Claims that cannot be
    /// verified appear in the report with an Unclear verdict.
    pub async fn check(&self, source: ContentSource) -> Result<FactCheckReport, FactCheckError> {
        let start = Instant::now();
        let source_id = match &source {
            ContentSource::Url(url) => url.clone(),
            ContentSource::Text(_) => "text".to_string(),
        };
        info!("Fact-checking {}", source_id);

        let ExtractedContent { content, title, excerpt } = self
            .content
            .extract(&source)
            .await
            .map_err(|e| FactCheckError::Content(e.to_string()))?;

        let extraction = self
            .extractor
            .extract(ExtractionRequest::new(content, source_id.clone()))
            .await?;
        info!(
            "Extracted {} claims from {} sentences",
            extraction.claims.len(),
            extraction.metadata.sentence_count
        );

        let (requests, evidence_metadata) = self.gatherer.gather_all(&extraction.claims).await;
        let outcome = self.verifier.verify_all(requests).await;

        let report = FactCheckReport {
            source_id,
            title,
            excerpt,
            extraction,
            verification: outcome.report,
            verification_metadata: outcome.metadata,
            evidence_metadata,
            scheduler: self.scheduler.metrics(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Fact check of {} complete: average trust score {} over {} claims",
            report.source_id,
            report.average_trust_score(),
            report.results().len()
        );

        Ok(report)
    }
}
