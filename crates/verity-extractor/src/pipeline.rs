//! Claim extraction pipeline
//!
//! Drives the sentences of one content item through categorize, implicit-claim
//! extraction, rewrite, disambiguate and final-claim selection. Each stage is
//! one batched oracle call; a failed stage degrades the affected sentences and
//! the run continues.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::oracle::ClassificationOracle;
use crate::types::{ExtractedClaim, ExtractionMetadata, ExtractionRequest, ExtractionResult, SentenceTrace};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use verity_domain::traits::LlmProvider;
use verity_domain::{
    select_final_claim, split_sentences, Ambiguity, Category, ClaimId, ClaimState, ClassifiedSentence,
    DisambiguationResult, RewrittenSentence, Sentence,
};

/// The Extractor converts a content item into final claims
pub struct Extractor<L>
where
    L: LlmProvider,
{
    oracle: ClassificationOracle<L>,
    config: ExtractorConfig,
    model_name: String,
}

#[derive(Debug, Default)]
struct StageStats {
    calls: usize,
    failures: usize,
}

impl StageStats {
    fn record(&mut self, degraded: bool) {
        self.calls += 1;
        if degraded {
            self.failures += 1;
        }
    }
}

impl<L> Extractor<L>
where
    L: LlmProvider,
{
    /// Create a new Extractor
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(llm_provider), config)
    }

    /// Create an Extractor around a shared provider
    pub fn from_shared(llm_provider: Arc<L>, config: ExtractorConfig) -> Self {
        let model_name = llm_provider.model_name().to_string();
        Self {
            oracle: ClassificationOracle::new(llm_provider, config.oracle_timeout()),
            config,
            model_name,
        }
    }

    /// Override the model name reported in metadata
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Get the extractor configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract final claims from a content item
    ///
    /// # Errors
    ///
    /// Only precondition failures are errors: empty text
    /// ([`ExtractorError::EmptyContent`]) and text over `max_text_length`
    /// ([`ExtractorError::TextTooLong`]). Oracle failures are absorbed.
    pub async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResult, ExtractorError> {
        let start_time = Instant::now();

        let text = request.text.trim();
        if text.is_empty() {
            return Err(ExtractorError::EmptyContent);
        }
        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(length, self.config.max_text_length));
        }

        let mut texts = split_sentences(text);
        let dropped_sentences = texts.len().saturating_sub(self.config.max_sentences);
        if dropped_sentences > 0 {
            warn!(
                "Content '{}' has {} sentences, dropping {} over the limit of {}",
                request.source_id,
                texts.len(),
                dropped_sentences,
                self.config.max_sentences
            );
            texts.truncate(self.config.max_sentences);
        }

        let sentences: Vec<Sentence> = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Sentence::new(index, text))
            .collect();

        info!(
            "Starting extraction for source '{}': {} sentences",
            request.source_id,
            sentences.len()
        );

        let sentence_count = sentences.len();
        let mut stats = StageStats::default();
        let traces = self.run_stages(sentences, text, &mut stats).await;

        let final_claims = traces
            .iter()
            .filter(|t| !t.sentence.is_derived())
            .map(|t| t.final_claim.clone())
            .collect();
        let claims = flatten_claims(&traces);

        let count = |category: Category| traces.iter().filter(|t| t.category() == category).count();
        let metadata = ExtractionMetadata {
            source_id: request.source_id,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            model_name: self.model_name.clone(),
            sentence_count,
            dropped_sentences,
            derived_sentence_count: traces.iter().filter(|t| t.sentence.is_derived()).count(),
            category_counts: (
                count(Category::Verifiable),
                count(Category::PartiallyVerifiable),
                count(Category::NotVerifiable),
            ),
            oracle_calls: stats.calls,
            oracle_failures: stats.failures,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Extraction complete: {} claims from {} sentences ({} derived), {} of {} oracle calls failed",
            claims.len(),
            metadata.sentence_count,
            metadata.derived_sentence_count,
            metadata.oracle_failures,
            metadata.oracle_calls
        );

        Ok(ExtractionResult {
            traces,
            final_claims,
            claims,
            metadata,
        })
    }

    async fn run_stages(&self, originals: Vec<Sentence>, context: &str, stats: &mut StageStats) -> Vec<SentenceTrace> {
        // 1. Categorize
        let reply = self.oracle.categorize(&originals).await;
        stats.record(reply.degraded);
        let mut classified = reply.value;

        // 2. Implicit claims, re-categorized
        if self.config.implicit_claims {
            let derived = self.surface_implicit_claims(&classified, originals.len(), context, stats).await;
            classified.extend(derived);
        }

        // 3. Rewrite
        let partial: Vec<&Sentence> = classified
            .iter()
            .filter(|c| c.category == Category::PartiallyVerifiable)
            .map(|c| &c.sentence)
            .collect();
        let rewrites: HashMap<usize, RewrittenSentence> = if partial.is_empty() {
            HashMap::new()
        } else {
            debug!("Rewriting {} partially verifiable sentences", partial.len());
            let reply = self.oracle.rewrite(&partial).await;
            stats.record(reply.degraded);
            reply.value
        };

        // 4. Disambiguate
        let candidates: Vec<(usize, &str)> = classified
            .iter()
            .filter_map(|c| disambiguation_candidate(c, &rewrites))
            .collect();
        let disambiguations: HashMap<usize, DisambiguationResult> = if candidates.is_empty() {
            HashMap::new()
        } else {
            debug!("Disambiguating {} candidates", candidates.len());
            let reply = self.oracle.disambiguate(&candidates, context).await;
            stats.record(reply.degraded);
            reply.value
        };

        // 5. Select
        classified
            .into_iter()
            .map(|c| build_trace(c, &rewrites, &disambiguations))
            .collect()
    }

    /// Mine rhetorical sentences for implicit claims, up to the configured depth
    async fn surface_implicit_claims(
        &self,
        classified: &[ClassifiedSentence],
        first_index: usize,
        context: &str,
        stats: &mut StageStats,
    ) -> Vec<ClassifiedSentence> {
        let mut derived_all = Vec::new();
        let mut frontier: Vec<Sentence> = classified
            .iter()
            .filter(|c| c.category.admits_implicit_claims())
            .map(|c| c.sentence.clone())
            .collect();
        let mut next_index = first_index;

        for depth in 0..self.config.implicit_claim_depth {
            if frontier.is_empty() {
                break;
            }

            let refs: Vec<&Sentence> = frontier.iter().collect();
            let reply = self.oracle.implicit_claims(&refs, context).await;
            stats.record(reply.degraded);

            let mut derived = Vec::new();
            for (parent, claims) in reply.value {
                for text in claims.into_iter().take(self.config.max_implicit_claims_per_sentence) {
                    derived.push(Sentence::derived(next_index, text, parent));
                    next_index += 1;
                }
            }
            if derived.is_empty() {
                break;
            }
            debug!("Depth {}: {} implicit claims surfaced", depth + 1, derived.len());

            let reply = self.oracle.categorize(&derived).await;
            stats.record(reply.degraded);

            frontier = reply
                .value
                .iter()
                .filter(|c| c.category.admits_implicit_claims())
                .map(|c| c.sentence.clone())
                .collect();
            derived_all.extend(reply.value);
        }

        derived_all
    }
}

/// Text a sentence is disambiguated on, if it is a candidate at all
fn disambiguation_candidate<'a>(
    classified: &'a ClassifiedSentence,
    rewrites: &'a HashMap<usize, RewrittenSentence>,
) -> Option<(usize, &'a str)> {
    let index = classified.sentence.index;
    match classified.category {
        Category::Verifiable => Some((index, classified.sentence.text.as_str())),
        Category::PartiallyVerifiable => rewrites
            .get(&index)
            .filter(|r| r.has_residue())
            .map(|r| (index, r.rewritten_text.as_str())),
        Category::NotVerifiable => None,
    }
}

fn build_trace(
    classified: ClassifiedSentence,
    rewrites: &HashMap<usize, RewrittenSentence>,
    disambiguations: &HashMap<usize, DisambiguationResult>,
) -> SentenceTrace {
    let index = classified.sentence.index;
    let disambiguation = disambiguations.get(&index).cloned();

    let state = ClaimState {
        category: classified.category,
        original_text: classified.sentence.text.clone(),
        rewritten_text: rewrites.get(&index).map(|r| r.rewritten_text.clone()),
        ambiguity: disambiguation.as_ref().map_or(Ambiguity::Clear, |d| d.ambiguity),
        disambiguated_text: disambiguation
            .as_ref()
            .and_then(|d| d.replacement())
            .map(str::to_string),
    };
    let final_claim = select_final_claim(&state);
    debug!("Sentence {} resolved by {:?}", index, final_claim.rule);

    SentenceTrace {
        sentence: classified.sentence,
        reasoning: classified.reasoning,
        state,
        disambiguation,
        final_claim,
    }
}

/// Non-null claims: each original's claim, then claims derived from it
fn flatten_claims(traces: &[SentenceTrace]) -> Vec<ExtractedClaim> {
    let origins: HashMap<usize, Option<usize>> = traces
        .iter()
        .map(|t| (t.sentence.index, t.sentence.origin))
        .collect();

    let root_of = |mut index: usize| {
        // Origins always point at lower indices, so this terminates
        while let Some(Some(parent)) = origins.get(&index) {
            index = *parent;
        }
        index
    };

    let to_claim = |trace: &SentenceTrace| {
        trace.final_claim.text.as_ref().map(|text| ExtractedClaim {
            claim_id: ClaimId::new(),
            text: text.clone(),
            sentence_index: trace.sentence.index,
            origin: trace.sentence.origin,
            rule: trace.final_claim.rule,
        })
    };

    let mut claims = Vec::new();
    for original in traces.iter().filter(|t| !t.sentence.is_derived()) {
        claims.extend(to_claim(original));
        claims.extend(
            traces
                .iter()
                .filter(|t| t.sentence.is_derived() && root_of(t.sentence.index) == original.sentence.index)
                .filter_map(to_claim),
        );
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_domain::{FinalClaim, SelectionRule};

    fn trace(sentence: Sentence, text: Option<&str>) -> SentenceTrace {
        let rule = if text.is_some() {
            SelectionRule::VerifiableClear
        } else {
            SelectionRule::NotVerifiable
        };
        SentenceTrace {
            state: ClaimState::categorized(Category::Verifiable, sentence.text.clone()),
            sentence,
            reasoning: String::new(),
            disambiguation: None,
            final_claim: FinalClaim {
                text: text.map(str::to_string),
                rule,
            },
        }
    }

    #[test]
    fn test_flatten_places_derived_after_root() {
        let traces = vec![
            trace(Sentence::new(0, "a"), Some("a")),
            trace(Sentence::new(1, "b"), None),
            trace(Sentence::new(2, "c"), Some("c")),
            trace(Sentence::derived(3, "b1", 1), Some("b1")),
            trace(Sentence::derived(4, "a1", 0), Some("a1")),
            // Second-level derivation roots at sentence 1
            trace(Sentence::derived(5, "b11", 3), Some("b11")),
        ];

        let texts: Vec<_> = flatten_claims(&traces).into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["a", "a1", "b1", "b11", "c"]);
    }

    #[test]
    fn test_candidate_selection() {
        let mut rewrites = HashMap::new();
        rewrites.insert(
            1,
            RewrittenSentence {
                index: 1,
                rewritten_text: "rewritten".to_string(),
            },
        );
        rewrites.insert(
            2,
            RewrittenSentence {
                index: 2,
                rewritten_text: "  ".to_string(),
            },
        );

        let verifiable = ClassifiedSentence::new(Sentence::new(0, "orig"), Category::Verifiable, "");
        let partial = ClassifiedSentence::new(Sentence::new(1, "p"), Category::PartiallyVerifiable, "");
        let empty = ClassifiedSentence::new(Sentence::new(2, "e"), Category::PartiallyVerifiable, "");
        let opinion = ClassifiedSentence::new(Sentence::new(3, "o"), Category::NotVerifiable, "");

        assert_eq!(disambiguation_candidate(&verifiable, &rewrites), Some((0, "orig")));
        assert_eq!(disambiguation_candidate(&partial, &rewrites), Some((1, "rewritten")));
        assert_eq!(disambiguation_candidate(&empty, &rewrites), None);
        assert_eq!(disambiguation_candidate(&opinion, &rewrites), None);
    }
}
