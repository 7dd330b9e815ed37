//! Classification oracle client
//!
//! Wraps the four judgment calls of the extraction pipeline. Every call
//! returns a complete answer: when the provider fails, times out, or replies
//! with something unreadable, the affected items get a safe fallback and the
//! reply is marked `degraded`.

use crate::error::ExtractorError;
use crate::parser::{parse_categories, parse_disambiguations, parse_implicit_claims, parse_rewrites};
use crate::prompt::{categorize_prompt, disambiguate_prompt, implicit_claims_prompt, rewrite_prompt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use verity_domain::traits::LlmProvider;
use verity_domain::{Category, ClassifiedSentence, DisambiguationResult, RewrittenSentence, Sentence};

/// Reasoning recorded when a sentence could not be classified
pub const CLASSIFICATION_UNAVAILABLE: &str = "classification unavailable";

/// Answer from one oracle call
#[derive(Debug, Clone, PartialEq)]
pub struct OracleReply<T> {
    /// Parsed answer, with fallbacks filled in
    pub value: T,

    /// Whether the call failed as a whole and `value` is entirely fallback
    pub degraded: bool,
}

impl<T> OracleReply<T> {
    fn ok(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }

    fn degraded(value: T) -> Self {
        Self {
            value,
            degraded: true,
        }
    }
}

/// Client for the classification, implicit-claim, rewrite and disambiguation oracles
pub struct ClassificationOracle<L>
where
    L: LlmProvider,
{
    llm: Arc<L>,
    call_timeout: Duration,
}

impl<L> ClassificationOracle<L>
where
    L: LlmProvider,
{
    /// Create a new oracle client
    pub fn new(llm: Arc<L>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    /// Classify every sentence in one call
    ///
    /// Sentences the oracle does not answer for, or the whole batch on
    /// failure, default to `NotVerifiable` with [`CLASSIFICATION_UNAVAILABLE`].
    pub async fn categorize(&self, sentences: &[Sentence]) -> OracleReply<Vec<ClassifiedSentence>> {
        let parsed = match self.call(&categorize_prompt(sentences)).await {
            Ok(response) => parse_categories(&response),
            Err(e) => Err(e),
        };

        let (entries, degraded) = match parsed {
            Ok(entries) => (entries, false),
            Err(e) => {
                warn!("Categorization failed for {} sentences: {}", sentences.len(), e);
                (Vec::new(), true)
            }
        };

        let mut by_index: HashMap<usize, (Category, String)> = HashMap::new();
        for entry in entries {
            // First answer for an id wins
            by_index.entry(entry.index).or_insert((entry.category, entry.reasoning));
        }

        let classified = sentences
            .iter()
            .map(|sentence| match by_index.remove(&sentence.index) {
                Some((category, reasoning)) => ClassifiedSentence::new(sentence.clone(), category, reasoning),
                None => {
                    if !degraded {
                        debug!("No category for sentence {}, defaulting", sentence.index);
                    }
                    ClassifiedSentence::new(
                        sentence.clone(),
                        Category::NotVerifiable,
                        CLASSIFICATION_UNAVAILABLE,
                    )
                }
            })
            .collect();

        reply(classified, degraded)
    }

    /// Surface implicit claims for rhetorical sentences
    ///
    /// Returns (parent index, claims) for the requested sentences only. On
    /// failure no claims are surfaced.
    pub async fn implicit_claims(
        &self,
        sentences: &[&Sentence],
        context: &str,
    ) -> OracleReply<Vec<(usize, Vec<String>)>> {
        let parsed = match self.call(&implicit_claims_prompt(sentences, context)).await {
            Ok(response) => parse_implicit_claims(&response),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(entries) => {
                let mut claims: Vec<(usize, Vec<String>)> = entries
                    .into_iter()
                    .filter(|(index, _)| sentences.iter().any(|s| s.index == *index))
                    .collect();
                claims.sort_by_key(|(index, _)| *index);
                claims.dedup_by_key(|(index, _)| *index);
                OracleReply::ok(claims)
            }
            Err(e) => {
                warn!("Implicit-claim extraction failed: {}", e);
                OracleReply::degraded(Vec::new())
            }
        }
    }

    /// Rewrite partially verifiable sentences
    ///
    /// Sentences without an answer are absent from the map, which the
    /// pipeline treats as "no rewrite".
    pub async fn rewrite(&self, sentences: &[&Sentence]) -> OracleReply<HashMap<usize, RewrittenSentence>> {
        let parsed = match self.call(&rewrite_prompt(sentences)).await {
            Ok(response) => parse_rewrites(&response),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(rewrites) => {
                let mut by_index = HashMap::new();
                for rewrite in rewrites {
                    if sentences.iter().any(|s| s.index == rewrite.index) {
                        by_index.entry(rewrite.index).or_insert(rewrite);
                    }
                }
                OracleReply::ok(by_index)
            }
            Err(e) => {
                warn!("Rewrite failed for {} sentences: {}", sentences.len(), e);
                OracleReply::degraded(HashMap::new())
            }
        }
    }

    /// Check candidate claims for ambiguity
    ///
    /// Candidates without an answer, or all of them on failure, come back
    /// ambiguous with no replacement.
    pub async fn disambiguate(
        &self,
        candidates: &[(usize, &str)],
        context: &str,
    ) -> OracleReply<HashMap<usize, DisambiguationResult>> {
        let parsed = match self.call(&disambiguate_prompt(candidates, context)).await {
            Ok(response) => parse_disambiguations(&response),
            Err(e) => Err(e),
        };

        let (results, degraded) = match parsed {
            Ok(results) => (results, false),
            Err(e) => {
                warn!("Disambiguation failed for {} candidates: {}", candidates.len(), e);
                (Vec::new(), true)
            }
        };

        let mut by_index: HashMap<usize, DisambiguationResult> = HashMap::new();
        for result in results {
            by_index.entry(result.index).or_insert(result);
        }

        let complete = candidates
            .iter()
            .map(|(index, _)| {
                let result = by_index
                    .remove(index)
                    .unwrap_or_else(|| DisambiguationResult::unresolved(*index, None));
                (*index, result)
            })
            .collect();

        reply(complete, degraded)
    }

    async fn call(&self, prompt: &str) -> Result<String, ExtractorError> {
        debug!("Oracle prompt length: {} chars", prompt.len());

        let response = timeout(self.call_timeout, self.llm.generate_json(prompt))
            .await
            .map_err(|_| ExtractorError::Timeout)?
            .map_err(|e| ExtractorError::Llm(e.to_string()))?;

        debug!("Oracle response length: {} chars", response.len());
        Ok(response)
    }
}

fn reply<T>(value: T, degraded: bool) -> OracleReply<T> {
    if degraded {
        OracleReply::degraded(value)
    } else {
        OracleReply::ok(value)
    }
}
