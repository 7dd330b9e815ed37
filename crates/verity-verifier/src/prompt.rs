//! Verification prompt
//!
//! Claims are numbered by their position in the call. Each claim is followed
//! by its evidence as source-tagged blocks:
//!
//! ```text
//! CLAIM 0: The Golden Gate Bridge opened in 1937.
//! [Source 1: https://example.org/bridge]
//! The bridge opened to traffic on May 28, 1937.
//! ```

use crate::config::VerifierConfig;
use crate::types::VerificationRequest;
use std::fmt::Write;

/// Marker line of the verification prompt
pub const VERIFY_TASK: &str = "TASK: verify";

const VERIFY_INSTRUCTIONS: &str = "You are a careful fact-checker. Judge each claim ONLY against \
the evidence listed under it. Do not use outside knowledge.

Pick exactly one verdict per claim:
- \"Support\": the evidence confirms the claim (trust_score 100)
- \"Partially Support\": the evidence confirms part of the claim (trust_score 50)
- \"Unclear\": the evidence is insufficient or off-topic (trust_score null)
- \"Contradict\": the evidence conflicts with part of the claim (trust_score 0)
- \"Refute\": the evidence shows the claim is false (trust_score 0)";

/// Build the prompt for one verification call
pub fn verify_prompt(batch: &[VerificationRequest], config: &VerifierConfig) -> String {
    let mut prompt = String::new();

    prompt.push_str(VERIFY_TASK);
    prompt.push_str("\n\n");
    prompt.push_str(VERIFY_INSTRUCTIONS);
    prompt.push_str("\n\n");

    for (id, request) in batch.iter().enumerate() {
        let _ = writeln!(prompt, "CLAIM {}: {}", id, request.claim);
        let chunks = request
            .evidence
            .iter()
            .filter(|chunk| !chunk.sentences.is_empty())
            .take(config.max_evidence_chunks);
        for (n, chunk) in chunks.enumerate() {
            let _ = writeln!(prompt, "[Source {}: {}]", n + 1, chunk.source_id);
            prompt.push_str(&chunk.text());
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    let _ = write!(
        prompt,
        "Respond with a JSON array holding one object per claim:\n\
[{{\"id\": 0, \"verdict\": \"Support\", \"trust_score\": 100, \"reason\": \"...\", \"references\": [\"...\"]}}]\n\n\
\"reason\" is one or two sentences, at most {} characters. \
\"references\" holds at most {} short quotes copied from the evidence.\n\n\
Respond with ONLY the JSON, no other text.",
        config.max_reason_chars, config.max_references
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_domain::{ClaimId, EvidenceChunk};

    fn chunk(source: &str, sentences: &[&str]) -> EvidenceChunk {
        EvidenceChunk {
            source_id: source.to_string(),
            sentences: sentences.iter().map(|s| s.to_string()).collect(),
            relevance_score: None,
        }
    }

    #[test]
    fn test_sources_are_tagged_in_order() {
        let request = VerificationRequest::new(
            ClaimId::new(),
            "The bridge opened in 1937.",
            vec![
                chunk("a.org", &["It opened in 1937.", "Crowds walked across."]),
                chunk("b.org", &["Construction ended in 1937."]),
            ],
        );

        let prompt = verify_prompt(&[request], &VerifierConfig::default());

        assert!(prompt.starts_with(VERIFY_TASK));
        assert!(prompt.contains("CLAIM 0: The bridge opened in 1937.\n[Source 1: a.org]\nIt opened in 1937. Crowds walked across.\n[Source 2: b.org]\n"));
        assert!(prompt.contains("at most 500 characters"));
    }

    #[test]
    fn test_evidence_capped_and_empty_chunks_skipped() {
        let request = VerificationRequest::new(
            ClaimId::new(),
            "claim",
            vec![
                chunk("empty", &[]),
                chunk("one", &["1."]),
                chunk("two", &["2."]),
                chunk("three", &["3."]),
                chunk("four", &["4."]),
            ],
        );

        let prompt = verify_prompt(&[request], &VerifierConfig::default());

        assert!(!prompt.contains("empty"));
        assert!(prompt.contains("[Source 3: three]"));
        assert!(!prompt.contains("four"));
    }

    #[test]
    fn test_batch_numbers_claims_by_position() {
        let batch = vec![
            VerificationRequest::new(ClaimId::new(), "first", vec![chunk("s", &["x."])]),
            VerificationRequest::new(ClaimId::new(), "second", vec![chunk("s", &["y."])]),
        ];

        let prompt = verify_prompt(&batch, &VerifierConfig::default());
        assert!(prompt.contains("CLAIM 0: first"));
        assert!(prompt.contains("CLAIM 1: second"));
    }
}
