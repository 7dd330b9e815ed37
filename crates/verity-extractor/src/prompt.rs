//! LLM prompt engineering for the classification oracles
//!
//! Each prompt opens with a task marker line (`TASK: ...`) naming the oracle,
//! followed by instructions, optional context, the numbered sentences as JSON
//! lines, and the output format.

use serde_json::json;
use verity_domain::Sentence;

/// Marker line of the categorize prompt
pub const CATEGORIZE_TASK: &str = "TASK: categorize";

/// Marker line of the implicit-claim prompt
pub const IMPLICIT_CLAIMS_TASK: &str = "TASK: implicit-claims";

/// Marker line of the rewrite prompt
pub const REWRITE_TASK: &str = "TASK: rewrite";

/// Marker line of the disambiguate prompt
pub const DISAMBIGUATE_TASK: &str = "TASK: disambiguate";

/// Maximum context characters included in a prompt
const MAX_CONTEXT_CHARS: usize = 4_000;

/// Builds prompts for the classification oracles
pub struct PromptBuilder<'a> {
    task: &'static str,
    instructions: &'static str,
    output_format: &'static str,
    context: Option<&'a str>,
    items: Vec<(usize, &'a str)>,
}

impl<'a> PromptBuilder<'a> {
    fn new(task: &'static str, instructions: &'static str, output_format: &'static str) -> Self {
        Self {
            task,
            instructions,
            output_format,
            context: None,
            items: Vec::new(),
        }
    }

    /// Add the surrounding content item as context
    pub fn with_context(mut self, context: &'a str) -> Self {
        self.context = Some(context);
        self
    }

    /// Add numbered items to judge
    pub fn with_items(mut self, items: impl IntoIterator<Item = (usize, &'a str)>) -> Self {
        self.items.extend(items);
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(self.task);
        prompt.push_str("\n\n");
        prompt.push_str(self.instructions);
        prompt.push_str("\n\n");

        if let Some(context) = self.context {
            prompt.push_str("Context (the full text the sentences come from):\n---\n");
            prompt.push_str(truncate_chars(context, MAX_CONTEXT_CHARS));
            prompt.push_str("\n---\n\n");
        }

        prompt.push_str("Sentences:\n");
        for (id, text) in &self.items {
            prompt.push_str(&json!({ "id": id, "text": text }).to_string());
            prompt.push('\n');
        }
        prompt.push('\n');

        prompt.push_str(self.output_format);
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// Prompt classifying every sentence of a content item
pub fn categorize_prompt(sentences: &[Sentence]) -> String {
    PromptBuilder::new(CATEGORIZE_TASK, CATEGORIZE_INSTRUCTIONS, CATEGORIZE_FORMAT)
        .with_items(sentences.iter().map(|s| (s.index, s.text.as_str())))
        .build()
}

/// Prompt surfacing claims implied by rhetorical sentences
pub fn implicit_claims_prompt(sentences: &[&Sentence], context: &str) -> String {
    PromptBuilder::new(IMPLICIT_CLAIMS_TASK, IMPLICIT_INSTRUCTIONS, IMPLICIT_FORMAT)
        .with_context(context)
        .with_items(sentences.iter().map(|s| (s.index, s.text.as_str())))
        .build()
}

/// Prompt rewriting partially verifiable sentences
pub fn rewrite_prompt(sentences: &[&Sentence]) -> String {
    PromptBuilder::new(REWRITE_TASK, REWRITE_INSTRUCTIONS, REWRITE_FORMAT)
        .with_items(sentences.iter().map(|s| (s.index, s.text.as_str())))
        .build()
}

/// Prompt checking candidate claims for ambiguity
pub fn disambiguate_prompt(candidates: &[(usize, &str)], context: &str) -> String {
    PromptBuilder::new(DISAMBIGUATE_TASK, DISAMBIGUATE_INSTRUCTIONS, DISAMBIGUATE_FORMAT)
        .with_context(context)
        .with_items(candidates.iter().copied())
        .build()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

const CATEGORIZE_INSTRUCTIONS: &str = r#"Classify each sentence by whether it can be fact-checked.

Categories:
- "verifiable": states facts that can be checked against public sources as written
  (events, dates, quantities, attributions, measurable properties)
- "partially_verifiable": mixes checkable facts with opinion, hedging, prediction
  or subjective language ("reportedly", "amazing", "I think")
- "not_verifiable": opinions, questions, commands, feelings, jokes or greetings
  with nothing checkable

Rules:
- Assign exactly one category per sentence
- Judge each sentence as written; do not assume facts that are not stated
- Give a one-sentence reasoning for each decision"#;

const CATEGORIZE_FORMAT: &str = r#"Output format (JSON array, one object per sentence id):
[
  {"id": 0, "category": "verifiable", "reasoning": "states a release date"}
]"#;

const IMPLICIT_INSTRUCTIONS: &str = r#"Some sentences imply factual claims without stating them directly
(rhetorical questions, sarcasm, loaded framing). For each sentence, list the
factual claims it implies, written as plain declarative statements.

Rules:
- Only list claims a reasonable reader would take the speaker to be asserting
- Each claim must stand alone: no pronouns that need the original sentence
- Return an empty list for sentences that imply nothing factual"#;

const IMPLICIT_FORMAT: &str = r#"Output format (JSON array):
[
  {"id": 3, "claims": ["The city budget doubled between 2020 and 2023."]}
]"#;

const REWRITE_INSTRUCTIONS: &str = r#"Rewrite each sentence so that only its verifiable content remains.

Rules:
- Remove subjective, emotional, hedging and promotional language
- Preserve every named entity, number, date and action exactly
- Do not add information that is not in the sentence
- If nothing verifiable remains, return an empty string"#;

const REWRITE_FORMAT: &str = r#"Output format (JSON array):
[
  {"id": 2, "rewritten_text": "The company reported revenue of $4 billion in 2023."}
]"#;

const DISAMBIGUATE_INSTRUCTIONS: &str = r#"Decide whether each sentence is ambiguous when read on its own.

Ambiguity types:
- "referential": pronouns or references whose target is unclear ("he", "the company", "that year")
- "structural": the sentence has more than one plausible reading

Rules:
- If a sentence is ambiguous and the context resolves it with confidence, give a
  self-contained replacement sentence in "disambiguated_text"
- If the context does not resolve it, set "disambiguated_text" to an empty string;
  never guess
- For clear sentences set "is_ambiguous" to false"#;

const DISAMBIGUATE_FORMAT: &str = r#"Output format (JSON array):
[
  {"id": 1, "is_ambiguous": true, "ambiguity_type": "referential",
   "disambiguated_text": "Tim Cook announced the iPhone 15 in 2023."}
]"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Remember: Return ONLY valid JSON, no markdown code blocks, no explanations.";

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences() -> Vec<Sentence> {
        vec![
            Sentence::new(0, "Apple released the iPhone 15."),
            Sentence::new(1, "It is \"amazing\"."),
        ]
    }

    #[test]
    fn test_categorize_prompt_lists_sentences_with_ids() {
        let prompt = categorize_prompt(&sentences());
        assert!(prompt.starts_with(CATEGORIZE_TASK));
        assert!(prompt.contains(r#"{"id":0,"text":"Apple released the iPhone 15."}"#));
        // Quotes are escaped inside the JSON line
        assert!(prompt.contains(r#"{"id":1,"text":"It is \"amazing\"."}"#));
        assert!(prompt.contains("partially_verifiable"));
    }

    #[test]
    fn test_prompts_carry_distinct_markers() {
        let sentences = sentences();
        let refs: Vec<&Sentence> = sentences.iter().collect();

        let rewrite = rewrite_prompt(&refs);
        let implicit = implicit_claims_prompt(&refs, "context");
        let disambiguate = disambiguate_prompt(&[(0, "He did it.")], "context");

        assert!(rewrite.contains(REWRITE_TASK) && !rewrite.contains(CATEGORIZE_TASK));
        assert!(implicit.contains(IMPLICIT_CLAIMS_TASK));
        assert!(disambiguate.contains(DISAMBIGUATE_TASK));
    }

    #[test]
    fn test_context_included_and_truncated() {
        let long_context = "x".repeat(MAX_CONTEXT_CHARS + 100);
        let prompt = disambiguate_prompt(&[(0, "He did it.")], &long_context);

        assert!(prompt.contains("Context"));
        assert!(prompt.contains(&"x".repeat(MAX_CONTEXT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_CONTEXT_CHARS + 1)));
    }

    #[test]
    fn test_rewrite_prompt_has_no_context() {
        let sentences = sentences();
        let prompt = rewrite_prompt(&[&sentences[1]]);
        assert!(!prompt.contains("Context"));
        assert!(prompt.contains("rewritten_text"));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
