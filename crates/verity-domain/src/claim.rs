//! Claim module - final claim selection
//!
//! Stage five of the extraction pipeline is a pure function of the state the
//! earlier stages produced. No oracle is consulted here, so re-running the
//! selection on the same state always yields the same claim.

use crate::sentence::{Ambiguity, Category};
use std::fmt;

/// Identifier for a claim travelling through verification, based on UUIDv7
///
/// Verification results resolve in completion order, not request order, so
/// each result carries the id of the claim it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimId(u128);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use verity_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Parse a ClaimId from its hyphenated string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid claim id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Everything the earlier pipeline stages learned about one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimState {
    /// Category from the categorize stage
    pub category: Category,

    /// Sentence text as written
    pub original_text: String,

    /// Rewrite stage output (`None` when no rewrite was produced)
    pub rewritten_text: Option<String>,

    /// Ambiguity verdict from the disambiguate stage
    pub ambiguity: Ambiguity,

    /// Confident replacement text from the disambiguate stage
    pub disambiguated_text: Option<String>,
}

impl ClaimState {
    /// State for a sentence that only went through categorization
    pub fn categorized(category: Category, original_text: impl Into<String>) -> Self {
        Self {
            category,
            original_text: original_text.into(),
            rewritten_text: None,
            ambiguity: Ambiguity::Clear,
            disambiguated_text: None,
        }
    }

    fn rewrite(&self) -> Option<&str> {
        non_blank(self.rewritten_text.as_deref())
    }

    fn replacement(&self) -> Option<&str> {
        non_blank(self.disambiguated_text.as_deref())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// The single rule that decided a final claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionRule {
    /// Verifiable and not ambiguous: the original text
    VerifiableClear,
    /// Verifiable, ambiguous, confidently disambiguated
    VerifiableDisambiguated,
    /// Verifiable, ambiguous, no replacement: no claim
    VerifiableUnresolved,
    /// Partially verifiable, rewritten, not ambiguous: the rewrite
    RewrittenClear,
    /// Partially verifiable, rewritten, ambiguous, disambiguated
    RewrittenDisambiguated,
    /// Partially verifiable, rewritten, ambiguous, no replacement: no claim
    RewrittenUnresolved,
    /// Partially verifiable with an empty or missing rewrite: no claim
    NoVerifiableResidue,
    /// Not verifiable: no claim
    NotVerifiable,
}

impl SelectionRule {
    /// Whether this rule produces a claim
    pub fn yields_claim(&self) -> bool {
        matches!(
            self,
            SelectionRule::VerifiableClear
                | SelectionRule::VerifiableDisambiguated
                | SelectionRule::RewrittenClear
                | SelectionRule::RewrittenDisambiguated
        )
    }
}

/// The claim a sentence resolves to, with the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalClaim {
    /// Claim text (`None` when the sentence yields no claim)
    pub text: Option<String>,

    /// Rule that decided the outcome
    pub rule: SelectionRule,
}

impl FinalClaim {
    fn some(text: &str, rule: SelectionRule) -> Self {
        Self {
            text: Some(text.to_string()),
            rule,
        }
    }

    fn none(rule: SelectionRule) -> Self {
        Self { text: None, rule }
    }
}

/// Decide the final claim for one sentence
///
/// # Examples
///
/// ```
/// use verity_domain::{select_final_claim, Category, ClaimState, SelectionRule};
///
/// let state = ClaimState::categorized(
///     Category::Verifiable,
///     "Apple Inc. released the iPhone 15 on September 22, 2023",
/// );
/// let claim = select_final_claim(&state);
/// assert_eq!(claim.text.as_deref(), Some("Apple Inc. released the iPhone 15 on September 22, 2023"));
/// assert_eq!(claim.rule, SelectionRule::VerifiableClear);
/// ```
pub fn select_final_claim(state: &ClaimState) -> FinalClaim {
    match state.category {
        Category::NotVerifiable => FinalClaim::none(SelectionRule::NotVerifiable),
        Category::Verifiable => match (state.ambiguity, state.replacement()) {
            (Ambiguity::Clear, _) => {
                FinalClaim::some(&state.original_text, SelectionRule::VerifiableClear)
            }
            (Ambiguity::Ambiguous(_), Some(text)) => {
                FinalClaim::some(text, SelectionRule::VerifiableDisambiguated)
            }
            (Ambiguity::Ambiguous(_), None) => {
                FinalClaim::none(SelectionRule::VerifiableUnresolved)
            }
        },
        Category::PartiallyVerifiable => {
            let Some(rewrite) = state.rewrite() else {
                return FinalClaim::none(SelectionRule::NoVerifiableResidue);
            };
            match (state.ambiguity, state.replacement()) {
                (Ambiguity::Clear, _) => FinalClaim::some(rewrite, SelectionRule::RewrittenClear),
                (Ambiguity::Ambiguous(_), Some(text)) => {
                    FinalClaim::some(text, SelectionRule::RewrittenDisambiguated)
                }
                (Ambiguity::Ambiguous(_), None) => {
                    FinalClaim::none(SelectionRule::RewrittenUnresolved)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::AmbiguityKind;

    fn state(
        category: Category,
        rewritten: Option<&str>,
        ambiguity: Ambiguity,
        disambiguated: Option<&str>,
    ) -> ClaimState {
        ClaimState {
            category,
            original_text: "He said the plant closed in 2019".to_string(),
            rewritten_text: rewritten.map(str::to_string),
            ambiguity,
            disambiguated_text: disambiguated.map(str::to_string),
        }
    }

    #[test]
    fn test_verifiable_clear_keeps_original() {
        let claim = select_final_claim(&state(Category::Verifiable, None, Ambiguity::Clear, None));
        assert_eq!(claim.text.as_deref(), Some("He said the plant closed in 2019"));
        assert_eq!(claim.rule, SelectionRule::VerifiableClear);
    }

    #[test]
    fn test_verifiable_disambiguated() {
        let claim = select_final_claim(&state(
            Category::Verifiable,
            None,
            Ambiguity::Ambiguous(Some(AmbiguityKind::Referential)),
            Some("John Smith said the Ford plant closed in 2019"),
        ));
        assert_eq!(
            claim.text.as_deref(),
            Some("John Smith said the Ford plant closed in 2019")
        );
        assert_eq!(claim.rule, SelectionRule::VerifiableDisambiguated);
    }

    #[test]
    fn test_verifiable_unresolved_is_null() {
        let claim = select_final_claim(&state(
            Category::Verifiable,
            None,
            Ambiguity::Ambiguous(Some(AmbiguityKind::Referential)),
            None,
        ));
        assert_eq!(claim.text, None);
        assert_eq!(claim.rule, SelectionRule::VerifiableUnresolved);
    }

    #[test]
    fn test_blank_replacement_counts_as_unresolved() {
        let claim = select_final_claim(&state(
            Category::Verifiable,
            None,
            Ambiguity::Ambiguous(None),
            Some("   "),
        ));
        assert_eq!(claim.rule, SelectionRule::VerifiableUnresolved);
    }

    #[test]
    fn test_partial_rewrite_clear() {
        let claim = select_final_claim(&state(
            Category::PartiallyVerifiable,
            Some("The plant closed in 2019"),
            Ambiguity::Clear,
            None,
        ));
        assert_eq!(claim.text.as_deref(), Some("The plant closed in 2019"));
        assert_eq!(claim.rule, SelectionRule::RewrittenClear);
    }

    #[test]
    fn test_partial_rewrite_disambiguated() {
        let claim = select_final_claim(&state(
            Category::PartiallyVerifiable,
            Some("The plant closed in 2019"),
            Ambiguity::Ambiguous(Some(AmbiguityKind::Referential)),
            Some("The Ford Wayne plant closed in 2019"),
        ));
        assert_eq!(claim.text.as_deref(), Some("The Ford Wayne plant closed in 2019"));
        assert_eq!(claim.rule, SelectionRule::RewrittenDisambiguated);
    }

    #[test]
    fn test_partial_rewrite_unresolved() {
        let claim = select_final_claim(&state(
            Category::PartiallyVerifiable,
            Some("The plant closed in 2019"),
            Ambiguity::Ambiguous(Some(AmbiguityKind::Structural)),
            None,
        ));
        assert_eq!(claim.text, None);
        assert_eq!(claim.rule, SelectionRule::RewrittenUnresolved);
    }

    #[test]
    fn test_partial_empty_rewrite_is_null() {
        for rewrite in [None, Some(""), Some("  ")] {
            let claim = select_final_claim(&state(
                Category::PartiallyVerifiable,
                rewrite,
                Ambiguity::Clear,
                Some("ignored"),
            ));
            assert_eq!(claim.text, None);
            assert_eq!(claim.rule, SelectionRule::NoVerifiableResidue);
        }
    }

    #[test]
    fn test_not_verifiable_ignores_other_state() {
        let claim = select_final_claim(&state(
            Category::NotVerifiable,
            Some("rewrite"),
            Ambiguity::Ambiguous(None),
            Some("replacement"),
        ));
        assert_eq!(claim.text, None);
        assert_eq!(claim.rule, SelectionRule::NotVerifiable);
    }

    #[test]
    fn test_rule_yields_claim_matches_text() {
        let claim = select_final_claim(&state(Category::Verifiable, None, Ambiguity::Clear, None));
        assert!(claim.rule.yields_claim());
        let claim = select_final_claim(&state(Category::NotVerifiable, None, Ambiguity::Clear, None));
        assert!(!claim.rule.yields_claim());
    }

    #[test]
    fn test_claim_id_display_and_parse() {
        let id = ClaimId::new();
        let id_str = id.to_string();
        assert_eq!(id_str.len(), 36);
        assert_eq!(ClaimId::from_string(&id_str).unwrap(), id);
        assert!(ClaimId::from_string("not-a-valid-uuid").is_err());
    }
}
