//! Sentence module - the unit of input for claim extraction

use std::fmt;

/// A sentence from a content item
///
/// Sentences are created once per content item and never mutated. Sentences
/// surfaced by implicit-claim extraction carry the index of the sentence they
/// were derived from in `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Sentence text as it appeared in the source
    pub text: String,

    /// Position of this sentence within its content item
    pub index: usize,

    /// Index of the parent sentence, for derived (implicit) sentences
    pub origin: Option<usize>,
}

impl Sentence {
    /// Create a sentence read directly from the input
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            index,
            origin: None,
        }
    }

    /// Create a sentence derived from another sentence
    pub fn derived(index: usize, text: impl Into<String>, origin: usize) -> Self {
        Self {
            text: text.into(),
            index,
            origin: Some(origin),
        }
    }

    /// Whether this sentence came from implicit-claim extraction
    pub fn is_derived(&self) -> bool {
        self.origin.is_some()
    }
}

/// Verifiability category assigned by the classification oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The sentence states checkable facts as written
    Verifiable,

    /// The sentence mixes checkable facts with opinion or hedging
    PartiallyVerifiable,

    /// Nothing in the sentence can be checked
    NotVerifiable,
}

impl Category {
    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Verifiable => "verifiable",
            Category::PartiallyVerifiable => "partially_verifiable",
            Category::NotVerifiable => "not_verifiable",
        }
    }

    /// Parse a category, tolerating case, spacing and separator differences
    ///
    /// # Examples
    ///
    /// ```
    /// use verity_domain::Category;
    ///
    /// assert_eq!(Category::parse("Partially Verifiable"), Some(Category::PartiallyVerifiable));
    /// assert_eq!(Category::parse("NOT_VERIFIABLE"), Some(Category::NotVerifiable));
    /// assert_eq!(Category::parse("maybe"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "verifiable" => Some(Category::Verifiable),
            "partiallyverifiable" | "partial" | "partlyverifiable" => {
                Some(Category::PartiallyVerifiable)
            }
            "notverifiable" | "unverifiable" | "nonverifiable" => Some(Category::NotVerifiable),
            _ => None,
        }
    }

    /// Whether sentences of this category are offered to implicit-claim extraction
    pub fn admits_implicit_claims(&self) -> bool {
        matches!(self, Category::NotVerifiable | Category::PartiallyVerifiable)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sentence together with its single category
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSentence {
    /// The classified sentence
    pub sentence: Sentence,

    /// Exactly one category per sentence
    pub category: Category,

    /// Oracle's explanation for the category
    pub reasoning: String,
}

impl ClassifiedSentence {
    /// Create a classified sentence
    pub fn new(sentence: Sentence, category: Category, reasoning: impl Into<String>) -> Self {
        Self {
            sentence,
            category,
            reasoning: reasoning.into(),
        }
    }
}

/// Result of the rewrite stage for a partially verifiable sentence
///
/// An empty `rewritten_text` means nothing verifiable survived the rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenSentence {
    /// Index of the rewritten sentence
    pub index: usize,

    /// Sentence with subjective and hedging language removed
    pub rewritten_text: String,
}

impl RewrittenSentence {
    /// Whether any verifiable residue survived
    pub fn has_residue(&self) -> bool {
        !self.rewritten_text.trim().is_empty()
    }
}

/// Kind of ambiguity flagged by the disambiguation oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbiguityKind {
    /// Unresolved pronouns or references ("he", "the company")
    Referential,

    /// Multiple plausible parses of the sentence structure
    Structural,
}

impl AmbiguityKind {
    /// Parse an ambiguity kind, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "referential" | "reference" => Some(AmbiguityKind::Referential),
            "structural" | "structure" | "syntactic" => Some(AmbiguityKind::Structural),
            _ => None,
        }
    }
}

/// Whether a sentence is ambiguous, and how
///
/// Only an ambiguous sentence carries a kind, and only when the oracle
/// named one it recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambiguity {
    /// No ambiguity detected
    Clear,

    /// Ambiguity of the given kind (`None` when the oracle did not say which)
    Ambiguous(Option<AmbiguityKind>),
}

impl Ambiguity {
    /// Whether this is any kind of ambiguity
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Ambiguity::Ambiguous(_))
    }

    /// The ambiguity kind, if ambiguous and known
    pub fn kind(&self) -> Option<AmbiguityKind> {
        match self {
            Ambiguity::Clear => None,
            Ambiguity::Ambiguous(kind) => *kind,
        }
    }
}

/// Result of the disambiguation stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisambiguationResult {
    /// Index of the candidate sentence
    pub index: usize,

    /// Ambiguity verdict
    pub ambiguity: Ambiguity,

    /// Replacement text, only when the oracle was confident
    ///
    /// `None` means the context was insufficient and nothing was guessed.
    pub disambiguated_text: Option<String>,
}

impl DisambiguationResult {
    /// A clear (not ambiguous) result
    pub fn clear(index: usize) -> Self {
        Self {
            index,
            ambiguity: Ambiguity::Clear,
            disambiguated_text: None,
        }
    }

    /// An ambiguous result with no confident replacement
    pub fn unresolved(index: usize, kind: Option<AmbiguityKind>) -> Self {
        Self {
            index,
            ambiguity: Ambiguity::Ambiguous(kind),
            disambiguated_text: None,
        }
    }

    /// The replacement text, ignoring blank replacements
    pub fn replacement(&self) -> Option<&str> {
        self.disambiguated_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
