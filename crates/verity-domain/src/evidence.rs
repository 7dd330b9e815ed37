//! Source documents and evidence chunks

/// A fetched source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Stable identifier for the source (usually its URL)
    pub source_id: String,

    /// Extracted plain-text content
    pub content: String,
}

impl SourceDocument {
    /// Create a source document
    pub fn new(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            content: content.into(),
        }
    }
}

/// A short, source-attributed excerpt believed relevant to a claim
///
/// Chunks are scoped to one verification request. Sentences are kept in the
/// order they appear in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceChunk {
    /// Source the sentences were taken from
    pub source_id: String,

    /// Selected sentences, in document order
    pub sentences: Vec<String>,

    /// Mean similarity of the selected sentences to the claim
    ///
    /// `None` when the sentences were chosen by position rather than ranked.
    pub relevance_score: Option<f32>,
}

impl EvidenceChunk {
    /// Chunk text: the selected sentences joined by spaces
    pub fn text(&self) -> String {
        self.sentences.join(" ")
    }

    /// Whether the chunk was chosen by similarity ranking
    pub fn is_ranked(&self) -> bool {
        self.relevance_score.is_some()
    }
}
