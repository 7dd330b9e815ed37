//! Parse oracle output into stage results
//!
//! Every parser accepts the list shapes models actually produce (bare array,
//! wrapped array, markdown fences, any key casing). Entries that cannot be
//! read are skipped with a warning; the pipeline treats a skipped entry like
//! a missing id.

use crate::error::ExtractorError;
use serde_json::{Map, Value};
use tracing::warn;
use verity_domain::{Ambiguity, AmbiguityKind, Category, DisambiguationResult, RewrittenSentence};
use verity_llm::json::{bool_field, index_field, list_items, parse_completion, str_field};

const ID_KEYS: &[&str] = &["id", "index", "sentenceid", "sentenceindex"];

/// One categorize-oracle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    /// Sentence index
    pub index: usize,
    /// Assigned category
    pub category: Category,
    /// Oracle reasoning (may be empty)
    pub reasoning: String,
}

/// Parse a categorize response
pub fn parse_categories(response: &str) -> Result<Vec<CategoryEntry>, ExtractorError> {
    let entries = parse_entries(response, &["sentences", "classifications", "results"])?;

    Ok(entries
        .iter()
        .filter_map(|(idx, entry)| {
            let index = entry_index(*idx, entry)?;
            let raw = str_field(entry, &["category", "classification", "label"]);
            let Some(category) = raw.and_then(Category::parse) else {
                warn!("Entry {} has unknown category {:?}", idx, raw);
                return None;
            };
            let reasoning = str_field(entry, &["reasoning", "reason", "explanation"])
                .unwrap_or_default()
                .trim()
                .to_string();
            Some(CategoryEntry {
                index,
                category,
                reasoning,
            })
        })
        .collect())
}

/// Parse an implicit-claim response into (parent index, claims)
pub fn parse_implicit_claims(response: &str) -> Result<Vec<(usize, Vec<String>)>, ExtractorError> {
    let entries = parse_entries(response, &["sentences", "results", "implicitclaims"])?;

    Ok(entries
        .iter()
        .filter_map(|(idx, entry)| {
            let index = entry_index(*idx, entry)?;
            let claims = ["claims", "implicitclaims", "statements"]
                .iter()
                .find_map(|k| entry.get(*k).and_then(Value::as_array))
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some((index, claims))
        })
        .collect())
}

/// Parse a rewrite response
///
/// A `null` rewrite is read as an empty one.
pub fn parse_rewrites(response: &str) -> Result<Vec<RewrittenSentence>, ExtractorError> {
    let entries = parse_entries(response, &["sentences", "rewrites", "results"])?;

    Ok(entries
        .iter()
        .filter_map(|(idx, entry)| {
            let index = entry_index(*idx, entry)?;
            let keys = ["rewrittentext", "rewritten", "rewrite", "text"];
            let present = keys.iter().any(|k| entry.contains_key(*k));
            if !present {
                warn!("Entry {} has no rewritten text", idx);
                return None;
            }
            let rewritten_text = str_field(entry, &keys).unwrap_or_default().trim().to_string();
            Some(RewrittenSentence {
                index,
                rewritten_text,
            })
        })
        .collect())
}

/// Parse a disambiguate response
pub fn parse_disambiguations(response: &str) -> Result<Vec<DisambiguationResult>, ExtractorError> {
    let entries = parse_entries(response, &["sentences", "candidates", "results"])?;

    Ok(entries
        .iter()
        .filter_map(|(idx, entry)| {
            let index = entry_index(*idx, entry)?;
            let kind = str_field(entry, &["ambiguitytype", "type", "kind"]).and_then(AmbiguityKind::parse);

            let ambiguous = match bool_field(entry, &["isambiguous", "ambiguous"]) {
                Some(flag) => flag,
                // A bare ambiguity type still signals ambiguity
                None if kind.is_some() => true,
                None => {
                    warn!("Entry {} does not say whether it is ambiguous", idx);
                    return None;
                }
            };

            if !ambiguous {
                return Some(DisambiguationResult::clear(index));
            }

            let disambiguated_text = str_field(entry, &["disambiguatedtext", "disambiguated", "replacement"])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            Some(DisambiguationResult {
                index,
                ambiguity: Ambiguity::Ambiguous(kind),
                disambiguated_text,
            })
        })
        .collect())
}

/// Parse a list-shaped response into (position, object) pairs
fn parse_entries(response: &str, list_keys: &[&str]) -> Result<Vec<(usize, Map<String, Value>)>, ExtractorError> {
    let value = parse_completion(response)?;

    let items = list_items(value, list_keys)
        .ok_or_else(|| ExtractorError::InvalidFormat("Expected JSON array".to_string()))?;

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match item {
            Value::Object(map) => Some((idx, map)),
            _ => {
                warn!("Entry {} is not a JSON object", idx);
                None
            }
        })
        .collect())
}

fn entry_index(position: usize, entry: &Map<String, Value>) -> Option<usize> {
    let index = index_field(entry, ID_KEYS);
    if index.is_none() {
        warn!("Entry {} has no usable id", position);
    }
    index
}
