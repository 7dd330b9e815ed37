//! Reading JSON out of model completions
//!
//! Models wrap JSON in markdown fences, surround it with prose, and spell keys
//! however they like (`rewritten_text`, `rewrittenText`, `Rewritten Text`).
//! Parsers run completions through [`parse_completion`] and then look keys up
//! in their [`normalize_key`] form.

use serde_json::{Map, Value};

/// Canonical form of an object key: lowercase with `_`, `-` and spaces removed
///
/// # Examples
///
/// ```
/// use verity_llm::json::normalize_key;
///
/// assert_eq!(normalize_key("Trust_Score"), "trustscore");
/// assert_eq!(normalize_key("trustScore"), "trustscore");
/// assert_eq!(normalize_key("trust score"), "trustscore");
/// ```
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Rewrite every object key in `value` (recursively) to its normalized form
///
/// When two keys collapse to the same form the later one wins.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (normalize_key(&k), normalize_keys(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Strip a surrounding markdown code fence, if any
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse a completion as JSON, with keys normalized
///
/// Tries the fence-stripped text first, then the outermost `[...]` or `{...}`
/// span, so a short preamble like "Here is the JSON:" does not fail the parse.
pub fn parse_completion(response: &str) -> serde_json::Result<Value> {
    let text = strip_code_fence(response);

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(normalize_keys(value)),
        Err(first_error) => match outermost_span(text) {
            Some(span) => serde_json::from_str::<Value>(span).map(normalize_keys),
            None => Err(first_error),
        },
    }
}

fn outermost_span(text: &str) -> Option<&str> {
    let start = text.find(['[', '{'])?;
    let close = if text[start..].starts_with('[') { ']' } else { '}' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Items of a list-shaped completion
///
/// Accepts a bare array, an object holding the array under one of
/// `list_keys` (normalized), an object holding a single array under any key,
/// or a single object (treated as a one-item list).
pub fn list_items(value: Value, list_keys: &[&str]) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            for key in list_keys {
                if let Some(Value::Array(items)) = map.remove(&normalize_key(key)) {
                    return Some(items);
                }
            }
            let arrays: Vec<&Value> = map.values().filter(|v| v.is_array()).collect();
            if arrays.len() == 1 {
                return arrays[0].as_array().cloned();
            }
            Some(vec![Value::Object(map)])
        }
        _ => None,
    }
}

/// First present string field among `keys` (already normalized)
pub fn str_field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| object.get(*k).and_then(Value::as_str))
}

/// Non-negative integer field, accepting numeric strings
pub fn index_field(object: &Map<String, Value>, keys: &[&str]) -> Option<usize> {
    keys.iter().find_map(|k| match object.get(*k)? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Boolean field, accepting "true"/"false"/"yes"/"no" strings
pub fn bool_field(object: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|k| match object.get(*k)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
