//! Verification response validation
//!
//! A verdict is accepted only if every field passes; there is no partial
//! acceptance. Rejected verdicts become Unclear placeholders upstream.

use crate::config::VerifierConfig;
use crate::error::VerifierError;
use serde_json::{Map, Value};
use thiserror::Error;
use verity_domain::Verdict;
use verity_llm::json::{index_field, list_items, parse_completion, str_field};

const VERDICT_KEYS: &[&str] = &["verdict", "label", "rating"];
const SCORE_KEYS: &[&str] = &["trustscore", "score"];
const REASON_KEYS: &[&str] = &["reason", "reasoning", "explanation"];
const REFERENCE_KEYS: &[&str] = &["references", "quotes", "citations"];

/// A verdict that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedVerdict {
    /// Claim position within the call
    pub id: Option<usize>,

    /// Verdict
    pub verdict: Verdict,

    /// Trimmed reason
    pub reason: String,

    /// Trimmed non-empty references
    pub references: Vec<String>,
}

/// Why a verdict was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectionReason {
    /// No verdict field
    #[error("missing verdict")]
    MissingVerdict,

    /// Verdict outside the five-value set
    #[error("unknown verdict {0:?}")]
    UnknownVerdict(String),

    /// Score field present but not a number
    #[error("trust score {0} is not a number")]
    InvalidScore(String),

    /// Score inconsistent with the verdict
    #[error("{}", describe_mismatch(.verdict, .score))]
    ScoreMismatch {
        /// Parsed verdict
        verdict: Verdict,
        /// Score given, `None` for null or absent
        score: Option<i64>,
    },

    /// Reason missing or blank
    #[error("empty reason")]
    EmptyReason,

    /// Reason longer than allowed
    #[error("reason is {length} characters (max {max})")]
    ReasonTooLong {
        /// Length in characters
        length: usize,
        /// Configured maximum
        max: usize,
    },

    /// References not a list of strings
    #[error("references must be a list of strings")]
    InvalidReferences,

    /// More references than allowed
    #[error("{count} references (max {max})")]
    TooManyReferences {
        /// Number given
        count: usize,
        /// Configured maximum
        max: usize,
    },
}

fn describe_mismatch(verdict: &Verdict, score: &Option<i64>) -> String {
    match score {
        Some(score) => format!("trust score {} does not match verdict {}", score, verdict),
        None => format!("missing trust score for verdict {}", verdict),
    }
}

/// One entry of a verification response
pub type ValidationResult = Result<ValidatedVerdict, RejectionReason>;

/// Validates verification responses against the configured limits
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    max_reason_chars: usize,
    max_references: usize,
}

impl ResponseValidator {
    /// Create a validator using the limits in `config`
    pub fn new(config: &VerifierConfig) -> Self {
        Self {
            max_reason_chars: config.max_reason_chars,
            max_references: config.max_references,
        }
    }

    /// Validate every entry of a response
    ///
    /// # Errors
    ///
    /// Fails only when the response as a whole is unreadable. Individual bad
    /// entries come back as `Err(RejectionReason)` items.
    pub fn parse_response(&self, response: &str) -> Result<Vec<ValidationResult>, VerifierError> {
        let value = parse_completion(response)?;

        let items = match value {
            // A lone verdict object, not a wrapper around a list
            Value::Object(map) if VERDICT_KEYS.iter().any(|k| map.contains_key(*k)) => {
                vec![Value::Object(map)]
            }
            other => list_items(other, &["results", "verdicts", "claims"])
                .ok_or_else(|| VerifierError::InvalidFormat("Expected JSON object or array".to_string()))?,
        };

        Ok(items
            .into_iter()
            .map(|item| match item {
                Value::Object(entry) => self.validate_entry(&entry),
                _ => Err(RejectionReason::MissingVerdict),
            })
            .collect())
    }

    /// Validate one verdict object (keys already normalized)
    pub fn validate_entry(&self, entry: &Map<String, Value>) -> ValidationResult {
        let raw = str_field(entry, VERDICT_KEYS).ok_or(RejectionReason::MissingVerdict)?;
        let verdict = Verdict::parse(raw).ok_or_else(|| RejectionReason::UnknownVerdict(raw.to_string()))?;

        let score = score_field(entry)?;
        if !verdict.accepts_score(score) {
            return Err(RejectionReason::ScoreMismatch { verdict, score });
        }

        let reason = str_field(entry, REASON_KEYS).map(str::trim).unwrap_or_default();
        if reason.is_empty() {
            return Err(RejectionReason::EmptyReason);
        }
        let length = reason.chars().count();
        if length > self.max_reason_chars {
            return Err(RejectionReason::ReasonTooLong {
                length,
                max: self.max_reason_chars,
            });
        }

        let references = self.references(entry)?;

        Ok(ValidatedVerdict {
            id: index_field(entry, &["id", "index", "claimid"]),
            verdict,
            reason: reason.to_string(),
            references,
        })
    }

    fn references(&self, entry: &Map<String, Value>) -> Result<Vec<String>, RejectionReason> {
        let items = match REFERENCE_KEYS.iter().find_map(|k| entry.get(*k)) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(RejectionReason::InvalidReferences),
        };

        if items.len() > self.max_references {
            return Err(RejectionReason::TooManyReferences {
                count: items.len(),
                max: self.max_references,
            });
        }

        items
            .iter()
            .map(|item| item.as_str().map(str::trim).ok_or(RejectionReason::InvalidReferences))
            .filter(|item| !matches!(item, Ok("")))
            .map(|item| item.map(str::to_string))
            .collect()
    }
}

/// Trust score as an integer; `None` for null or absent
fn score_field(entry: &Map<String, Value>) -> Result<Option<i64>, RejectionReason> {
    let Some(value) = SCORE_KEYS.iter().find_map(|k| entry.get(*k)) else {
        return Ok(None);
    };

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(score) => Ok(Some(score)),
            // 100.0 is fine, 99.5 is not
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| Some(f as i64))
                .ok_or_else(|| RejectionReason::InvalidScore(n.to_string())),
        },
        Value::String(s) if s.trim().eq_ignore_ascii_case("null") => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RejectionReason::InvalidScore(s.clone())),
        other => Err(RejectionReason::InvalidScore(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ResponseValidator {
        ResponseValidator::new(&VerifierConfig::default())
    }

    fn single(response: &str) -> ValidationResult {
        let mut results = validator().parse_response(response).unwrap();
        assert_eq!(results.len(), 1);
        results.remove(0)
    }

    #[test]
    fn test_valid_support() {
        let verdict = single(
            r#"{"verdict": "Support", "trust_score": 100, "reason": "Three sources agree.",
                "references": ["opened in 1937", " May 28, 1937 "]}"#,
        )
        .unwrap();

        assert_eq!(verdict.verdict, Verdict::Support);
        assert_eq!(verdict.reason, "Three sources agree.");
        assert_eq!(verdict.references, vec!["opened in 1937", "May 28, 1937"]);
        assert_eq!(verdict.id, None);
    }

    #[test]
    fn test_verdict_aliases_and_key_casing() {
        let verdict = single(
            r#"```json
{"Verdict": "PARTIALLY_SUPPORTED", "TrustScore": "50", "Reason": "Only the year matches."}
```"#,
        )
        .unwrap();
        assert_eq!(verdict.verdict, Verdict::PartiallySupport);
        assert!(verdict.references.is_empty());
    }

    #[test]
    fn test_rejected_scores_accept_zero_or_null() {
        for response in [
            r#"{"verdict": "Refute", "trust_score": 0, "reason": "r"}"#,
            r#"{"verdict": "Contradict", "trust_score": null, "reason": "r"}"#,
            r#"{"verdict": "Unclear", "reason": "r"}"#,
            r#"{"verdict": "Support", "trust_score": 100.0, "reason": "r"}"#,
        ] {
            assert!(single(response).is_ok(), "{}", response);
        }
    }

    #[test]
    fn test_score_mismatch_rejected() {
        assert_eq!(
            single(r#"{"verdict": "Support", "trust_score": 90, "reason": "r"}"#),
            Err(RejectionReason::ScoreMismatch {
                verdict: Verdict::Support,
                score: Some(90)
            })
        );
        assert!(matches!(
            single(r#"{"verdict": "Support", "reason": "r"}"#),
            Err(RejectionReason::ScoreMismatch { score: None, .. })
        ));
        assert!(matches!(
            single(r#"{"verdict": "Unclear", "trust_score": 50, "reason": "r"}"#),
            Err(RejectionReason::ScoreMismatch { .. })
        ));
        assert!(matches!(
            single(r#"{"verdict": "Refute", "trust_score": "high", "reason": "r"}"#),
            Err(RejectionReason::InvalidScore(_))
        ));
    }

    #[test]
    fn test_unknown_or_missing_verdict() {
        assert!(matches!(
            single(r#"{"verdict": "Mostly True", "reason": "r"}"#),
            Err(RejectionReason::UnknownVerdict(_))
        ));

        let results = validator().parse_response(r#"[{"reason": "r"}, 5]"#).unwrap();
        assert_eq!(results, vec![Err(RejectionReason::MissingVerdict), Err(RejectionReason::MissingVerdict)]);
    }

    #[test]
    fn test_reason_bounds() {
        assert_eq!(
            single(r#"{"verdict": "Refute", "trust_score": 0, "reason": "   "}"#),
            Err(RejectionReason::EmptyReason)
        );

        let long = format!(
            r#"{{"verdict": "Refute", "trust_score": 0, "reason": "{}"}}"#,
            "x".repeat(501)
        );
        assert_eq!(
            single(&long),
            Err(RejectionReason::ReasonTooLong { length: 501, max: 500 })
        );
    }

    #[test]
    fn test_reference_bounds() {
        assert_eq!(
            single(r#"{"verdict": "Refute", "trust_score": 0, "reason": "r", "references": ["a", "b", "c", "d"]}"#),
            Err(RejectionReason::TooManyReferences { count: 4, max: 3 })
        );
        assert_eq!(
            single(r#"{"verdict": "Refute", "trust_score": 0, "reason": "r", "references": "a"}"#),
            Err(RejectionReason::InvalidReferences)
        );
        assert_eq!(
            single(r#"{"verdict": "Refute", "trust_score": 0, "reason": "r", "references": [1]}"#),
            Err(RejectionReason::InvalidReferences)
        );
    }

    #[test]
    fn test_batched_response_keeps_ids() {
        let results = validator()
            .parse_response(
                r#"{"results": [
                    {"id": 1, "verdict": "Refute", "trust_score": 0, "reason": "wrong year"},
                    {"id": "0", "verdict": "Support", "trust_score": 100, "reason": "matches"}
                ]}"#,
            )
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.as_ref().unwrap().id).collect();
        assert_eq!(ids, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_unreadable_response_is_an_error() {
        assert!(matches!(
            validator().parse_response("I cannot verify this."),
            Err(VerifierError::JsonParse(_))
        ));
        assert!(matches!(
            validator().parse_response("42"),
            Err(VerifierError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejection_messages() {
        let mismatch = RejectionReason::ScoreMismatch {
            verdict: Verdict::Support,
            score: Some(50),
        };
        assert_eq!(mismatch.to_string(), "trust score 50 does not match verdict Support");

        let missing = RejectionReason::ScoreMismatch {
            verdict: Verdict::PartiallySupport,
            score: None,
        };
        assert!(missing.to_string().starts_with("missing trust score for verdict"));

        let too_long = RejectionReason::ReasonTooLong { length: 600, max: 500 };
        assert_eq!(too_long.to_string(), "reason is 600 characters (max 500)");
        assert_eq!(RejectionReason::UnknownVerdict("Maybe".into()).to_string(), "unknown verdict \"Maybe\"");
    }
}
