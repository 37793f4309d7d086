//! Best-effort recovery of a classification object from free-text model output.
//!
//! The model is asked for JSON but is not bound to it: replies are routinely
//! wrapped in commentary or use single quotes. The [`JsonSpanExtractor`] pulls
//! the first JSON-looking span out of the reply, parses it, and falls back to
//! a quote repair before giving up on the attempt. Retrying with a fresh
//! generation is the caller's job (see `classify`).

use crate::error::Result;
use regex::Regex;
use serde_json::Value;

/// What a reply has to contain to count as a classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub review: bool,
    pub word: Value,
    pub score: Value,
}

/// Turns one raw model reply into a [`Classification`], or nothing.
pub trait StructuredExtractor {
    fn extract(&self, raw: &str) -> Option<Classification>;
}

/// Greedy span extraction (`{` .. last `}`, else `[` .. last `]`), strict
/// parse, then a single-to-double quote repair and a second parse.
pub struct JsonSpanExtractor {
    object_span: Regex,
    array_span: Regex,
}

impl JsonSpanExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            object_span: Regex::new(r"(?s)\{.*\}")?,
            array_span: Regex::new(r"(?s)\[.*\]")?,
        })
    }

    /// First matching span; the object pattern wins over the array pattern.
    pub fn find_span<'a>(&self, raw: &'a str) -> Option<&'a str> {
        self.object_span
            .find(raw)
            .or_else(|| self.array_span.find(raw))
            .map(|m| m.as_str())
    }

    fn parse_span(span: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(span) {
            Ok(value) => Some(value),
            Err(strict_err) => {
                let repaired = span.replace('\'', "\"");
                match serde_json::from_str::<Value>(&repaired) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::debug!("span rejected: {strict_err}; after quote repair: {e}");
                        None
                    }
                }
            }
        }
    }
}

impl StructuredExtractor for JsonSpanExtractor {
    fn extract(&self, raw: &str) -> Option<Classification> {
        let Some(span) = self.find_span(raw) else {
            tracing::debug!("no JSON-looking span in reply ({} chars)", raw.len());
            return None;
        };
        let value = Self::parse_span(span)?;
        classification_from_value(&value)
    }
}

/// Validates the parsed shape. An array is accepted when its first element
/// is a valid classification object.
pub fn classification_from_value(value: &Value) -> Option<Classification> {
    let obj = match value {
        Value::Object(obj) => obj,
        Value::Array(items) => return items.first().and_then(classification_from_value),
        _ => return None,
    };

    let review = is_truthy(obj.get("review")?);
    let word = obj.get("word").cloned();
    let score = obj.get("score").cloned();

    if review && (word.is_none() || score.is_none()) {
        tracing::debug!("reply marked as review but lacks word or score");
        return None;
    }

    Some(Classification {
        review,
        word: word.unwrap_or(Value::Null),
        score: score.unwrap_or(Value::Null),
    })
}

/// Loose truthiness so `"true"` from a sloppy model still counts while
/// `"false"`, `"no"` and `"0"` do not. This is stricter than plain
/// non-empty-string truthiness on purpose.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            !s.is_empty() && !matches!(s.as_str(), "false" | "no" | "0")
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
    }
}
