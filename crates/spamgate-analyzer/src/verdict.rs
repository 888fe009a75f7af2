//! Parse-and-sanitize step for raw provider output
//!
//! Providers answer in free text that is supposed to contain a JSON object
//! like:
//! ```text
//! {"isSpam": true, "confidence": 0.92, "reasoning": "...", "categories": ["scam"], "severity": "high"}
//! ```
//! The object may be wrapped in prose or code fences, and any field may be
//! missing or of the wrong type.

use serde_json::{Map, Value};
use spamgate_core::types::clamp_unit;
use spamgate_core::{AnalyzerSeverity, AnalyzerVerdict};
use tracing::debug;

/// Reasoning used when the provider omits one
pub const MISSING_REASONING: &str = "No reasoning provided";

/// Outcome of parsing provider output
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedVerdict {
    /// A JSON object was found and sanitized
    Valid(AnalyzerVerdict),

    /// No JSON object could be recovered
    Fallback,
}

impl ParsedVerdict {
    /// The sanitized verdict, or the fixed fallback verdict
    pub fn into_verdict(self) -> AnalyzerVerdict {
        match self {
            Self::Valid(verdict) => verdict,
            Self::Fallback => AnalyzerVerdict::fallback(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// Span from the first '{' to the last '}' in `raw`
fn object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Locate the JSON object in `raw` and sanitize it into a verdict
pub fn parse_verdict(raw: &str) -> ParsedVerdict {
    let Some(found) = object_span(raw) else {
        debug!("No JSON object in analyzer output");
        return ParsedVerdict::Fallback;
    };

    match serde_json::from_str::<Value>(found) {
        Ok(Value::Object(fields)) => ParsedVerdict::Valid(sanitize(&fields)),
        Ok(_) => ParsedVerdict::Fallback,
        Err(e) => {
            debug!(error = %e, "Analyzer output is not valid JSON");
            ParsedVerdict::Fallback
        }
    }
}

fn sanitize(fields: &Map<String, Value>) -> AnalyzerVerdict {
    let field = |name: &str| fields.get(name).unwrap_or(&Value::Null);

    AnalyzerVerdict {
        is_spam: truthy(field("isSpam")),
        confidence: clamp_unit(to_number(field("confidence")).unwrap_or(0.0)),
        reasoning: to_reasoning(field("reasoning")),
        categories: match field("categories") {
            Value::Array(items) => items.iter().map(to_text).collect(),
            _ => Vec::new(),
        },
        severity: match field("severity") {
            Value::String(s) => AnalyzerSeverity::parse(s).unwrap_or_default(),
            _ => AnalyzerSeverity::Low,
        },
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (!number.is_nan()).then_some(number)
}

fn to_reasoning(value: &Value) -> String {
    if truthy(value) {
        to_text(value)
    } else {
        MISSING_REASONING.to_string()
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
