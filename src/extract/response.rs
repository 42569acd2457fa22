//! Parsing of the model's reply into a seat number and raw score list.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::ExtractionError;

/// Seat number recorded when the model does not report one.
pub const UNKNOWN_SEAT: &str = "未知";

/// Markdown code fence markers, with or without a `json` tag.
const FENCE_PATTERN: &str = r"```(?:json)?";

static FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FENCE_PATTERN).expect("fence pattern is valid"));

/// What one sheet yielded, before any scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetExtraction {
    /// Seat number as reported, or `UNKNOWN_SEAT`
    pub seat_number: String,
    /// Scores exactly as the model returned them
    pub raw_scores: Vec<Value>,
}

/// Removes markdown code fences and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    FENCE_REGEX.replace_all(text, "").trim().to_string()
}

/// Renders a seat number value as text.
fn seat_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN_SEAT.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Parses the model's reply.
///
/// Expected shape: `{ "seat_number": "12", "valid_scores": [90, 85, ...] }`.
/// A missing seat number becomes `UNKNOWN_SEAT`; missing or null scores
/// become an empty list.
pub fn parse_extraction(reply: &str) -> Result<SheetExtraction, ExtractionError> {
    let cleaned = strip_code_fences(reply);
    let value: Value = serde_json::from_str(&cleaned)?;

    let Value::Object(fields) = value else {
        return Err(ExtractionError::Malformed(format!(
            "expected a JSON object, got: {}",
            cleaned
        )));
    };

    let seat_number = seat_text(fields.get("seat_number"));

    let raw_scores = match fields.get("valid_scores") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => {
            return Err(ExtractionError::Malformed(format!(
                "valid_scores is not a list: {}",
                other
            )));
        }
    };

    Ok(SheetExtraction {
        seat_number,
        raw_scores,
    })
}
