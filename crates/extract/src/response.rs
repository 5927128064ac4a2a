//! Locating the JSON object inside free-form model output.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::error::ExtractError;

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("valid regex"));
static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("valid regex"));

/// Remove a leading ```` ``` ````/```` ```json ```` fence and a trailing fence.
pub fn strip_code_fences(raw: &str) -> String {
    let cleaned = LEADING_FENCE.replace(raw.trim(), "");
    TRAILING_FENCE.replace(&cleaned, "").trim().to_string()
}

/// The span from the first `{` to the last `}`, if any.
pub fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strip fences, take the outermost brace span and parse it as a JSON object.
pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, ExtractError> {
    let cleaned = strip_code_fences(raw);

    let span = outermost_object(&cleaned).ok_or_else(|| ExtractError::MalformedResponse {
        raw: raw.to_string(),
        detail: "no JSON object found".to_string(),
    })?;

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ExtractError::MalformedResponse {
            raw: raw.to_string(),
            detail: "top-level value is not an object".to_string(),
        }),
        Err(e) => Err(ExtractError::MalformedResponse {
            raw: raw.to_string(),
            detail: e.to_string(),
        }),
    }
}
