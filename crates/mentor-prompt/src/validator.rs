//! Response contracts
//!
//! Three independent contracts, one per content kind:
//! - **Advice**: free text, 10..=1000 chars, at least one letter
//! - **Goal**: short text, 5..=1000 chars
//! - **Feedback**: JSON object with `keep`, `problem`, `try`, each 5..=500 chars
//!
//! Lengths count Unicode scalar values, not bytes.

use crate::error::ResponseFormatError;
use crate::sanitize::sanitize;
use serde::{Deserialize, Serialize};

/// Minimum advice length
pub const ADVICE_MIN_CHARS: usize = 10;
/// Maximum advice length
pub const ADVICE_MAX_CHARS: usize = 1000;
/// Minimum goal length
pub const GOAL_MIN_CHARS: usize = 5;
/// Maximum goal length
pub const GOAL_MAX_CHARS: usize = 1000;
/// Minimum length of each feedback field
pub const FEEDBACK_FIELD_MIN_CHARS: usize = 5;
/// Maximum length of each feedback field
pub const FEEDBACK_FIELD_MAX_CHARS: usize = 500;

/// Parsed KEEP / PROBLEM / TRY feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KptFeedback {
    /// What went well
    pub keep: String,
    /// What got in the way
    pub problem: String,
    /// What to attempt next
    #[serde(rename = "try")]
    pub try_next: String,
}

impl KptFeedback {
    /// Compact JSON form returned to callers
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "keep": self.keep,
            "problem": self.problem,
            "try": self.try_next,
        })
        .to_string()
    }
}

/// Contract selected by the caller for one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseContract {
    /// Free-text advice
    Advice,
    /// Weekly goal
    Goal,
    /// Structured KEEP / PROBLEM / TRY
    Feedback,
}

impl ResponseContract {
    /// Sanitize `raw` and check it against this contract
    ///
    /// Returns the text to hand back to callers: the sanitized text, or for
    /// feedback the compact JSON of the parsed fields.
    ///
    /// # Errors
    /// `ResponseFormatError` describing the first violated bound
    pub fn check(&self, raw: &str) -> Result<String, ResponseFormatError> {
        let text = sanitize(raw);
        match self {
            ResponseContract::Advice => validate_advice(&text).map(|()| text),
            ResponseContract::Goal => validate_goal(&text).map(|()| text),
            ResponseContract::Feedback => parse_feedback(&text).map(|kpt| kpt.to_json()),
        }
    }
}

/// Check sanitized advice text
///
/// # Errors
/// Length out of bounds or no alphabetic character
pub fn validate_advice(text: &str) -> Result<(), ResponseFormatError> {
    check_length(text, ADVICE_MIN_CHARS, ADVICE_MAX_CHARS)?;
    if !text.chars().any(char::is_alphabetic) {
        return Err(ResponseFormatError::NoLetters);
    }
    Ok(())
}

/// Check sanitized goal text
///
/// # Errors
/// Length out of bounds
pub fn validate_goal(text: &str) -> Result<(), ResponseFormatError> {
    check_length(text, GOAL_MIN_CHARS, GOAL_MAX_CHARS)
}

/// Extract and validate KEEP / PROBLEM / TRY feedback
///
/// Tolerates surrounding prose and code fences. Field values are sanitized
/// before their bounds are checked.
///
/// # Errors
/// No JSON object, unparsable JSON, missing or non-string field, or a field
/// out of bounds
pub fn parse_feedback(raw: &str) -> Result<KptFeedback, ResponseFormatError> {
    let json = extract_json_object(raw).ok_or(ResponseFormatError::MissingJson)?;
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ResponseFormatError::InvalidJson(e.to_string()))?;

    let field = |name: &'static str| -> Result<String, ResponseFormatError> {
        let text = value
            .get(name)
            .and_then(serde_json::Value::as_str)
            .map(sanitize)
            .ok_or(ResponseFormatError::MissingField(name))?;
        let len = text.chars().count();
        if !(FEEDBACK_FIELD_MIN_CHARS..=FEEDBACK_FIELD_MAX_CHARS).contains(&len) {
            return Err(ResponseFormatError::FieldLength {
                field: name,
                len,
                min: FEEDBACK_FIELD_MIN_CHARS,
                max: FEEDBACK_FIELD_MAX_CHARS,
            });
        }
        Ok(text)
    };

    Ok(KptFeedback {
        keep: field("keep")?,
        problem: field("problem")?,
        try_next: field("try")?,
    })
}

/// Locate a JSON object inside model output
///
/// Prefers a fenced block (```` ```json ```` or a bare ```` ``` ````), then
/// falls back to the span from the first `{` to the last `}`.
#[must_use]
pub fn extract_json_object(raw: &str) -> Option<&str> {
    for fence in ["```json", "```"] {
        if let Some(start) = raw.find(fence) {
            let body_start = start + fence.len();
            if let Some(len) = raw[body_start..].find("```") {
                let body = raw[body_start..body_start + len].trim();
                if body.starts_with('{') && body.ends_with('}') {
                    return Some(body);
                }
            }
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

fn check_length(text: &str, min: usize, max: usize) -> Result<(), ResponseFormatError> {
    let len = text.chars().count();
    if len == 0 {
        Err(ResponseFormatError::Empty)
    } else if len < min {
        Err(ResponseFormatError::TooShort { len, min })
    } else if len > max {
        Err(ResponseFormatError::TooLong { len, max })
    } else {
        Ok(())
    }
}
