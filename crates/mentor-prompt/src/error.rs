//! Error types for prompt construction and response validation

/// Prompt construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// Template references a placeholder this prompt kind does not supply
    #[error("unresolved placeholder {0} in template")]
    UnresolvedPlaceholder(&'static str),
}

/// Model output that violates the requested response contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseFormatError {
    /// Nothing left after sanitization
    #[error("response is empty")]
    Empty,

    /// Below the minimum length
    #[error("response too short: {len} chars (min {min})")]
    TooShort {
        /// Sanitized length in chars
        len: usize,
        /// Required minimum
        min: usize,
    },

    /// Above the maximum length
    #[error("response too long: {len} chars (max {max})")]
    TooLong {
        /// Sanitized length in chars
        len: usize,
        /// Allowed maximum
        max: usize,
    },

    /// No alphabetic characters at all
    #[error("response contains no letters")]
    NoLetters,

    /// No JSON object could be located
    #[error("no JSON object found in response")]
    MissingJson,

    /// JSON object could not be parsed
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Required field absent or not a string
    #[error("missing string field {0:?}")]
    MissingField(&'static str),

    /// Field present but out of bounds
    #[error("field {field:?} has {len} chars (expected {min}..={max})")]
    FieldLength {
        /// JSON field name
        field: &'static str,
        /// Sanitized length in chars
        len: usize,
        /// Required minimum
        min: usize,
        /// Allowed maximum
        max: usize,
    },
}
