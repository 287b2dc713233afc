//! Lookup errors for the mentor catalog

/// Mentor identifier outside the built-in set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mentor: {0:?}")]
pub struct UnknownMentorError(pub String);

/// Intimacy label outside `low` / `medium` / `high`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intimacy level: {0:?}")]
pub struct UnknownIntimacyError(pub String);
