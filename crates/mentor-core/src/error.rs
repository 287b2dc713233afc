//! Error types for the generation pipeline
//!
//! The pipeline never returns these to its callers; every failure is folded
//! into a fallback [`GenerationOutcome`](crate::types::GenerationOutcome). They
//! exist so the failure classes stay distinguishable in logs, retry decisions
//! and the outcome's error string.

use crate::config::PipelineConfig;
use mentor_catalog::{UnknownIntimacyError, UnknownMentorError};
use mentor_prompt::{ContextError, ResponseFormatError};

/// Text generator failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Network or upstream service failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Upstream answered with nothing
    #[error("generator returned an empty response")]
    EmptyResponse,

    /// Deadline expired before the generator answered
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline that expired
        timeout_ms: u64,
    },
}

/// Malformed or incomplete command input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Mentor outside the catalog
    #[error(transparent)]
    UnknownMentor(#[from] UnknownMentorError),

    /// Intimacy label not recognised
    #[error(transparent)]
    UnknownIntimacy(#[from] UnknownIntimacyError),

    /// Required free-text field is blank
    #[error("required field {0} is blank")]
    BlankField(&'static str),
}

/// Any failure inside one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Command rejected before any generator call
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Prompt could not be built
    #[error("prompt construction failed: {0}")]
    Context(#[from] ContextError),

    /// Generator failed
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Generator answered but the text broke the response contract
    #[error("response format invalid: {0}")]
    ResponseFormat(#[from] ResponseFormatError),
}

impl PipelineError {
    /// Check if another generator attempt may help
    ///
    /// Generator failures always qualify. Format violations qualify only when
    /// `retry_on_format_error` is enabled.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self, config: &PipelineConfig) -> bool {
        match self {
            Self::Generation(_) => true,
            Self::ResponseFormat(_) => config.retry_on_format_error,
            Self::Validation(_) | Self::Context(_) => false,
        }
    }
}

/// Result sink failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    /// Sink reported failure
    #[error("failed to save")]
    Rejected,

    /// Sink did not answer in time
    #[error("failed to save: timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline that expired
        timeout_ms: u64,
    },
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// TOML did not match the schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but are unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_errors_are_retryable() {
        let config = PipelineConfig::default();
        let err = PipelineError::from(GenerationError::Transport("reset".into()));
        assert!(err.is_retryable(&config));
        assert!(PipelineError::from(GenerationError::Timeout { timeout_ms: 10 }).is_retryable(&config));
    }

    #[test]
    fn format_errors_follow_config() {
        let err = PipelineError::from(ResponseFormatError::NoLetters);
        assert!(!err.is_retryable(&PipelineConfig::default()));
        assert!(err.is_retryable(&PipelineConfig::default().with_retry_on_format_error(true)));
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let err = PipelineError::from(ValidationError::BlankField("user_id"));
        assert!(!err.is_retryable(&PipelineConfig::default().with_retry_on_format_error(true)));
    }

    #[test]
    fn unknown_mentor_is_a_validation_error() {
        let err = PipelineError::from(ValidationError::from(UnknownMentorError("x".into())));
        assert!(matches!(err, PipelineError::Validation(ValidationError::UnknownMentor(_))));
        assert_eq!(err.to_string(), "validation failed: unknown mentor: \"x\"");
    }

    #[test]
    fn save_error_display() {
        assert_eq!(SaveError::Rejected.to_string(), "failed to save");
        assert!(SaveError::Timeout { timeout_ms: 5 }.to_string().starts_with("failed to save"));
    }
}
