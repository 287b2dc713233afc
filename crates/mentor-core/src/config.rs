//! Configuration
//!
//! Every section deserializes from TOML with defaults for omitted keys:
//!
//! ```toml
//! [generator]
//! kind = "scripted"
//! responses = ["Keep a steady pace today and rest when you need to."]
//!
//! [pipeline]
//! generation_timeout_ms = 20000
//! retry_on_format_error = false
//!
//! [pipeline.retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//!
//! [batch]
//! kind = "advice"
//! max_concurrency = 8
//! ```

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use crate::types::BatchKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentorConfig {
    /// Which text generator to wire in
    pub generator: GeneratorConfig,
    /// Single-user pipeline settings
    pub pipeline: PipelineConfig,
    /// Batch orchestration settings
    pub batch: BatchConfig,
}

impl MentorConfig {
    /// Parse and validate TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` for malformed TOML, `ConfigError::Invalid` for
    /// unusable values
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`MentorConfig::from_toml_str`]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.pipeline.retry.max_delay_ms < self.pipeline.retry.base_delay_ms {
            return Err(ConfigError::Invalid(
                "pipeline.retry.max_delay_ms must not be below base_delay_ms".to_string(),
            ));
        }
        if self.batch.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "batch.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.generator.kind == GeneratorKind::Scripted && self.generator.responses.is_empty() {
            return Err(ConfigError::Invalid(
                "generator.responses must not be empty for the scripted generator".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generator implementation selected at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Always fails; every request yields mentor fallback content
    #[default]
    Disabled,
    /// Cycles through configured responses
    Scripted,
}

/// Generator selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Implementation
    pub kind: GeneratorKind,
    /// Responses for the scripted generator
    pub responses: Vec<String>,
}

impl GeneratorConfig {
    /// Scripted generator with fixed responses
    #[must_use]
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            kind: GeneratorKind::Scripted,
            responses,
        }
    }
}

/// Single-user pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Retry budget for generator calls
    pub retry: RetryPolicy,
    /// Per-attempt generator deadline in milliseconds
    pub generation_timeout_ms: Option<u64>,
    /// Whether a response that breaks its contract earns another attempt
    pub retry_on_format_error: bool,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With per-attempt deadline
    #[inline]
    #[must_use]
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// With format-error retry policy
    #[inline]
    #[must_use]
    pub fn with_retry_on_format_error(mut self, enabled: bool) -> Self {
        self.retry_on_format_error = enabled;
        self
    }

    /// Per-attempt deadline, if any
    #[inline]
    #[must_use]
    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            generation_timeout_ms: Some(30_000),
            retry_on_format_error: false,
        }
    }
}

/// Batch orchestration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Content generated for every user
    pub kind: BatchKind,
    /// Maximum concurrent pipeline runs
    pub max_concurrency: usize,
    /// Forward generated text to the result sink
    pub persist: bool,
    /// Also forward fallback text
    pub persist_fallbacks: bool,
    /// Per-save deadline in milliseconds
    pub save_timeout_ms: Option<u64>,
}

impl BatchConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With content kind
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: BatchKind) -> Self {
        self.kind = kind;
        self
    }

    /// With concurrency cap
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// With persistence toggles
    #[inline]
    #[must_use]
    pub fn with_persistence(mut self, persist: bool, persist_fallbacks: bool) -> Self {
        self.persist = persist;
        self.persist_fallbacks = persist_fallbacks;
        self
    }

    /// With per-save deadline
    #[inline]
    #[must_use]
    pub fn with_save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Per-save deadline, if any
    #[inline]
    #[must_use]
    pub fn save_timeout(&self) -> Option<Duration> {
        self.save_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            kind: BatchKind::Advice,
            max_concurrency: 8,
            persist: true,
            persist_fallbacks: true,
            save_timeout_ms: Some(10_000),
        }
    }
}
