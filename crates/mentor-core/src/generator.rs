//! Text generator seam
//!
//! The pipeline talks to the language model only through [`TextGenerator`].
//! Real clients live outside this crate; the two implementations here cover
//! local runs and the `[generator]` config section.

use crate::config::{GeneratorConfig, GeneratorKind};
use crate::error::{ConfigError, GenerationError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Produces raw text for a prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`
    ///
    /// # Errors
    /// `GenerationError` on transport, auth or timeout failure
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Replays a fixed list of responses in order, wrapping around
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Vec<Result<String, GenerationError>>,
    cursor: AtomicUsize,
}

impl ScriptedGenerator {
    /// Create from responses and errors
    #[must_use]
    pub fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Create from successful texts only
    #[must_use]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Ok(t.into())).collect())
    }

    /// Calls made so far
    #[inline]
    #[must_use]
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        if self.responses.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        self.responses[index % self.responses.len()].clone()
    }
}

/// Generator used when none is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Transport("generator disabled".to_string()))
    }
}

/// Build the generator selected by `config`
///
/// # Errors
/// `ConfigError::Invalid` when a scripted generator has no responses
pub fn build_generator(config: &GeneratorConfig) -> Result<Arc<dyn TextGenerator>, ConfigError> {
    match config.kind {
        GeneratorKind::Disabled => Ok(Arc::new(DisabledGenerator)),
        GeneratorKind::Scripted => {
            if config.responses.is_empty() {
                return Err(ConfigError::Invalid(
                    "generator.responses must not be empty for the scripted generator".to_string(),
                ));
            }
            Ok(Arc::new(ScriptedGenerator::from_texts(
                config.responses.iter().cloned(),
            )))
        }
    }
}
