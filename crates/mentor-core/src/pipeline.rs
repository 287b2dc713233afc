//! Single-user generation pipeline
//!
//! validate -> build prompt -> generate (retried) -> sanitize and check.
//!
//! [`GenerationPipeline::generate`] never returns an error. Anything that goes
//! wrong along the way ends in the mentor's fallback text with
//! `success == false` and the failure recorded in `error`.

use crate::config::PipelineConfig;
use crate::error::{GenerationError, PipelineError};
use crate::generator::TextGenerator;
use crate::retry::{retry_with_backoff, RetryNotice};
use crate::types::{
    AdviceCommand, ContentKind, FeedbackCommand, GenerationCommand, GenerationOutcome, GoalCommand,
};
use chrono::Utc;
use std::sync::Arc;

/// Observer called before every backoff sleep
pub type RetryHook = Arc<dyn Fn(&RetryNotice<'_, PipelineError>) + Send + Sync>;

/// Turns commands into validated mentor content
pub struct GenerationPipeline {
    generator: Arc<dyn TextGenerator>,
    config: PipelineConfig,
    retry_hook: Option<RetryHook>,
}

impl std::fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationPipeline")
            .field("config", &self.config)
            .field("retry_hook", &self.retry_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl GenerationPipeline {
    /// Create pipeline
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, config: PipelineConfig) -> Self {
        Self {
            generator,
            config,
            retry_hook: None,
        }
    }

    /// With retry observer
    #[must_use]
    pub fn with_retry_hook<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryNotice<'_, PipelineError>) + Send + Sync + 'static,
    {
        self.retry_hook = Some(Arc::new(hook));
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Daily advice
    pub async fn generate_advice(&self, command: AdviceCommand) -> GenerationOutcome {
        self.generate(command).await
    }

    /// Weekly goal
    pub async fn generate_goal(&self, command: GoalCommand) -> GenerationOutcome {
        self.generate(command).await
    }

    /// KEEP / PROBLEM / TRY feedback on one retrospect
    ///
    /// On success `text` is the compact JSON object
    /// `{"keep":..,"problem":..,"try":..}`.
    pub async fn generate_feedback(&self, command: FeedbackCommand) -> GenerationOutcome {
        self.generate(command).await
    }

    /// Run the pipeline for any command
    #[tracing::instrument(
        name = "generate",
        skip_all,
        fields(user_id = %command.user_id(), kind = C::KIND.as_str(), mentor = command.mentor())
    )]
    pub async fn generate<C: GenerationCommand>(&self, command: C) -> GenerationOutcome {
        let kind = C::KIND;
        let mentor = command.mentor().to_string();

        let context = match command.into_context() {
            Ok(context) => context,
            Err(err) => {
                tracing::warn!(error = %err, "command rejected, returning fallback");
                return fallback(kind, mentor, &PipelineError::from(err), 0);
            }
        };

        let prompt = match context.build_prompt(kind) {
            Ok(prompt) => prompt,
            Err(err) => {
                tracing::error!(error = %err, "prompt construction failed");
                return fallback(kind, mentor, &PipelineError::from(err), 0);
            }
        };
        tracing::debug!(prompt_len = prompt.len(), intimacy = %context.intimacy, "prompt built");

        let prompt = prompt.as_str();
        let config = &self.config;
        let outcome = retry_with_backoff(
            &config.retry,
            move |attempt| self.attempt(prompt, kind, attempt),
            |err: &PipelineError| err.is_retryable(config),
            |notice| {
                tracing::warn!(
                    attempt = notice.attempt,
                    max_attempts = notice.max_attempts,
                    delay_ms = u64::try_from(notice.delay.as_millis()).unwrap_or(u64::MAX),
                    error = %notice.error,
                    "generation attempt failed, retrying"
                );
                if let Some(hook) = &self.retry_hook {
                    hook(notice);
                }
            },
        )
        .await;

        match outcome.result {
            Ok(text) => {
                tracing::info!(attempts = outcome.attempts, "generation succeeded");
                GenerationOutcome {
                    success: true,
                    text,
                    mentor,
                    kind,
                    generated_at: Utc::now(),
                    is_fallback: false,
                    error: None,
                    attempts: outcome.attempts,
                }
            }
            Err(err) => {
                tracing::warn!(
                    attempts = outcome.attempts,
                    error = %err,
                    "generation failed, returning fallback"
                );
                fallback(kind, mentor, &err, outcome.attempts)
            }
        }
    }

    async fn attempt(
        &self,
        prompt: &str,
        kind: ContentKind,
        attempt: u32,
    ) -> Result<String, PipelineError> {
        tracing::debug!(attempt, "calling generator");

        let raw = match self.config.generation_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.generator.generate(prompt))
                .await
                .map_err(|_| GenerationError::Timeout {
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })??,
            None => self.generator.generate(prompt).await?,
        };

        if raw.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }
        Ok(kind.contract().check(&raw)?)
    }
}

fn fallback(
    kind: ContentKind,
    mentor: String,
    error: &PipelineError,
    attempts: u32,
) -> GenerationOutcome {
    GenerationOutcome::fallback(kind, mentor, error.to_string(), attempts)
}
