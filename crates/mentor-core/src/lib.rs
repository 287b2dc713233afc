//! Mentor Core
//!
//! Generation pipeline and batch orchestrator for mentor content.
//!
//! # Overview
//!
//! - **GenerationPipeline**: validate a command, build the mentor prompt,
//!   call the [`TextGenerator`] with bounded retry, then sanitize and check
//!   the response. Always yields a [`GenerationOutcome`], falling back to the
//!   mentor's canned text on failure.
//! - **BatchOrchestrator**: fans the pipeline out over many users with a
//!   concurrency cap, persists results through a [`ResultSink`] and reports
//!   a [`BatchRunResult`].
//!
//! # Example
//!
//! ```rust
//! use mentor_core::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let generator = Arc::new(ScriptedGenerator::from_texts([
//!     "Finish one task before checking messages.",
//! ]));
//! let pipeline = GenerationPipeline::new(generator, PipelineConfig::new());
//!
//! let user = UserContext::new("u1", "coach").with_todos(vec!["write report".into()]);
//! let outcome = pipeline.generate_advice(user.advice_command()).await;
//!
//! assert!(outcome.success);
//! assert_eq!(outcome.text, "Finish one task before checking messages.");
//! # }
//! ```

#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod retry;
pub mod sources;
pub mod types;

// Re-exports
pub use batch::BatchOrchestrator;
pub use config::{BatchConfig, GeneratorConfig, GeneratorKind, MentorConfig, PipelineConfig};
pub use error::{ConfigError, GenerationError, PipelineError, SaveError, ValidationError};
pub use generator::{build_generator, DisabledGenerator, ScriptedGenerator, TextGenerator};
pub use pipeline::{GenerationPipeline, RetryHook};
pub use retry::{retry_with_backoff, RetryNotice, RetryOutcome, RetryPolicy};
pub use sources::{ResultSink, UserSource};
pub use types::{
    AdviceCommand, BatchKind, BatchRunResult, ContentKind, FeedbackCommand, GenerationCommand,
    GenerationContext, GenerationOutcome, GoalCommand, UserContext, UserId, UserOutcome,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AdviceCommand, BatchConfig, BatchKind, BatchOrchestrator, BatchRunResult, ContentKind,
        FeedbackCommand, GenerationOutcome, GenerationPipeline, GoalCommand, PipelineConfig,
        ResultSink, RetryPolicy, ScriptedGenerator, TextGenerator, UserContext, UserId,
        UserOutcome, UserSource,
    };
    pub use mentor_catalog::{IntimacyLevel, MentorCatalog, MentorId};
}
