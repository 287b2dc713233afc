//! Concurrent batch orchestration
//!
//! Runs the pipeline for many users at once, bounded by
//! `batch.max_concurrency`, and folds every user's result into a
//! [`BatchRunResult`]. One user's failure, including a panic inside the
//! pipeline or the result sink, never affects another user's outcome.

use crate::config::BatchConfig;
use crate::error::SaveError;
use crate::pipeline::GenerationPipeline;
use crate::sources::{ResultSink, UserSource};
use crate::types::{BatchKind, BatchRunResult, GenerationOutcome, UserContext, UserId, UserOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Drives the pipeline across a set of users
pub struct BatchOrchestrator {
    pipeline: Arc<GenerationPipeline>,
    users: Arc<dyn UserSource>,
    sink: Option<Arc<dyn ResultSink>>,
    config: BatchConfig,
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("pipeline", &self.pipeline)
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl BatchOrchestrator {
    /// Create orchestrator without a result sink
    #[must_use]
    pub fn new(
        pipeline: Arc<GenerationPipeline>,
        users: Arc<dyn UserSource>,
        config: BatchConfig,
    ) -> Self {
        Self {
            pipeline,
            users,
            sink: None,
            config,
        }
    }

    /// With result sink
    #[inline]
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run for every user the source reports as active
    pub async fn run_for_active_users(&self) -> BatchRunResult {
        let users = self.users.active_users().await;
        self.run_for_users(users).await
    }

    /// Run for an explicit user list
    ///
    /// Later duplicates of a user id are skipped.
    #[tracing::instrument(
        name = "batch",
        skip_all,
        fields(kind = self.config.kind.content_kind().as_str(), users = users.len())
    )]
    pub async fn run_for_users(&self, users: Vec<UserContext>) -> BatchRunResult {
        let kind = self.config.kind;
        if users.is_empty() {
            tracing::info!("no users to process");
            return BatchRunResult::empty(kind);
        }

        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut pending = HashMap::with_capacity(users.len());
        let mut tasks = JoinSet::new();

        for user in users {
            if pending.contains_key(&user.user_id) {
                tracing::warn!(user_id = %user.user_id, "duplicate user in batch, skipping");
                continue;
            }
            pending.insert(user.user_id.clone(), user.mentor.clone());
            let worker = self.worker();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let user_id = user.user_id.clone();
                let outcome = worker.run(user, semaphore).await;
                (user_id, outcome)
            });
        }

        let mut results = HashMap::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((user_id, outcome)) => {
                    results.insert(user_id, outcome);
                }
                Err(err) => tracing::error!(error = %err, "batch task aborted"),
            }
        }

        // Every submitted user keeps a slot, even if its task died outright.
        for (user_id, mentor) in pending {
            results.entry(user_id).or_insert_with(|| UserOutcome {
                outcome: GenerationOutcome::fallback(
                    kind.content_kind(),
                    mentor,
                    "batch task aborted",
                    0,
                ),
                execution_time_ms: 0,
                saved: false,
            });
        }

        let result = BatchRunResult::from_results(kind, results, elapsed_ms(started));
        tracing::info!(
            total = result.total_users,
            succeeded = result.success_count,
            failed = result.failure_count,
            total_ms = result.total_execution_time_ms,
            average_ms = result.average_execution_time_ms,
            "batch complete"
        );
        result
    }

    /// Run for one user looked up from the source
    ///
    /// Returns `None` when the source does not know the user.
    pub async fn run_for_user(&self, user_id: &UserId) -> Option<UserOutcome> {
        let Some(user) = self.users.user_data(user_id).await else {
            tracing::warn!(user_id = %user_id, "user not found");
            return None;
        };
        Some(self.worker().run(user, Arc::new(Semaphore::new(1))).await)
    }

    fn worker(&self) -> UserWorker {
        UserWorker {
            pipeline: Arc::clone(&self.pipeline),
            sink: self.sink.clone(),
            config: self.config.clone(),
        }
    }
}

/// Owned handles for one user's run
#[derive(Clone)]
struct UserWorker {
    pipeline: Arc<GenerationPipeline>,
    sink: Option<Arc<dyn ResultSink>>,
    config: BatchConfig,
}

impl UserWorker {
    async fn run(self, user: UserContext, semaphore: Arc<Semaphore>) -> UserOutcome {
        let kind = self.config.kind;
        let Ok(_permit) = semaphore.acquire_owned().await else {
            return UserOutcome {
                outcome: GenerationOutcome::fallback(
                    kind.content_kind(),
                    user.mentor,
                    "batch semaphore closed",
                    0,
                ),
                execution_time_ms: 0,
                saved: false,
            };
        };

        let started = Instant::now();
        let pipeline = Arc::clone(&self.pipeline);
        let command_source = user.clone();
        let generated = tokio::spawn(async move {
            match kind {
                BatchKind::Advice => {
                    pipeline
                        .generate_advice(command_source.advice_command())
                        .await
                }
                BatchKind::Goal => pipeline.generate_goal(command_source.goal_command()).await,
            }
        })
        .await;

        let outcome = match generated {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(user_id = %user.user_id, error = %err, "pipeline task panicked");
                GenerationOutcome::fallback(
                    kind.content_kind(),
                    user.mentor.clone(),
                    "pipeline task panicked",
                    0,
                )
            }
        };

        let (outcome, saved) = self.persist_isolated(user, outcome).await;
        UserOutcome {
            outcome,
            execution_time_ms: elapsed_ms(started),
            saved,
        }
    }

    /// Run [`UserWorker::persist`] in its own task
    ///
    /// A panicking sink counts as a failed save for this user only.
    async fn persist_isolated(
        &self,
        user: UserContext,
        outcome: GenerationOutcome,
    ) -> (GenerationOutcome, bool) {
        if self.sink.is_none() {
            return (outcome, false);
        }

        let worker = self.clone();
        let user_id = user.user_id.clone();
        let before_save = outcome.clone();
        let saving = tokio::spawn(async move {
            let mut outcome = outcome;
            let saved = worker.persist(&user, &mut outcome).await;
            (outcome, saved)
        })
        .await;

        match saving {
            Ok(done) => done,
            Err(err) => {
                tracing::error!(user_id = %user_id, error = %err, "save task panicked");
                let mut outcome = before_save;
                if outcome.success {
                    outcome.success = false;
                    outcome.error = Some(SaveError::Rejected.to_string());
                }
                (outcome, false)
            }
        }
    }

    /// Forward text to the sink when configured
    ///
    /// A failed save downgrades a successful outcome. An outcome that had
    /// already failed keeps its original error.
    async fn persist(&self, user: &UserContext, outcome: &mut GenerationOutcome) -> bool {
        let Some(sink) = &self.sink else {
            return false;
        };
        if !self.config.persist || (!outcome.success && !self.config.persist_fallbacks) {
            return false;
        }

        match self.save(sink.as_ref(), user, &outcome.text).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(user_id = %user.user_id, error = %err, "save failed");
                if outcome.success {
                    outcome.success = false;
                    outcome.error = Some(err.to_string());
                }
                false
            }
        }
    }

    async fn save(
        &self,
        sink: &dyn ResultSink,
        user: &UserContext,
        text: &str,
    ) -> Result<(), SaveError> {
        let save = async {
            match self.config.kind {
                BatchKind::Advice => sink.save_advice(&user.user_id, text, &user.mentor).await,
                BatchKind::Goal => sink.save_goal(&user.user_id, text, &user.mentor).await,
            }
        };

        let stored = match self.config.save_timeout() {
            Some(limit) => tokio::time::timeout(limit, save)
                .await
                .map_err(|_| SaveError::Timeout {
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => save.await,
        };

        if stored {
            Ok(())
        } else {
            Err(SaveError::Rejected)
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
