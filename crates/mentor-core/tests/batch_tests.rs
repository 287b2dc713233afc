//! Batch Orchestrator Tests
//!
//! Isolation, concurrency, persistence and aggregation across many users.

use mentor_core::prelude::*;
use mentor_test_utils::{
    fast_pipeline_config, user, users, AlwaysFailGenerator, FlakyGenerator, InMemoryUserSource,
    MarkerDelayGenerator, MarkerGenerator, MarkerMode, PanickingSink, RecordingSink,
    SlowGenerator, ADVICE_TEXT, GOAL_TEXT,
};
use std::sync::Arc;
use std::time::Duration;

const MARKER: &str = "rotate the pager";

fn orchestrator(
    generator: Arc<dyn TextGenerator>,
    source: Vec<UserContext>,
    config: BatchConfig,
) -> BatchOrchestrator {
    let pipeline = Arc::new(GenerationPipeline::new(generator, fast_pipeline_config(2)));
    BatchOrchestrator::new(pipeline, Arc::new(InMemoryUserSource::new(source)), config)
}

fn five_users_with_marked_third() -> Vec<UserContext> {
    let mut all = users(5);
    all[2] = all[2].clone().with_todos(vec![MARKER.to_string()]);
    all
}

#[tokio::test]
async fn test_one_failing_user_does_not_affect_others() {
    let generator = Arc::new(MarkerGenerator::new(MARKER, ADVICE_TEXT, MarkerMode::Fail));
    let batch = orchestrator(generator, five_users_with_marked_third(), BatchConfig::new());

    let result = batch.run_for_active_users().await;

    assert_eq!(result.total_users, 5);
    assert_eq!(result.success_count, 4);
    assert_eq!(result.failure_count, 1);
    let failed = &result.results[&UserId::from("user-2")];
    assert!(failed.outcome.is_fallback);
    assert_eq!(failed.outcome.attempts, 2);
    for (id, outcome) in &result.results {
        if id.as_str() != "user-2" {
            assert!(outcome.success(), "{id} should succeed");
            assert_eq!(outcome.outcome.text, ADVICE_TEXT);
        }
    }
}

#[tokio::test]
async fn test_panicking_user_is_isolated() {
    let generator = Arc::new(MarkerGenerator::new(MARKER, ADVICE_TEXT, MarkerMode::Panic));
    let batch = orchestrator(generator, five_users_with_marked_third(), BatchConfig::new());

    let result = batch.run_for_active_users().await;

    assert_eq!(result.total_users, 5);
    assert_eq!(result.success_count, 4);
    let failed = &result.results[&UserId::from("user-2")];
    assert!(!failed.success());
    assert!(!failed.outcome.text.is_empty());
    assert_eq!(
        failed.outcome.error.as_deref(),
        Some("pipeline task panicked")
    );
}

#[tokio::test]
async fn test_panicking_sink_keeps_user_slot() {
    let sink = Arc::new(PanickingSink::new("user-2"));
    let batch = orchestrator(
        Arc::new(FlakyGenerator::new(0, ADVICE_TEXT)),
        users(5),
        BatchConfig::new(),
    )
    .with_sink(sink.clone());

    let result = batch.run_for_active_users().await;

    assert_eq!(result.total_users, 5);
    assert_eq!(result.success_count, 4);
    assert_eq!(result.failure_count, 1);
    let crashed = &result.results[&UserId::from("user-2")];
    assert!(!crashed.saved);
    assert!(!crashed.success());
    assert_eq!(crashed.outcome.text, ADVICE_TEXT);
    assert_eq!(crashed.outcome.error.as_deref(), Some("failed to save"));
    assert_eq!(sink.saved().len(), 4);
}

#[tokio::test]
async fn test_empty_batch_reports_zeroes() {
    let batch = orchestrator(
        Arc::new(FlakyGenerator::new(0, ADVICE_TEXT)),
        Vec::new(),
        BatchConfig::new(),
    );

    let result = batch.run_for_active_users().await;

    assert_eq!(result.total_users, 0);
    assert_eq!(result.success_count, 0);
    assert_eq!(result.failure_count, 0);
    assert!(result.results.is_empty());
    assert_eq!(result.total_execution_time_ms, 0);
    assert!(result.average_execution_time_ms.abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn test_users_run_concurrently() {
    let generator = Arc::new(SlowGenerator::new(Duration::from_millis(200), ADVICE_TEXT));
    let batch = orchestrator(
        generator.clone(),
        users(10),
        BatchConfig::new().with_max_concurrency(10),
    );

    let result = batch.run_for_active_users().await;

    assert_eq!(result.success_count, 10);
    assert!(
        result.total_execution_time_ms < 10 * 200 / 2,
        "took {}ms",
        result.total_execution_time_ms
    );
    assert_eq!(generator.peak(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_cap_is_respected() {
    let generator = Arc::new(SlowGenerator::new(Duration::from_millis(100), ADVICE_TEXT));
    let batch = orchestrator(
        generator.clone(),
        users(6),
        BatchConfig::new().with_max_concurrency(2),
    );

    let result = batch.run_for_active_users().await;

    assert_eq!(result.success_count, 6);
    assert_eq!(generator.peak(), 2);
    assert!(result.total_execution_time_ms >= 300);
    assert!(result.average_execution_time_ms >= 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_execution_time_is_per_user() {
    let generator = Arc::new(MarkerDelayGenerator::new(
        MARKER,
        Duration::from_millis(500),
        Duration::from_millis(50),
        ADVICE_TEXT,
    ));
    let batch = orchestrator(generator, five_users_with_marked_third(), BatchConfig::new());

    let result = batch.run_for_active_users().await;

    assert_eq!(result.success_count, 5);
    assert!(result.total_execution_time_ms >= 500);
    assert!(result.total_execution_time_ms < 550);
    for (id, outcome) in &result.results {
        if id.as_str() == "user-2" {
            assert!(outcome.execution_time_ms >= 500, "{id}: {}ms", outcome.execution_time_ms);
        } else {
            assert!(
                (50..100).contains(&outcome.execution_time_ms),
                "{id}: {}ms",
                outcome.execution_time_ms
            );
        }
    }
}

#[tokio::test]
async fn test_successful_results_are_saved() {
    let sink = Arc::new(RecordingSink::new());
    let batch = orchestrator(
        Arc::new(FlakyGenerator::new(0, GOAL_TEXT)),
        users(3),
        BatchConfig::new().with_kind(BatchKind::Goal),
    )
    .with_sink(sink.clone());

    let result = batch.run_for_active_users().await;

    assert_eq!(result.success_count, 3);
    let saved = sink.saved();
    assert_eq!(saved.len(), 3);
    let record = &saved[&UserId::from("user-1")];
    assert_eq!(record.kind, "goal");
    assert_eq!(record.text, GOAL_TEXT);
    assert_eq!(record.mentor, "coach");
}

#[tokio::test]
async fn test_save_failure_downgrades_only_that_user() {
    let sink = Arc::new(RecordingSink::rejecting(&["user-1"]));
    let batch = orchestrator(
        Arc::new(FlakyGenerator::new(0, ADVICE_TEXT)),
        users(3),
        BatchConfig::new(),
    )
    .with_sink(sink.clone());

    let result = batch.run_for_active_users().await;

    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 1);
    let rejected = &result.results[&UserId::from("user-1")];
    assert!(!rejected.saved);
    assert!(!rejected.outcome.is_fallback);
    assert_eq!(rejected.outcome.text, ADVICE_TEXT);
    assert_eq!(rejected.outcome.error.as_deref(), Some("failed to save"));
    assert!(result.results[&UserId::from("user-0")].saved);
    assert_eq!(sink.saved().len(), 2);
}

#[tokio::test]
async fn test_fallbacks_are_saved_by_default() {
    let sink = Arc::new(RecordingSink::new());
    let batch = orchestrator(
        Arc::new(AlwaysFailGenerator::default()),
        vec![user("solo", "friend")],
        BatchConfig::new(),
    )
    .with_sink(sink.clone());

    let result = batch.run_for_active_users().await;

    let outcome = &result.results[&UserId::from("solo")];
    assert!(outcome.outcome.is_fallback);
    assert!(outcome.saved);
    assert!(outcome.outcome.error.as_deref().unwrap().contains("service unavailable"));
    assert_eq!(result.failure_count, 1);
}

#[tokio::test]
async fn test_unknown_mentor_fails_only_that_user() {
    let mut source = users(2);
    source.push(user("odd", "wizard"));
    let batch = orchestrator(
        Arc::new(FlakyGenerator::new(0, ADVICE_TEXT)),
        source,
        BatchConfig::new(),
    );

    let result = batch.run_for_active_users().await;

    assert_eq!(result.total_users, 3);
    assert_eq!(result.failure_count, 1);
    assert_eq!(result.results[&UserId::from("odd")].outcome.attempts, 0);
}

#[tokio::test]
async fn test_run_for_single_user() {
    let sink = Arc::new(RecordingSink::new());
    let batch = orchestrator(
        Arc::new(FlakyGenerator::new(1, ADVICE_TEXT)),
        users(3),
        BatchConfig::new(),
    )
    .with_sink(sink.clone());

    let outcome = batch.run_for_user(&UserId::from("user-2")).await.unwrap();

    assert!(outcome.success());
    assert_eq!(outcome.outcome.attempts, 2);
    assert!(outcome.saved);
    assert!(batch.run_for_user(&UserId::from("missing")).await.is_none());
}
