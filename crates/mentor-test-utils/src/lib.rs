//! Testing utilities for the mentor workspace
//!
//! Scripted generators, in-memory user sources and recording sinks.

#![allow(missing_docs)]

use async_trait::async_trait;
use mentor_core::{
    GenerationError, PipelineConfig, ResultSink, RetryPolicy, TextGenerator, UserContext, UserId,
    UserSource,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const ADVICE_TEXT: &str = "Start with your most important task and protect an hour for it.";
pub const GOAL_TEXT: &str = "Finish two focused sessions daily";

pub fn user(id: &str, mentor: &str) -> UserContext {
    UserContext::new(id, mentor)
        .with_todos(vec!["review notes".to_string(), "plan sprint".to_string()])
        .with_retrospects(vec!["felt scattered on Tuesday".to_string()])
        .with_counts(12, 4)
}

pub fn users(count: usize) -> Vec<UserContext> {
    let mentors = ["sage", "coach", "friend"];
    (0..count)
        .map(|i| user(&format!("user-{i}"), mentors[i % mentors.len()]))
        .collect()
}

/// Pipeline config with near-zero backoff
pub fn fast_pipeline_config(max_attempts: u32) -> PipelineConfig {
    PipelineConfig::new().with_retry(RetryPolicy::new(max_attempts, Duration::from_millis(1)))
}

/// Fails a fixed number of times, then answers
#[derive(Debug)]
pub struct FlakyGenerator {
    failures: usize,
    text: String,
    calls: AtomicUsize,
}

impl FlakyGenerator {
    pub fn new(failures: usize, text: &str) -> Self {
        Self {
            failures,
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FlakyGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(GenerationError::Transport(format!("connection reset ({})", call + 1)))
        } else {
            Ok(self.text.clone())
        }
    }
}

/// Never answers successfully
#[derive(Debug, Default)]
pub struct AlwaysFailGenerator {
    calls: AtomicUsize,
}

impl AlwaysFailGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for AlwaysFailGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Transport("service unavailable".to_string()))
    }
}

/// Sleeps before answering and tracks peak concurrency
#[derive(Debug)]
pub struct SlowGenerator {
    delay: Duration,
    text: String,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowGenerator {
    pub fn new(delay: Duration, text: &str) -> Self {
        Self {
            delay,
            text: text.to_string(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Sleeps `slow` for prompts containing `marker`, `fast` otherwise
#[derive(Debug)]
pub struct MarkerDelayGenerator {
    marker: String,
    slow: Duration,
    fast: Duration,
    text: String,
}

impl MarkerDelayGenerator {
    pub fn new(marker: &str, slow: Duration, fast: Duration, text: &str) -> Self {
        Self {
            marker: marker.to_string(),
            slow,
            fast,
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for MarkerDelayGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let delay = if prompt.contains(&self.marker) {
            self.slow
        } else {
            self.fast
        };
        tokio::time::sleep(delay).await;
        Ok(self.text.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerMode {
    Fail,
    Panic,
}

/// Misbehaves for prompts containing `marker`, answers `text` otherwise
///
/// User fixtures put their todos into the prompt, so a marker todo singles
/// out one user in a batch.
#[derive(Debug)]
pub struct MarkerGenerator {
    marker: String,
    text: String,
    mode: MarkerMode,
}

impl MarkerGenerator {
    pub fn new(marker: &str, text: &str, mode: MarkerMode) -> Self {
        Self {
            marker: marker.to_string(),
            text: text.to_string(),
            mode,
        }
    }
}

#[async_trait]
impl TextGenerator for MarkerGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if !prompt.contains(&self.marker) {
            return Ok(self.text.clone());
        }
        match self.mode {
            MarkerMode::Fail => Err(GenerationError::Auth("token rejected".to_string())),
            MarkerMode::Panic => panic!("generator blew up on {}", self.marker),
        }
    }
}

/// User source backed by a fixed list
#[derive(Debug, Default)]
pub struct InMemoryUserSource {
    users: Vec<UserContext>,
}

impl InMemoryUserSource {
    pub fn new(users: Vec<UserContext>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserSource for InMemoryUserSource {
    async fn active_users(&self) -> Vec<UserContext> {
        self.users.clone()
    }

    async fn user_data(&self, user_id: &UserId) -> Option<UserContext> {
        self.users.iter().find(|u| &u.user_id == user_id).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRecord {
    pub kind: &'static str,
    pub text: String,
    pub mentor: String,
}

/// Sink that records saves and rejects chosen users
#[derive(Debug, Default)]
pub struct RecordingSink {
    saved: Mutex<HashMap<UserId, SavedRecord>>,
    reject: HashSet<UserId>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(ids: &[&str]) -> Self {
        Self {
            saved: Mutex::new(HashMap::new()),
            reject: ids.iter().map(|id| UserId::from(*id)).collect(),
        }
    }

    pub fn saved(&self) -> HashMap<UserId, SavedRecord> {
        self.saved.lock().clone()
    }

    fn record(&self, kind: &'static str, user_id: &UserId, text: &str, mentor: &str) -> bool {
        if self.reject.contains(user_id) {
            return false;
        }
        self.saved.lock().insert(
            user_id.clone(),
            SavedRecord {
                kind,
                text: text.to_string(),
                mentor: mentor.to_string(),
            },
        );
        true
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn save_advice(&self, user_id: &UserId, text: &str, mentor: &str) -> bool {
        self.record("advice", user_id, text, mentor)
    }

    async fn save_goal(&self, user_id: &UserId, text: &str, mentor: &str) -> bool {
        self.record("goal", user_id, text, mentor)
    }
}

/// Sink that panics when saving for one user and accepts everyone else
#[derive(Debug)]
pub struct PanickingSink {
    target: UserId,
    inner: RecordingSink,
}

impl PanickingSink {
    pub fn new(target: &str) -> Self {
        Self {
            target: UserId::from(target),
            inner: RecordingSink::new(),
        }
    }

    pub fn saved(&self) -> HashMap<UserId, SavedRecord> {
        self.inner.saved()
    }
}

#[async_trait]
impl ResultSink for PanickingSink {
    async fn save_advice(&self, user_id: &UserId, text: &str, mentor: &str) -> bool {
        assert!(user_id != &self.target, "storage crashed for {user_id}");
        self.inner.save_advice(user_id, text, mentor).await
    }

    async fn save_goal(&self, user_id: &UserId, text: &str, mentor: &str) -> bool {
        assert!(user_id != &self.target, "storage crashed for {user_id}");
        self.inner.save_goal(user_id, text, mentor).await
    }
}

/// Profile fallback text for a mentor id
pub fn fallback_advice(mentor: &str) -> &'static str {
    mentor_catalog::MentorCatalog::profile_for(mentor)
        .map_or("", |profile| profile.fallback_advice)
}
