//! Core types for the mentor pipeline
//!
//! Defines:
//! - Commands accepted by the single-user pipeline
//! - The validated, per-run generation context
//! - Per-user and per-batch outcomes
//! - The user data shape supplied by the external user source

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use mentor_catalog::{IntimacyLevel, MentorCatalog, MentorId, MentorProfile};
use mentor_prompt::{ContextBuilder, ContextError, KptFeedback, ResponseContract};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// External user identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create user ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// What the pipeline is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Daily free-text advice
    Advice,
    /// Short weekly goal
    Goal,
    /// KEEP / PROBLEM / TRY feedback on a retrospect
    Feedback,
}

impl ContentKind {
    /// Response contract for this kind
    #[inline]
    #[must_use]
    pub fn contract(&self) -> ResponseContract {
        match self {
            ContentKind::Advice => ResponseContract::Advice,
            ContentKind::Goal => ResponseContract::Goal,
            ContentKind::Feedback => ResponseContract::Feedback,
        }
    }

    /// Deterministic fallback text from a mentor profile
    #[must_use]
    pub fn fallback_text(&self, profile: &MentorProfile) -> String {
        match self {
            ContentKind::Advice => profile.fallback_advice.to_string(),
            ContentKind::Goal => profile.fallback_goal.to_string(),
            ContentKind::Feedback => KptFeedback {
                keep: profile.fallback_feedback.keep.to_string(),
                problem: profile.fallback_feedback.problem.to_string(),
                try_next: profile.fallback_feedback.try_next.to_string(),
            }
            .to_json(),
        }
    }

    /// Lowercase label
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Advice => "advice",
            ContentKind::Goal => "goal",
            ContentKind::Feedback => "feedback",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content a batch run can produce for every user
///
/// Feedback is excluded because it needs a specific retrospect as input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    /// Daily advice
    #[default]
    Advice,
    /// Weekly goals
    Goal,
}

impl BatchKind {
    /// Matching content kind
    #[inline]
    #[must_use]
    pub fn content_kind(&self) -> ContentKind {
        match self {
            BatchKind::Advice => ContentKind::Advice,
            BatchKind::Goal => ContentKind::Goal,
        }
    }
}

/// Validated input for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    /// Mentor persona
    pub mentor: MentorId,
    /// Engagement level
    pub intimacy: IntimacyLevel,
    /// Recent (or last week's) todos, in order
    pub recent_todos: Vec<String>,
    /// Retrospects, in order
    pub retrospects: Vec<String>,
    /// Long-term goal
    pub overall_goal: Option<String>,
}

impl GenerationContext {
    /// Build the prompt for `kind` from the mentor's template
    ///
    /// # Errors
    /// `ContextError` if the template cannot be fully substituted
    pub fn build_prompt(&self, kind: ContentKind) -> Result<String, ContextError> {
        let builder = ContextBuilder::new(MentorCatalog::profile(self.mentor), self.intimacy);
        match kind {
            ContentKind::Advice => builder.build_advice_prompt(&self.recent_todos, &self.retrospects),
            ContentKind::Goal => builder.build_goal_prompt(
                &self.recent_todos,
                &self.retrospects,
                self.overall_goal.as_deref(),
            ),
            ContentKind::Feedback => builder.build_feedback_prompt(&self.retrospects.join("\n")),
        }
    }
}

/// A pipeline request
///
/// Mentor and intimacy arrive as raw text from callers and are checked by
/// [`GenerationCommand::into_context`].
pub trait GenerationCommand: Send {
    /// Content produced for this command
    const KIND: ContentKind;

    /// Requesting user
    fn user_id(&self) -> &UserId;

    /// Raw mentor identifier
    fn mentor(&self) -> &str;

    /// Validate and convert into a generation context
    ///
    /// # Errors
    /// `ValidationError` for blank required fields or unknown identifiers
    fn into_context(self) -> Result<GenerationContext, ValidationError>;
}

/// Daily advice request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceCommand {
    /// Requesting user
    pub user_id: UserId,
    /// Raw mentor identifier
    pub mentor: String,
    /// Raw intimacy label
    pub intimacy: String,
    /// Recent todos
    #[serde(default)]
    pub recent_todos: Vec<String>,
    /// Recent retrospects
    #[serde(default)]
    pub retrospects: Vec<String>,
}

impl GenerationCommand for AdviceCommand {
    const KIND: ContentKind = ContentKind::Advice;

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn mentor(&self) -> &str {
        &self.mentor
    }

    fn into_context(self) -> Result<GenerationContext, ValidationError> {
        let (mentor, intimacy) = validate_header(&self.user_id, &self.mentor, &self.intimacy)?;
        Ok(GenerationContext {
            mentor,
            intimacy,
            recent_todos: self.recent_todos,
            retrospects: self.retrospects,
            overall_goal: None,
        })
    }
}

/// Weekly goal request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalCommand {
    /// Requesting user
    pub user_id: UserId,
    /// Raw mentor identifier
    pub mentor: String,
    /// Raw intimacy label
    pub intimacy: String,
    /// Last week's todos
    #[serde(default)]
    pub past_todos: Vec<String>,
    /// Last week's retrospects
    #[serde(default)]
    pub past_retrospects: Vec<String>,
    /// Long-term goal
    #[serde(default)]
    pub overall_goal: Option<String>,
}

impl GenerationCommand for GoalCommand {
    const KIND: ContentKind = ContentKind::Goal;

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn mentor(&self) -> &str {
        &self.mentor
    }

    fn into_context(self) -> Result<GenerationContext, ValidationError> {
        let (mentor, intimacy) = validate_header(&self.user_id, &self.mentor, &self.intimacy)?;
        Ok(GenerationContext {
            mentor,
            intimacy,
            recent_todos: self.past_todos,
            retrospects: self.past_retrospects,
            overall_goal: self.overall_goal,
        })
    }
}

/// KEEP / PROBLEM / TRY feedback request for one retrospect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackCommand {
    /// Requesting user
    pub user_id: UserId,
    /// Raw mentor identifier
    pub mentor: String,
    /// Raw intimacy label
    pub intimacy: String,
    /// Retrospect text to review
    pub retrospect: String,
}

impl GenerationCommand for FeedbackCommand {
    const KIND: ContentKind = ContentKind::Feedback;

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn mentor(&self) -> &str {
        &self.mentor
    }

    fn into_context(self) -> Result<GenerationContext, ValidationError> {
        let (mentor, intimacy) = validate_header(&self.user_id, &self.mentor, &self.intimacy)?;
        if self.retrospect.trim().is_empty() {
            return Err(ValidationError::BlankField("retrospect"));
        }
        Ok(GenerationContext {
            mentor,
            intimacy,
            recent_todos: Vec::new(),
            retrospects: vec![self.retrospect],
            overall_goal: None,
        })
    }
}

fn validate_header(
    user_id: &UserId,
    mentor: &str,
    intimacy: &str,
) -> Result<(MentorId, IntimacyLevel), ValidationError> {
    if user_id.as_str().trim().is_empty() {
        return Err(ValidationError::BlankField("user_id"));
    }
    if mentor.trim().is_empty() {
        return Err(ValidationError::BlankField("mentor"));
    }
    if intimacy.trim().is_empty() {
        return Err(ValidationError::BlankField("intimacy"));
    }
    Ok((mentor.parse()?, intimacy.parse()?))
}

/// Result of one pipeline run
///
/// `text` is never empty: it is either validated model output or the
/// mentor's fallback for `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Whether caller requirements were met with generated text
    pub success: bool,
    /// Produced text
    pub text: String,
    /// Mentor identifier as supplied by the caller
    pub mentor: String,
    /// Content kind
    pub kind: ContentKind,
    /// When the outcome was produced
    pub generated_at: DateTime<Utc>,
    /// Whether `text` is deterministic fallback content
    pub is_fallback: bool,
    /// Failure description
    pub error: Option<String>,
    /// Generator attempts made (0 when validation short-circuited)
    pub attempts: u32,
}

impl GenerationOutcome {
    /// Failed outcome carrying the mentor's fallback text for `kind`
    ///
    /// Unknown mentors fall back to the default mentor's content.
    #[must_use]
    pub fn fallback(
        kind: ContentKind,
        mentor: impl Into<String>,
        error: impl Into<String>,
        attempts: u32,
    ) -> Self {
        let mentor = mentor.into();
        let profile = MentorCatalog::profile_for(&mentor)
            .unwrap_or_else(|_| MentorCatalog::profile(MentorId::default()));
        Self {
            success: false,
            text: kind.fallback_text(profile),
            mentor,
            kind,
            generated_at: Utc::now(),
            is_fallback: true,
            error: Some(error.into()),
            attempts,
        }
    }
}

/// User data as supplied by the external user source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserContext {
    /// User identifier
    pub user_id: UserId,
    /// Raw mentor identifier chosen by the user
    pub mentor: String,
    /// Lifetime todo count
    pub todo_count: u32,
    /// Lifetime retrospect count
    pub retrospect_count: u32,
    /// Recent todos, in order
    pub recent_todos: Vec<String>,
    /// Recent retrospects, in order
    pub retrospects: Vec<String>,
    /// Long-term goal
    pub overall_goal: Option<String>,
}

impl UserContext {
    /// Create user context with no history
    #[inline]
    #[must_use]
    pub fn new(user_id: impl Into<String>, mentor: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            mentor: mentor.into(),
            ..Self::default()
        }
    }

    /// With recent todos
    #[inline]
    #[must_use]
    pub fn with_todos(mut self, todos: Vec<String>) -> Self {
        self.recent_todos = todos;
        self
    }

    /// With recent retrospects
    #[inline]
    #[must_use]
    pub fn with_retrospects(mut self, retrospects: Vec<String>) -> Self {
        self.retrospects = retrospects;
        self
    }

    /// With activity counts
    #[inline]
    #[must_use]
    pub fn with_counts(mut self, todo_count: u32, retrospect_count: u32) -> Self {
        self.todo_count = todo_count;
        self.retrospect_count = retrospect_count;
        self
    }

    /// With overall goal
    #[inline]
    #[must_use]
    pub fn with_overall_goal(mut self, goal: impl Into<String>) -> Self {
        self.overall_goal = Some(goal.into());
        self
    }

    /// Intimacy derived from activity counts
    #[inline]
    #[must_use]
    pub fn intimacy(&self) -> IntimacyLevel {
        IntimacyLevel::from_activity(self.todo_count, self.retrospect_count)
    }

    /// Advice request for this user
    #[must_use]
    pub fn advice_command(&self) -> AdviceCommand {
        AdviceCommand {
            user_id: self.user_id.clone(),
            mentor: self.mentor.clone(),
            intimacy: self.intimacy().as_str().to_string(),
            recent_todos: self.recent_todos.clone(),
            retrospects: self.retrospects.clone(),
        }
    }

    /// Weekly goal request for this user
    #[must_use]
    pub fn goal_command(&self) -> GoalCommand {
        GoalCommand {
            user_id: self.user_id.clone(),
            mentor: self.mentor.clone(),
            intimacy: self.intimacy().as_str().to_string(),
            past_todos: self.recent_todos.clone(),
            past_retrospects: self.retrospects.clone(),
            overall_goal: self.overall_goal.clone(),
        }
    }
}

/// One user's slot in a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOutcome {
    /// Pipeline outcome, downgraded if saving failed
    pub outcome: GenerationOutcome,
    /// Wall-clock time for this user in milliseconds
    pub execution_time_ms: u64,
    /// Whether the result sink accepted the text
    pub saved: bool,
}

impl UserOutcome {
    /// Whether this user counts as a success
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.outcome.success
    }
}

/// Aggregate over one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRunResult {
    /// Content generated
    pub kind: BatchKind,
    /// Users processed
    pub total_users: usize,
    /// Users whose outcome succeeded
    pub success_count: usize,
    /// Users whose outcome failed
    pub failure_count: usize,
    /// Per-user outcomes, unordered
    pub results: HashMap<UserId, UserOutcome>,
    /// Batch start to last completion in milliseconds
    pub total_execution_time_ms: u64,
    /// Mean per-user time in milliseconds (0 when no users)
    pub average_execution_time_ms: f64,
}

impl BatchRunResult {
    /// Zero-valued result for a batch with no users
    #[must_use]
    pub fn empty(kind: BatchKind) -> Self {
        Self {
            kind,
            total_users: 0,
            success_count: 0,
            failure_count: 0,
            results: HashMap::new(),
            total_execution_time_ms: 0,
            average_execution_time_ms: 0.0,
        }
    }

    /// Aggregate collected per-user outcomes
    #[must_use]
    pub fn from_results(
        kind: BatchKind,
        results: HashMap<UserId, UserOutcome>,
        total_execution_time_ms: u64,
    ) -> Self {
        if results.is_empty() {
            return Self::empty(kind);
        }
        let success_count = results.values().filter(|r| r.success()).count();
        let total_user_ms: u64 = results.values().map(|r| r.execution_time_ms).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_execution_time_ms = total_user_ms as f64 / results.len() as f64;

        Self {
            kind,
            total_users: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            results,
            total_execution_time_ms,
            average_execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_prompt::NO_DATA;

    fn advice(user: &str, mentor: &str, intimacy: &str) -> AdviceCommand {
        AdviceCommand {
            user_id: UserId::from(user),
            mentor: mentor.to_string(),
            intimacy: intimacy.to_string(),
            ..AdviceCommand::default()
        }
    }

    #[test]
    fn default_command_has_blank_user_and_is_rejected() {
        let cmd = AdviceCommand::default();
        assert_eq!(cmd.user_id, UserId::default());
        assert_eq!(cmd.user_id.as_str(), "");
        assert_eq!(cmd.into_context(), Err(ValidationError::BlankField("user_id")));
        assert_eq!(UserContext::default().user_id, UserId::new(""));
    }

    #[test]
    fn advice_command_validates_header() {
        let ctx = advice("u1", "Coach", "high").into_context().unwrap();
        assert_eq!(ctx.mentor, MentorId::Coach);
        assert_eq!(ctx.intimacy, IntimacyLevel::High);
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(
            advice(" ", "sage", "low").into_context(),
            Err(ValidationError::BlankField("user_id"))
        );
        assert_eq!(
            advice("u1", "", "low").into_context(),
            Err(ValidationError::BlankField("mentor"))
        );
        assert_eq!(
            advice("u1", "sage", "").into_context(),
            Err(ValidationError::BlankField("intimacy"))
        );
    }

    #[test]
    fn unknown_identifiers_are_rejected() {
        assert!(matches!(
            advice("u1", "wizard", "low").into_context(),
            Err(ValidationError::UnknownMentor(_))
        ));
        assert!(matches!(
            advice("u1", "sage", "extreme").into_context(),
            Err(ValidationError::UnknownIntimacy(_))
        ));
    }

    #[test]
    fn feedback_requires_retrospect() {
        let cmd = FeedbackCommand {
            user_id: UserId::from("u1"),
            mentor: "friend".into(),
            intimacy: "low".into(),
            retrospect: "   ".into(),
        };
        assert_eq!(cmd.into_context(), Err(ValidationError::BlankField("retrospect")));
    }

    #[test]
    fn goal_context_prompt_has_no_placeholders() {
        let ctx = GoalCommand {
            user_id: UserId::from("u1"),
            mentor: "sage".into(),
            intimacy: "medium".into(),
            ..GoalCommand::default()
        }
        .into_context()
        .unwrap();
        let prompt = ctx.build_prompt(ContentKind::Goal).unwrap();
        assert_eq!(prompt.matches(NO_DATA).count(), 3);
        assert!(!prompt.contains("{overall_goal}"));
    }

    #[test]
    fn fallback_text_is_never_empty() {
        for profile in MentorCatalog::all() {
            for kind in [ContentKind::Advice, ContentKind::Goal, ContentKind::Feedback] {
                let text = kind.fallback_text(profile);
                assert!(!text.is_empty());
                assert!(kind.contract().check(&text).is_ok(), "{kind} fallback for {}", profile.id);
            }
        }
    }

    #[test]
    fn user_context_commands_carry_intimacy() {
        let user = UserContext::new("u9", "coach")
            .with_counts(40, 12)
            .with_todos(vec!["plan sprint".into()])
            .with_overall_goal("lead a team");
        assert_eq!(user.advice_command().intimacy, "high");
        let goal = user.goal_command();
        assert_eq!(goal.past_todos, vec!["plan sprint".to_string()]);
        assert_eq!(goal.overall_goal.as_deref(), Some("lead a team"));
    }

    #[test]
    fn empty_batch_has_zero_average() {
        let result = BatchRunResult::from_results(BatchKind::Advice, HashMap::new(), 0);
        assert_eq!(result, BatchRunResult::empty(BatchKind::Advice));
        assert!(result.average_execution_time_ms.abs() < f64::EPSILON);
    }

    #[test]
    fn batch_result_counts() {
        let outcome = |success| GenerationOutcome {
            success,
            text: "text".into(),
            mentor: "sage".into(),
            kind: ContentKind::Advice,
            generated_at: Utc::now(),
            is_fallback: !success,
            error: None,
            attempts: 1,
        };
        let mut results = HashMap::new();
        for (id, success, ms) in [("a", true, 10), ("b", false, 30), ("c", true, 20)] {
            results.insert(
                UserId::from(id),
                UserOutcome {
                    outcome: outcome(success),
                    execution_time_ms: ms,
                    saved: success,
                },
            );
        }

        let result = BatchRunResult::from_results(BatchKind::Goal, results, 35);
        assert_eq!(result.total_users, 3);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
        assert!((result.average_execution_time_ms - 20.0).abs() < f64::EPSILON);
        assert_eq!(result.total_execution_time_ms, 35);
    }
}
