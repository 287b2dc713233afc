//! Mentor personas
//!
//! The set of mentors is closed. Every `match` on [`MentorId`] in the workspace
//! is exhaustive, so adding a persona is a compile error at each mentor-specific
//! site until it is handled there.

use crate::error::UnknownMentorError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Built-in mentor identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MentorId {
    /// Calm, reflective elder
    #[default]
    Sage,
    /// Demanding performance coach
    Coach,
    /// Upbeat peer
    Friend,
}

impl MentorId {
    /// Every mentor, in catalog order
    pub const ALL: [MentorId; 3] = [MentorId::Sage, MentorId::Coach, MentorId::Friend];

    /// Canonical lowercase identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MentorId::Sage => "sage",
            MentorId::Coach => "coach",
            MentorId::Friend => "friend",
        }
    }
}

impl FromStr for MentorId {
    type Err = UnknownMentorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sage" => Ok(MentorId::Sage),
            "coach" => Ok(MentorId::Coach),
            "friend" => Ok(MentorId::Friend),
            _ => Err(UnknownMentorError(s.to_string())),
        }
    }
}

impl std::fmt::Display for MentorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic KEEP / PROBLEM / TRY triple used when feedback generation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FallbackFeedback {
    /// What went well
    pub keep: &'static str,
    /// What got in the way
    pub problem: &'static str,
    /// What to attempt next
    #[serde(rename = "try")]
    pub try_next: &'static str,
}

/// Immutable persona configuration
///
/// Templates use the placeholders `{mentor_name}`, `{tone}`, `{todos}`,
/// `{retrospects}`, `{overall_goal}` and `{retrospect}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentorProfile {
    /// Identifier
    pub id: MentorId,
    /// Name shown to users and used in prompts
    pub display_name: &'static str,
    /// Short persona description
    pub description: &'static str,
    /// Daily advice prompt template
    pub advice_template: &'static str,
    /// Weekly goal prompt template
    pub goal_template: &'static str,
    /// Retrospect feedback prompt template
    pub feedback_template: &'static str,
    /// Advice returned when generation fails
    pub fallback_advice: &'static str,
    /// Goal returned when generation fails
    pub fallback_goal: &'static str,
    /// Feedback returned when generation fails
    pub fallback_feedback: FallbackFeedback,
}

static SAGE: MentorProfile = MentorProfile {
    id: MentorId::Sage,
    display_name: "Sage",
    description: "A calm, reflective mentor who looks for meaning in small steps.",
    advice_template: "You are {mentor_name}, a calm and reflective mentor. Speak {tone}.\n\
        The user's recent todos: {todos}\n\
        The user's recent retrospects: {retrospects}\n\
        Write two or three sentences of gentle, concrete advice for today.",
    goal_template: "You are {mentor_name}, a calm and reflective mentor. Speak {tone}.\n\
        The user's overall goal: {overall_goal}\n\
        Todos from last week: {todos}\n\
        Retrospects from last week: {retrospects}\n\
        Propose a single goal for this week in about 10 to 20 characters. Reply with the goal only.",
    feedback_template: "You are {mentor_name}, a calm and reflective mentor. Speak {tone}.\n\
        The user wrote this retrospect: {retrospect}\n\
        Answer only with a JSON object holding the string fields keep, problem and try.",
    fallback_advice: "Take one small step today and notice how it feels. Steady progress matters more than speed.",
    fallback_goal: "Reflect for ten minutes daily",
    fallback_feedback: FallbackFeedback {
        keep: "You took time to look back on your day.",
        problem: "Some plans may have been larger than the time you had.",
        try_next: "Pick one task tomorrow and finish it before anything else.",
    },
};

static COACH: MentorProfile = MentorProfile {
    id: MentorId::Coach,
    display_name: "Coach",
    description: "A demanding coach who pushes for measurable results.",
    advice_template: "You are {mentor_name}, a demanding performance coach. Speak {tone}.\n\
        Todos on the board: {todos}\n\
        Recent retrospects: {retrospects}\n\
        Give two or three sentences of direct, action-first advice for today.",
    goal_template: "You are {mentor_name}, a demanding performance coach. Speak {tone}.\n\
        Long-term target: {overall_goal}\n\
        Last week's todos: {todos}\n\
        Last week's retrospects: {retrospects}\n\
        Set one measurable goal for this week in about 10 to 20 characters. Reply with the goal only.",
    feedback_template: "You are {mentor_name}, a demanding performance coach. Speak {tone}.\n\
        Retrospect to review: {retrospect}\n\
        Answer only with a JSON object holding the string fields keep, problem and try.",
    fallback_advice: "Start with the hardest task before noon. Finish it, then earn your break.",
    fallback_goal: "Finish three key tasks",
    fallback_feedback: FallbackFeedback {
        keep: "You showed up and tracked your work.",
        problem: "Too many tasks stayed half done.",
        try_next: "Limit tomorrow to three tasks and close each one.",
    },
};

static FRIEND: MentorProfile = MentorProfile {
    id: MentorId::Friend,
    display_name: "Friend",
    description: "An upbeat peer who celebrates progress and keeps things light.",
    advice_template: "You are {mentor_name}, an upbeat and supportive friend. Speak {tone}.\n\
        What they planned lately: {todos}\n\
        How they felt about it: {retrospects}\n\
        Share two or three cheerful sentences of advice for today.",
    goal_template: "You are {mentor_name}, an upbeat and supportive friend. Speak {tone}.\n\
        Their big dream: {overall_goal}\n\
        What they planned last week: {todos}\n\
        How last week felt: {retrospects}\n\
        Suggest one fun goal for this week in about 10 to 20 characters. Reply with the goal only.",
    feedback_template: "You are {mentor_name}, an upbeat and supportive friend. Speak {tone}.\n\
        Their retrospect: {retrospect}\n\
        Answer only with a JSON object holding the string fields keep, problem and try.",
    fallback_advice: "You are doing better than you think! Pick something small and enjoy getting it done today.",
    fallback_goal: "Celebrate one win a day",
    fallback_feedback: FallbackFeedback {
        keep: "You kept going and wrote it all down!",
        problem: "Things got a little busy this time.",
        try_next: "Plan a tiny reward for finishing your first task.",
    },
};

/// Read-only registry of mentor profiles
///
/// Profiles are `'static` and immutable, so they are shared across tasks
/// without locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentorCatalog;

impl MentorCatalog {
    /// Profile for a known mentor
    #[inline]
    #[must_use]
    pub fn profile(id: MentorId) -> &'static MentorProfile {
        match id {
            MentorId::Sage => &SAGE,
            MentorId::Coach => &COACH,
            MentorId::Friend => &FRIEND,
        }
    }

    /// Profile for a raw identifier
    ///
    /// # Errors
    /// `UnknownMentorError` if `id` is not a built-in mentor
    pub fn profile_for(id: &str) -> Result<&'static MentorProfile, UnknownMentorError> {
        id.parse::<MentorId>().map(Self::profile)
    }

    /// All profiles in catalog order
    pub fn all() -> impl Iterator<Item = &'static MentorProfile> {
        MentorId::ALL.into_iter().map(Self::profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mentor_is_sage() {
        assert_eq!(MentorId::default(), MentorId::Sage);
        assert_eq!(MentorCatalog::profile(MentorId::default()).id, MentorId::Sage);
    }

    fn catalog_index(id: MentorId) -> usize {
        match id {
            MentorId::Sage => 0,
            MentorId::Coach => 1,
            MentorId::Friend => 2,
        }
    }

    #[test]
    fn all_lists_every_mentor_once() {
        for (i, id) in MentorId::ALL.iter().enumerate() {
            assert_eq!(catalog_index(*id), i);
        }
        assert_eq!(MentorCatalog::all().count(), MentorId::ALL.len());
    }

    #[test]
    fn known_mentors_have_fallbacks() {
        for id in MentorId::ALL {
            let profile = MentorCatalog::profile_for(id.as_str()).unwrap();
            assert_eq!(profile.id, id);
            assert!(!profile.display_name.is_empty());
            assert!(!profile.fallback_advice.trim().is_empty());
            assert!(!profile.fallback_goal.trim().is_empty());
            assert!(!profile.fallback_feedback.keep.is_empty());
            assert!(!profile.fallback_feedback.problem.is_empty());
            assert!(!profile.fallback_feedback.try_next.is_empty());
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(MentorCatalog::profile_for("COACH").unwrap().id, MentorId::Coach);
        assert_eq!(MentorCatalog::profile_for(" friend").unwrap().id, MentorId::Friend);
    }

    #[test]
    fn unknown_mentor_fails() {
        for raw in ["", "wizard", "sage2", "mentor"] {
            let err = MentorCatalog::profile_for(raw).unwrap_err();
            assert_eq!(err, UnknownMentorError(raw.to_string()));
        }
    }

    #[test]
    fn templates_declare_their_placeholders() {
        for profile in MentorCatalog::all() {
            assert!(profile.advice_template.contains("{todos}"));
            assert!(profile.advice_template.contains("{retrospects}"));
            assert!(profile.goal_template.contains("{overall_goal}"));
            assert!(profile.feedback_template.contains("{retrospect}"));
        }
    }

    #[test]
    fn mentor_id_serializes_lowercase() {
        let json = serde_json::to_string(&MentorId::Coach).unwrap();
        assert_eq!(json, "\"coach\"");
    }
}
