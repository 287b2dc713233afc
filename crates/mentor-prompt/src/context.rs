//! Prompt construction
//!
//! Fills a mentor template with user history. Rendering is a single pass over
//! the template, so user text that happens to look like a placeholder is
//! copied verbatim and never expanded.

use crate::error::ContextError;
use mentor_catalog::{IntimacyLevel, MentorProfile};

/// Substituted for any empty list or absent value
pub const NO_DATA: &str = "no data available";

/// Separator between list entries
pub const LIST_SEPARATOR: &str = ", ";

/// Named template placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Mentor display name
    MentorName,
    /// Intimacy tone hint
    Tone,
    /// Recent or past todos
    Todos,
    /// Recent or past retrospects
    Retrospects,
    /// Overall goal
    OverallGoal,
    /// A single retrospect under review
    Retrospect,
}

impl Placeholder {
    /// Every placeholder
    pub const ALL: [Placeholder; 6] = [
        Placeholder::MentorName,
        Placeholder::Tone,
        Placeholder::Todos,
        Placeholder::Retrospects,
        Placeholder::OverallGoal,
        Placeholder::Retrospect,
    ];

    /// Token as it appears in templates
    #[inline]
    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::MentorName => "{mentor_name}",
            Placeholder::Tone => "{tone}",
            Placeholder::Todos => "{todos}",
            Placeholder::Retrospects => "{retrospects}",
            Placeholder::OverallGoal => "{overall_goal}",
            Placeholder::Retrospect => "{retrospect}",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| &p.token()[1..p.token().len() - 1] == name)
    }
}

/// Builds prompts for one mentor at one intimacy level
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder<'a> {
    profile: &'a MentorProfile,
    intimacy: IntimacyLevel,
}

impl<'a> ContextBuilder<'a> {
    /// Create builder
    #[inline]
    #[must_use]
    pub fn new(profile: &'a MentorProfile, intimacy: IntimacyLevel) -> Self {
        Self { profile, intimacy }
    }

    /// Daily advice prompt
    ///
    /// # Errors
    /// `ContextError::UnresolvedPlaceholder` if the template uses a placeholder
    /// advice prompts do not supply
    pub fn build_advice_prompt(
        &self,
        todos: &[String],
        retrospects: &[String],
    ) -> Result<String, ContextError> {
        let todos = join_or_no_data(todos);
        let retrospects = join_or_no_data(retrospects);
        render(
            self.profile.advice_template,
            &[
                (Placeholder::MentorName, self.profile.display_name),
                (Placeholder::Tone, self.intimacy.tone()),
                (Placeholder::Todos, todos.as_str()),
                (Placeholder::Retrospects, retrospects.as_str()),
            ],
        )
    }

    /// Weekly goal prompt
    ///
    /// # Errors
    /// `ContextError::UnresolvedPlaceholder` if the template uses a placeholder
    /// goal prompts do not supply
    pub fn build_goal_prompt(
        &self,
        past_todos: &[String],
        past_retrospects: &[String],
        overall_goal: Option<&str>,
    ) -> Result<String, ContextError> {
        let todos = join_or_no_data(past_todos);
        let retrospects = join_or_no_data(past_retrospects);
        let overall_goal = value_or_no_data(overall_goal);
        render(
            self.profile.goal_template,
            &[
                (Placeholder::MentorName, self.profile.display_name),
                (Placeholder::Tone, self.intimacy.tone()),
                (Placeholder::Todos, todos.as_str()),
                (Placeholder::Retrospects, retrospects.as_str()),
                (Placeholder::OverallGoal, overall_goal),
            ],
        )
    }

    /// KEEP / PROBLEM / TRY feedback prompt for a single retrospect
    ///
    /// # Errors
    /// `ContextError::UnresolvedPlaceholder` if the template uses a placeholder
    /// feedback prompts do not supply
    pub fn build_feedback_prompt(&self, retrospect: &str) -> Result<String, ContextError> {
        render(
            self.profile.feedback_template,
            &[
                (Placeholder::MentorName, self.profile.display_name),
                (Placeholder::Tone, self.intimacy.tone()),
                (Placeholder::Retrospect, value_or_no_data(Some(retrospect))),
            ],
        )
    }
}

/// Join trimmed, non-blank entries in order, or the no-data sentinel
#[must_use]
pub fn join_or_no_data(items: &[String]) -> String {
    let joined = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);
    if joined.is_empty() {
        NO_DATA.to_string()
    } else {
        joined
    }
}

fn value_or_no_data(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => NO_DATA,
    }
}

fn render(template: &str, values: &[(Placeholder, &str)]) -> Result<String, ContextError> {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let placeholder = after
            .find('}')
            .and_then(|close| Placeholder::from_name(&after[..close]).map(|p| (p, close)));

        match placeholder {
            Some((p, close)) => {
                let value = values
                    .iter()
                    .find(|(candidate, _)| *candidate == p)
                    .map(|(_, v)| *v)
                    .ok_or(ContextError::UnresolvedPlaceholder(p.token()))?;
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_catalog::{MentorCatalog, MentorId};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn no_placeholders_left(prompt: &str) {
        for p in Placeholder::ALL {
            assert!(!prompt.contains(p.token()), "{} left in {prompt:?}", p.token());
        }
    }

    #[test]
    fn empty_history_uses_no_data() {
        for profile in MentorCatalog::all() {
            let prompt = ContextBuilder::new(profile, IntimacyLevel::Low)
                .build_advice_prompt(&[], &[])
                .unwrap();
            assert_eq!(prompt.matches(NO_DATA).count(), 2);
            no_placeholders_left(&prompt);
        }
    }

    #[test]
    fn lists_join_in_order() {
        let profile = MentorCatalog::profile(MentorId::Sage);
        let prompt = ContextBuilder::new(profile, IntimacyLevel::Medium)
            .build_advice_prompt(&strings(&["write report", " ", "call mom "]), &strings(&["tired"]))
            .unwrap();
        assert!(prompt.contains("write report, call mom"));
        assert!(prompt.contains("tired"));
        assert!(prompt.contains(IntimacyLevel::Medium.tone()));
        assert!(prompt.contains("You are Sage"));
    }

    #[test]
    fn goal_prompt_fills_overall_goal() {
        let profile = MentorCatalog::profile(MentorId::Coach);
        let builder = ContextBuilder::new(profile, IntimacyLevel::High);

        let with_goal = builder
            .build_goal_prompt(&strings(&["run 5k"]), &[], Some("finish a marathon"))
            .unwrap();
        assert!(with_goal.contains("finish a marathon"));
        no_placeholders_left(&with_goal);

        let blank_goal = builder.build_goal_prompt(&[], &[], Some("   ")).unwrap();
        assert_eq!(blank_goal.matches(NO_DATA).count(), 3);

        let absent_goal = builder.build_goal_prompt(&[], &[], None).unwrap();
        assert_eq!(blank_goal, absent_goal);
    }

    #[test]
    fn feedback_prompt_embeds_retrospect() {
        let profile = MentorCatalog::profile(MentorId::Friend);
        let prompt = ContextBuilder::new(profile, IntimacyLevel::Low)
            .build_feedback_prompt("shipped the demo but skipped lunch")
            .unwrap();
        assert!(prompt.contains("shipped the demo but skipped lunch"));
        no_placeholders_left(&prompt);
    }

    #[test]
    fn user_text_is_not_expanded() {
        let profile = MentorCatalog::profile(MentorId::Sage);
        let prompt = ContextBuilder::new(profile, IntimacyLevel::Low)
            .build_advice_prompt(&strings(&["learn {retrospects} syntax"]), &strings(&["ok"]))
            .unwrap();
        assert!(prompt.contains("learn {retrospects} syntax"));
    }

    #[test]
    fn unsupplied_placeholder_is_an_error() {
        let mut profile = MentorCatalog::profile(MentorId::Sage).clone();
        profile.advice_template = "Advice toward {overall_goal}: {todos}";
        let err = ContextBuilder::new(&profile, IntimacyLevel::Low)
            .build_advice_prompt(&[], &[])
            .unwrap_err();
        assert_eq!(err, ContextError::UnresolvedPlaceholder("{overall_goal}"));
    }

    #[test]
    fn literal_braces_survive() {
        let mut profile = MentorCatalog::profile(MentorId::Sage).clone();
        profile.advice_template = "Format: {\"advice\": ...} for { {todos}";
        let prompt = ContextBuilder::new(&profile, IntimacyLevel::Low)
            .build_advice_prompt(&strings(&["a"]), &[])
            .unwrap();
        assert_eq!(prompt, "Format: {\"advice\": ...} for { a");
    }

    proptest! {
        #[test]
        fn prompts_are_deterministic(
            todos in proptest::collection::vec(".{0,20}", 0..5),
            retros in proptest::collection::vec(".{0,20}", 0..5),
            goal in proptest::option::of(".{0,20}"),
        ) {
            for profile in MentorCatalog::all() {
                let builder = ContextBuilder::new(profile, IntimacyLevel::Medium);
                prop_assert_eq!(
                    builder.build_advice_prompt(&todos, &retros),
                    builder.build_advice_prompt(&todos, &retros)
                );
                prop_assert_eq!(
                    builder.build_goal_prompt(&todos, &retros, goal.as_deref()),
                    builder.build_goal_prompt(&todos, &retros, goal.as_deref())
                );
            }
        }
    }
}
