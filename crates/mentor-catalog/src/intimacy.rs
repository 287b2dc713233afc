//! Intimacy classification
//!
//! Derived from how much history a user has accumulated. Recomputed on every
//! request; nothing here is cached.

use crate::error::UnknownIntimacyError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Todo count at which a user is at least `Medium`
pub const MEDIUM_TODO_THRESHOLD: u32 = 10;
/// Retrospect count at which a user is at least `Medium`
pub const MEDIUM_RETROSPECT_THRESHOLD: u32 = 3;
/// Todo count required (together with retrospects) for `High`
pub const HIGH_TODO_THRESHOLD: u32 = 30;
/// Retrospect count required (together with todos) for `High`
pub const HIGH_RETROSPECT_THRESHOLD: u32 = 10;

/// Ordinal engagement level used to modulate mentor tone
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum IntimacyLevel {
    /// New or quiet user
    #[default]
    Low,
    /// Regular user
    Medium,
    /// Long-standing, active user
    High,
}

impl IntimacyLevel {
    /// Classify a user from activity volume
    #[must_use]
    pub fn from_activity(todo_count: u32, retrospect_count: u32) -> Self {
        if todo_count >= HIGH_TODO_THRESHOLD && retrospect_count >= HIGH_RETROSPECT_THRESHOLD {
            Self::High
        } else if todo_count >= MEDIUM_TODO_THRESHOLD
            || retrospect_count >= MEDIUM_RETROSPECT_THRESHOLD
        {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Canonical lowercase label
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Tone hint substituted into prompts
    #[inline]
    #[must_use]
    pub fn tone(&self) -> &'static str {
        match self {
            Self::Low => "politely, as to someone you have just met",
            Self::Medium => "warmly, as to someone you know well",
            Self::High => "candidly, as to a close friend you have guided for a long time",
        }
    }
}

impl FromStr for IntimacyLevel {
    type Err = UnknownIntimacyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(UnknownIntimacyError(s.to_string())),
        }
    }
}

impl std::fmt::Display for IntimacyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
