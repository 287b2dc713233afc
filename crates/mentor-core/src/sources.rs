//! External collaborators of the batch orchestrator

use crate::types::{UserContext, UserId};
use async_trait::async_trait;

/// Supplies users and their recent activity
///
/// Implementations fail open: lookup errors become an empty list or `None`,
/// never a panic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Users eligible for a batch run
    async fn active_users(&self) -> Vec<UserContext>;

    /// One user's data, if known
    async fn user_data(&self, user_id: &UserId) -> Option<UserContext>;
}

/// Persists generated text
///
/// Returns `false` when the text was not stored.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Store daily advice
    async fn save_advice(&self, user_id: &UserId, text: &str, mentor: &str) -> bool;

    /// Store a weekly goal
    async fn save_goal(&self, user_id: &UserId, text: &str, mentor: &str) -> bool;
}
