//! File-backed user source and result sink

use async_trait::async_trait;
use mentor_core::{ResultSink, UserContext, UserId, UserSource};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Reads users from a JSON array on every call
///
/// A missing or malformed file yields no users.
#[derive(Debug, Clone)]
pub(crate) struct JsonFileUserSource {
    path: PathBuf,
}

impl JsonFileUserSource {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Vec<UserContext> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!(path = %self.path.display(), error = %err, "cannot read users file");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(users) => users,
            Err(err) => {
                tracing::error!(path = %self.path.display(), error = %err, "cannot parse users file");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl UserSource for JsonFileUserSource {
    async fn active_users(&self) -> Vec<UserContext> {
        self.load()
    }

    async fn user_data(&self, user_id: &UserId) -> Option<UserContext> {
        self.load().into_iter().find(|u| &u.user_id == user_id)
    }
}

#[derive(Serialize)]
struct SavedLine<'a> {
    user_id: &'a UserId,
    kind: &'static str,
    mentor: &'a str,
    text: &'a str,
}

/// Appends one JSON object per saved result
#[derive(Debug)]
pub(crate) struct JsonLinesSink {
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub(crate) fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::options().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn append(&self, line: &SavedLine<'_>) -> bool {
        let encoded = match serde_json::to_string(line) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::error!(error = %err, "cannot encode result");
                return false;
            }
        };
        let mut file = self.file.lock();
        match writeln!(file, "{encoded}") {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "cannot write result");
                false
            }
        }
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn save_advice(&self, user_id: &UserId, text: &str, mentor: &str) -> bool {
        self.append(&SavedLine {
            user_id,
            kind: "advice",
            mentor,
            text,
        })
    }

    async fn save_goal(&self, user_id: &UserId, text: &str, mentor: &str) -> bool {
        self.append(&SavedLine {
            user_id,
            kind: "goal",
            mentor,
            text,
        })
    }
}
