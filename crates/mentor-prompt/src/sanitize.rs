//! Whitespace normalization for model output

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern is valid"));

static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Collapse blank-line runs, collapse whitespace runs to one space, trim.
///
/// Idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let lines = BLANK_LINES.replace_all(raw, "\n");
    let spaced = WHITESPACE_RUNS.replace_all(&lines, " ");
    spaced.trim().to_string()
}
