// Display helpers: match clock, timestamps, status labels.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::Local;

use crate::model::{MatchStatus, Stamp};

/// Default timestamp pattern (pt-BR short date and time).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Placeholder for missing or invalid values.
pub const PLACEHOLDER: &str = "-";

/// `MM:SS` with zero padding. Minutes are not wrapped at 60.
pub fn format_elapsed(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Render a stamp in local time with a chrono `strftime` pattern.
///
/// Missing and invalid stamps, as well as patterns chrono cannot render,
/// come out as the placeholder.
pub fn format_stamp(stamp: Stamp, pattern: &str) -> String {
    let Some(at) = stamp.instant() else {
        return PLACEHOLDER.to_string();
    };
    let mut out = String::new();
    if write!(out, "{}", at.with_timezone(&Local).format(pattern)).is_err() {
        return PLACEHOLDER.to_string();
    }
    out
}

/// Whether chrono accepts `pattern` as a `strftime` format.
pub fn is_valid_date_format(pattern: &str) -> bool {
    !pattern.trim().is_empty() && !StrftimeItems::new(pattern).any(|item| item == Item::Error)
}

pub fn status_label(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::NotStarted => "Not started",
        MatchStatus::InProgress => "In progress",
        MatchStatus::Finished => "Finished",
        MatchStatus::Deleted => "Deleted",
    }
}
