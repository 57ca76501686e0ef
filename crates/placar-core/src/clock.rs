// Elapsed-time tracking for the live match clock.
//
// A `TimeReference` pins a base number of elapsed seconds to the instant it
// was captured, so the display can project a running clock from wall-clock
// time alone. References are owned by the `ElapsedTracker`, which lives
// inside the `MatchStore`; display code only reads them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{Match, MatchId, MatchStatus};

// ---------------------------------------------------------------------------
// TimeReference
// ---------------------------------------------------------------------------

/// Base elapsed seconds captured at a known instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeReference {
    pub base_seconds: u64,
    pub captured_at: DateTime<Utc>,
    /// A frozen reference no longer accrues time.
    pub frozen: bool,
}

impl TimeReference {
    /// Elapsed seconds projected to `now`.
    pub fn seconds_at(&self, now: DateTime<Utc>) -> u64 {
        if self.frozen {
            self.base_seconds
        } else {
            self.base_seconds
                .saturating_add(whole_seconds_between(self.captured_at, now))
        }
    }
}

/// Whole seconds from `from` to `to`, clamped at zero.
pub fn whole_seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    let millis = (to - from).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis / 1000) as u64
    }
}

/// Upper bound for any seeded clock: one year of play.
pub const MAX_CLOCK_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Server-reported minutes as whole seconds. Absent, negative or non-finite
/// values count as zero; huge values are capped at [`MAX_CLOCK_SECONDS`].
pub fn minutes_to_seconds(minutes: Option<f64>) -> u64 {
    match minutes {
        Some(m) if m.is_finite() && m > 0.0 => {
            let seconds = (m * 60.0).floor();
            if seconds >= MAX_CLOCK_SECONDS as f64 {
                MAX_CLOCK_SECONDS
            } else {
                seconds as u64
            }
        }
        _ => 0,
    }
}

/// Final elapsed seconds for a finishing match.
///
/// Tried in order: end - start, now - start, the finishing update's own
/// minutes, the running reference (already projected to `now`), the last
/// known minutes on the record, zero.
pub fn final_seconds(
    record: &Match,
    reported_minutes: Option<f64>,
    running: Option<u64>,
    now: DateTime<Utc>,
) -> u64 {
    if let Some(start) = record.started_at.instant() {
        let end = record.ended_at.instant().unwrap_or(now);
        return whole_seconds_between(start, end);
    }
    if let Some(minutes) = reported_minutes.filter(|m| m.is_finite()) {
        return minutes_to_seconds(Some(minutes));
    }
    if let Some(seconds) = running {
        return seconds;
    }
    minutes_to_seconds(record.elapsed_minutes)
}

// ---------------------------------------------------------------------------
// ElapsedTracker
// ---------------------------------------------------------------------------

/// Per-match time references.
#[derive(Debug, Default)]
pub struct ElapsedTracker {
    references: HashMap<MatchId, TimeReference>,
}

impl ElapsedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference(&self, id: &MatchId) -> Option<&TimeReference> {
        self.references.get(id)
    }

    pub fn contains(&self, id: &MatchId) -> bool {
        self.references.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Start (or restart) a running reference.
    pub(crate) fn anchor(&mut self, id: &MatchId, base_seconds: u64, now: DateTime<Utc>) {
        self.references.insert(
            id.clone(),
            TimeReference {
                base_seconds,
                captured_at: now,
                frozen: false,
            },
        );
    }

    /// Pin a reference at `seconds` for good.
    pub(crate) fn freeze(&mut self, id: &MatchId, seconds: u64, now: DateTime<Utc>) {
        self.references.insert(
            id.clone(),
            TimeReference {
                base_seconds: seconds,
                captured_at: now,
                frozen: true,
            },
        );
    }

    pub(crate) fn discard(&mut self, id: &MatchId) -> bool {
        self.references.remove(id).is_some()
    }

    /// The match clock in whole seconds as of `now`.
    ///
    /// Not-started and deleted matches report 0. Otherwise the reference
    /// wins when present; without one an in-progress match counts from its
    /// start stamp, then falls back to the reported minutes, and a finished
    /// match uses the same chain as [`final_seconds`].
    pub fn elapsed_seconds(&self, record: &Match, now: DateTime<Utc>) -> u64 {
        match record.status {
            MatchStatus::NotStarted | MatchStatus::Deleted => 0,
            MatchStatus::InProgress | MatchStatus::Finished => {
                if let Some(reference) = self.references.get(&record.id) {
                    return reference.seconds_at(now);
                }
                if record.status == MatchStatus::Finished {
                    return final_seconds(record, None, None, now);
                }
                match record.started_at.instant() {
                    Some(start) => whole_seconds_between(start, now),
                    None => minutes_to_seconds(record.elapsed_minutes),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
