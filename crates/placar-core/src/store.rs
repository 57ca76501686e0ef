// Match store: one record per match, tagged with its lifecycle status.
//
// The three display lists (not started, in progress, finished) are filters
// over a single ordered collection, so a match can never sit in two lists
// at once. Every lifecycle event merges the update into the known record
// field by field, retags it and moves it to the end of the order.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::{final_seconds, minutes_to_seconds, whole_seconds_between, ElapsedTracker};
use crate::model::{Match, MatchId, MatchStatus, Stamp};
use crate::update::MatchUpdate;

/// Owner of all match records and their time references.
#[derive(Debug, Default)]
pub struct MatchStore {
    matches: Vec<Match>,
    tracker: ElapsedTracker,
    /// Bumped on every real change.
    revision: u64,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Lifecycle operations
    // -----------------------------------------------------------------------

    /// A match was announced (or re-announced) and has not started.
    pub fn receive_new(&mut self, update: &MatchUpdate) {
        let record = self.merged(update, MatchStatus::NotStarted, self.get(&update.id));
        self.tracker.discard(&record.id);
        self.place(record);
    }

    /// A match kicked off.
    pub fn start(&mut self, update: &MatchUpdate, now: DateTime<Utc>) {
        let record = self.merged(update, MatchStatus::InProgress, self.get(&update.id));
        self.refresh_reference(&record, update, now);
        self.place(record);
    }

    /// Score (or other metadata) changed for a running match.
    ///
    /// Only a record that is currently in progress is merged into. A match
    /// that is unknown or sits in another list starts from the defaults
    /// ("Team A", "Team B", 0-0) before the update is applied.
    pub fn update_score(&mut self, update: &MatchUpdate, now: DateTime<Utc>) {
        let prior = self
            .get(&update.id)
            .filter(|m| m.status == MatchStatus::InProgress);
        let record = self.merged(update, MatchStatus::InProgress, prior);
        self.refresh_reference(&record, update, now);
        self.place(record);
    }

    /// A match ended. Its clock is frozen at the final elapsed time.
    pub fn finish(&mut self, update: &MatchUpdate, now: DateTime<Utc>) {
        let record = self.merged(update, MatchStatus::Finished, self.get(&update.id));
        let running = self
            .tracker
            .reference(&record.id)
            .map(|reference| reference.seconds_at(now));
        let seconds = final_seconds(&record, update.elapsed_minutes, running, now);
        self.tracker.freeze(&record.id, seconds, now);
        debug!("Match {} finished at {}s", record.id, seconds);
        self.place(record);
    }

    /// Drop a match and its time reference. Returns the removed record, or
    /// `None` (and no revision bump) when the id is unknown.
    pub fn remove(&mut self, id: &MatchId) -> Option<Match> {
        self.tracker.discard(id);
        let pos = self.position(id)?;
        let removed = self.matches.remove(pos);
        self.revision += 1;
        debug!("Match {} removed", id);
        Some(removed)
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn get(&self, id: &MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| &m.id == id)
    }

    /// Matches with the given status, in display order.
    pub fn view(&self, status: MatchStatus) -> impl Iterator<Item = &Match> + '_ {
        self.matches.iter().filter(move |m| m.status == status)
    }

    pub fn not_started(&self) -> impl Iterator<Item = &Match> + '_ {
        self.view(MatchStatus::NotStarted)
    }

    pub fn in_progress(&self) -> impl Iterator<Item = &Match> + '_ {
        self.view(MatchStatus::InProgress)
    }

    pub fn finished(&self) -> impl Iterator<Item = &Match> + '_ {
        self.view(MatchStatus::Finished)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn tracker(&self) -> &ElapsedTracker {
        &self.tracker
    }

    /// The clock for `id` as of `now`; `None` for unknown matches.
    pub fn elapsed_seconds(&self, id: &MatchId, now: DateTime<Utc>) -> Option<u64> {
        self.get(id)
            .map(|record| self.tracker.elapsed_seconds(record, now))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn position(&self, id: &MatchId) -> Option<usize> {
        self.matches.iter().position(|m| &m.id == id)
    }

    /// `prior` (or the defaults) with `update` applied on top and retagged.
    fn merged(&self, update: &MatchUpdate, status: MatchStatus, prior: Option<&Match>) -> Match {
        let mut record = prior
            .cloned()
            .unwrap_or_else(|| Match::placeholder(update.id.clone()));
        merge_into(&mut record, update);
        record.status = status;
        record
    }

    /// Keep the running clock in step with an in-progress event.
    ///
    /// Reported minutes re-anchor the clock. Without them a running
    /// reference is left alone, a frozen one resumes from its value, and a
    /// missing one is seeded from the start stamp or the known minutes.
    fn refresh_reference(&mut self, record: &Match, update: &MatchUpdate, now: DateTime<Utc>) {
        if let Some(minutes) = update.elapsed_minutes.filter(|m| m.is_finite()) {
            self.tracker
                .anchor(&record.id, minutes_to_seconds(Some(minutes)), now);
            return;
        }

        match self.tracker.reference(&record.id).copied() {
            Some(reference) if !reference.frozen => {}
            Some(reference) => self.tracker.anchor(&record.id, reference.base_seconds, now),
            None => {
                let base = match record.started_at.instant() {
                    Some(start) => whole_seconds_between(start, now),
                    None => minutes_to_seconds(record.elapsed_minutes),
                };
                self.tracker.anchor(&record.id, base, now);
            }
        }
    }

    /// Replace any record with the same id and append at the end.
    fn place(&mut self, record: Match) {
        if let Some(pos) = self.position(&record.id) {
            self.matches.remove(pos);
        }
        debug!("Match {} -> {:?}", record.id, record.status);
        self.matches.push(record);
        self.revision += 1;
    }
}

/// Apply the fields an update supplies; everything else keeps its value.
fn merge_into(record: &mut Match, update: &MatchUpdate) {
    if let Some(team_a) = &update.team_a {
        record.team_a = team_a.clone();
    }
    if let Some(team_b) = &update.team_b {
        record.team_b = team_b.clone();
    }
    if let Some(score_a) = update.score_a {
        record.score_a = score_a;
    }
    if let Some(score_b) = update.score_b {
        record.score_b = score_b;
    }
    if update.elapsed_minutes.is_some() {
        record.elapsed_minutes = update.elapsed_minutes;
    }
    if update.started_at != Stamp::Missing {
        record.started_at = update.started_at;
    }
    if update.ended_at != Stamp::Missing {
        record.ended_at = update.ended_at;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
