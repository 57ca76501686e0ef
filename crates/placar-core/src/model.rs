// Match records, canonical identifiers, lifecycle status and timestamps.

use std::fmt;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// MatchId
// ---------------------------------------------------------------------------

/// Canonical match identifier.
///
/// Produced once at the payload boundary: the raw id is trimmed and numeric
/// ids are rendered as integers when integral, so `10`, `10.0` and `" 10 "`
/// all compare equal. Everything downstream compares `MatchId`s directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(String);

impl MatchId {
    /// Build an identifier from text. Returns `None` when nothing is left
    /// after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(MatchId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// MatchStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    NotStarted,
    InProgress,
    Finished,
    /// Only seen in payloads. Deleted matches are removed from the store,
    /// never kept with this tag.
    Deleted,
}

impl MatchStatus {
    /// Parse the status string used on the wire (`NAO_INICIADO`,
    /// `EM_ANDAMENTO`, `FINALIZADO`/`ENCERRADO`, `EXCLUIDO`).
    /// Case-insensitive; unknown values yield `None`.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NAO_INICIADO" | "NOT_STARTED" => Some(MatchStatus::NotStarted),
            "EM_ANDAMENTO" | "IN_PROGRESS" => Some(MatchStatus::InProgress),
            "FINALIZADO" | "ENCERRADO" | "FINISHED" => Some(MatchStatus::Finished),
            "EXCLUIDO" | "DELETED" => Some(MatchStatus::Deleted),
            _ => None,
        }
    }

    /// The wire name for this status.
    pub fn wire_name(self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "NAO_INICIADO",
            MatchStatus::InProgress => "EM_ANDAMENTO",
            MatchStatus::Finished => "FINALIZADO",
            MatchStatus::Deleted => "EXCLUIDO",
        }
    }
}

// ---------------------------------------------------------------------------
// Stamp
// ---------------------------------------------------------------------------

/// A timestamp as received from the server.
///
/// When merged into a record, `Invalid` overwrites the previous value and
/// `Missing` leaves it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stamp {
    /// Absent, `null` or falsy.
    #[default]
    Missing,
    /// Present but unparsable.
    Invalid,
    At(DateTime<Utc>),
}

impl Stamp {
    /// The instant, when valid.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Stamp::At(at) => Some(*at),
            Stamp::Missing | Stamp::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Stamp::At(_))
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// Default team-A name when nothing better is known.
pub const DEFAULT_TEAM_A: &str = "Team A";
/// Default team-B name when nothing better is known.
pub const DEFAULT_TEAM_B: &str = "Team B";

/// One tracked match.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: MatchId,
    pub team_a: String,
    pub team_b: String,
    pub score_a: u32,
    pub score_b: u32,
    pub status: MatchStatus,
    /// Elapsed minutes as last reported by the server.
    pub elapsed_minutes: Option<f64>,
    pub started_at: Stamp,
    pub ended_at: Stamp,
}

impl Match {
    /// A not-started match with default team names and a 0-0 score.
    pub fn placeholder(id: MatchId) -> Self {
        Match {
            id,
            team_a: DEFAULT_TEAM_A.to_string(),
            team_b: DEFAULT_TEAM_B.to_string(),
            score_a: 0,
            score_b: 0,
            status: MatchStatus::NotStarted,
            elapsed_minutes: None,
            started_at: Stamp::Missing,
            ended_at: Stamp::Missing,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
