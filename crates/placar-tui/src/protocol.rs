// Message types exchanged between the feed tasks, the app orchestrator and
// the TUI.

use placar_core::{Channel, MatchId, MatchStatus};

// ---------------------------------------------------------------------------
// Feed -> app
// ---------------------------------------------------------------------------

/// Events emitted by the SSE subscription tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// The channel's stream opened (or reopened after a retry).
    Connected(Channel),
    /// A payload arrived on the channel (raw JSON text).
    Payload { channel: Channel, data: String },
    /// The transport reported an error on the channel.
    Error { channel: Channel, message: String },
    /// The channel's task ended and will not reconnect.
    Closed(Channel),
}

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

/// Commands sent from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Quit,
    /// Fetch and show the log of a match.
    OpenLog(MatchId),
    /// Close the log panel and drop its entries.
    CloseLog,
}

// ---------------------------------------------------------------------------
// App -> TUI
// ---------------------------------------------------------------------------

/// Per-channel connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

/// One pre-rendered row of a match list.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    pub id: MatchId,
    pub team_a: String,
    pub team_b: String,
    pub score_a: u32,
    pub score_b: u32,
    pub status: MatchStatus,
    /// Formatted start time, or the placeholder.
    pub started: String,
    /// `MM:SS` clock; empty for matches that have not started.
    pub clock: String,
}

/// Everything the dashboard needs to draw the three lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub not_started: Vec<MatchRow>,
    pub in_progress: Vec<MatchRow>,
    pub finished: Vec<MatchRow>,
    /// Connection state for each channel, in `Channel::ALL` order.
    pub channels: Vec<(Channel, ConnectionStatus)>,
    /// Most recent transport error, if any.
    pub last_error: Option<String>,
}

/// State of the log panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LogView {
    #[default]
    Closed,
    Loading(MatchId),
    Loaded { id: MatchId, lines: Vec<String> },
    Failed { id: MatchId, message: String },
}

impl LogView {
    /// The match this panel is about, if open.
    pub fn match_id(&self) -> Option<&MatchId> {
        match self {
            LogView::Closed => None,
            LogView::Loading(id) => Some(id),
            LogView::Loaded { id, .. } | LogView::Failed { id, .. } => Some(id),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, LogView::Closed)
    }
}

/// Updates pushed from the app orchestrator to the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Snapshot(Box<Snapshot>),
    Log(LogView),
}
