// Channel routing: which store operation each inbound channel triggers.
//
// The router owns the `MatchStore` and the display clock. Raw payloads go
// through the normalizer here; a malformed payload is logged and dropped
// without touching the store or any other channel.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::model::{Match, MatchId};
use crate::store::MatchStore;
use crate::update::{self, MatchUpdate};

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// One of the five inbound event channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    New,
    Start,
    Score,
    Finish,
    Deleted,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::New,
        Channel::Start,
        Channel::Score,
        Channel::Finish,
        Channel::Deleted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::New => "new",
            Channel::Start => "start",
            Channel::Score => "score",
            Channel::Finish => "finish",
            Channel::Deleted => "deleted",
        }
    }

    /// The name the server uses for this channel's SSE event.
    pub fn server_name(self) -> &'static str {
        match self {
            Channel::New => "novos",
            Channel::Start => "inicio",
            Channel::Score => "placar",
            Channel::Finish => "encerrado",
            Channel::Deleted => "excluido",
        }
    }

    /// Endpoint path relative to the API base URL.
    pub fn default_path(self) -> &'static str {
        match self {
            Channel::New => "/sse/games/novos",
            Channel::Start => "/sse/games/inicio",
            Channel::Score => "/sse/games/placar",
            Channel::Finish => "/sse/games/encerrado",
            Channel::Deleted => "/sse/games/excluido",
        }
    }

    /// Parse either naming scheme, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Channel::ALL
            .into_iter()
            .find(|c| c.name() == name || c.server_name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ChannelRouter
// ---------------------------------------------------------------------------

/// Outcome of routing one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The store changed for this match.
    Applied(MatchId),
    /// A delete for a match the store does not hold.
    Unchanged(MatchId),
    /// The payload was malformed and has been dropped.
    Dropped,
}

/// Callback for transport-level errors, per channel.
pub type ErrorHandler = Box<dyn FnMut(Channel, &str) + Send>;

/// Routes channel payloads into the match store.
pub struct ChannelRouter {
    store: MatchStore,
    /// Wall-clock instant of the last tick, used for display.
    clock: DateTime<Utc>,
    on_error: Option<ErrorHandler>,
}

impl ChannelRouter {
    pub fn new(now: DateTime<Utc>) -> Self {
        ChannelRouter {
            store: MatchStore::new(),
            clock: now,
            on_error: None,
        }
    }

    /// Install a callback for transport errors.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(Channel, &str) + Send + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Normalize `raw` and apply it as an event on `channel`.
    pub fn dispatch(&mut self, channel: Channel, raw: &str, now: DateTime<Utc>) -> Dispatch {
        let update = match update::parse(raw) {
            Ok(update) => update,
            Err(e) => {
                warn!("[{}] dropping invalid payload: {} ({:?})", channel, e, raw);
                return Dispatch::Dropped;
            }
        };
        debug!(%channel, id = %update.id, status = ?update.reported_status, "event received");
        self.apply(channel, &update, now)
    }

    /// Apply an already normalized update.
    pub fn apply(&mut self, channel: Channel, update: &MatchUpdate, now: DateTime<Utc>) -> Dispatch {
        match channel {
            Channel::New => self.store.receive_new(update),
            Channel::Start => self.store.start(update, now),
            Channel::Score => self.store.update_score(update, now),
            Channel::Finish => self.store.finish(update, now),
            Channel::Deleted => {
                if self.store.remove(&update.id).is_none() {
                    debug!("[{}] no match {} to remove", channel, update.id);
                    return Dispatch::Unchanged(update.id.clone());
                }
            }
        }
        Dispatch::Applied(update.id.clone())
    }

    /// Advance the display clock. Touches no match state.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.clock = now;
    }

    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    /// Report a transport error on `channel` to the installed callback.
    pub fn transport_error(&mut self, channel: Channel, message: &str) {
        warn!("[{}] transport error: {}", channel, message);
        if let Some(handler) = self.on_error.as_mut() {
            handler(channel, message);
        }
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    /// The match clock as of the last tick.
    pub fn elapsed_seconds(&self, record: &Match) -> u64 {
        self.store.tracker().elapsed_seconds(record, self.clock)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
