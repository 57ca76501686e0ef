// Application orchestrator: owns the router, consumes feed events, log
// results and user commands, and pushes snapshots to the TUI.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use placar_core::format::{format_elapsed, format_stamp};
use placar_core::{Channel, ChannelRouter, Dispatch, Match, MatchId, MatchStatus};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::logs::{LogResult, LogSource};
use crate::protocol::{
    ConnectionStatus, FeedEvent, LogView, MatchRow, Snapshot, UiUpdate, UserCommand,
};

/// Source of wall-clock time. Replaced in tests.
pub type Clock = fn() -> DateTime<Utc>;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    pub router: ChannelRouter,
    /// Connection status per channel, in `Channel::ALL` order.
    pub channels: Vec<(Channel, ConnectionStatus)>,
    pub log_view: LogView,
    /// Last transport error reported through the router's error callback.
    last_error: Arc<Mutex<Option<String>>>,
    log_source: Arc<dyn LogSource>,
    log_tx: mpsc::Sender<LogResult>,
    log_task: Option<JoinHandle<()>>,
    /// Bumped on every open/close so late results can be recognised.
    log_generation: u64,
    last_snapshot: Option<Snapshot>,
    clock: Clock,
}

impl AppState {
    pub fn new(
        config: Config,
        log_source: Arc<dyn LogSource>,
        log_tx: mpsc::Sender<LogResult>,
    ) -> Self {
        Self::with_clock(config, log_source, log_tx, Utc::now)
    }

    pub fn with_clock(
        config: Config,
        log_source: Arc<dyn LogSource>,
        log_tx: mpsc::Sender<LogResult>,
        clock: Clock,
    ) -> Self {
        let last_error = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&last_error);
        let router = ChannelRouter::new(clock()).with_error_handler(move |channel, message| {
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(format!("{channel}: {message}"));
            }
        });
        AppState {
            config,
            router,
            channels: Channel::ALL
                .into_iter()
                .map(|c| (c, ConnectionStatus::Connecting))
                .collect(),
            log_view: LogView::Closed,
            last_error,
            log_source,
            log_tx,
            log_task: None,
            log_generation: 0,
            last_snapshot: None,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn channel_status(&self, channel: Channel) -> ConnectionStatus {
        self.channels
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }

    fn set_channel_status(&mut self, channel: Channel, status: ConnectionStatus) {
        if let Some(entry) = self.channels.iter_mut().find(|(c, _)| *c == channel) {
            entry.1 = status;
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }

    /// Build the dashboard view from the store as of the router's clock.
    pub fn build_snapshot(&self) -> Snapshot {
        let store = self.router.store();
        let rows = |status: MatchStatus| -> Vec<MatchRow> {
            store.view(status).map(|m| self.match_row(m)).collect()
        };
        Snapshot {
            not_started: rows(MatchStatus::NotStarted),
            in_progress: rows(MatchStatus::InProgress),
            finished: rows(MatchStatus::Finished),
            channels: self.channels.clone(),
            last_error: self.last_error(),
        }
    }

    fn match_row(&self, m: &Match) -> MatchRow {
        let clock = if m.status == MatchStatus::NotStarted {
            String::new()
        } else {
            format_elapsed(self.router.elapsed_seconds(m))
        };
        MatchRow {
            id: m.id.clone(),
            team_a: m.team_a.clone(),
            team_b: m.team_b.clone(),
            score_a: m.score_a,
            score_b: m.score_b,
            status: m.status,
            started: format_stamp(m.started_at, &self.config.display.date_format),
            clock,
        }
    }

    /// Start fetching the log of `id`, replacing any open log.
    pub fn open_log(&mut self, id: MatchId) {
        self.abort_log_task();
        self.log_generation += 1;
        let generation = self.log_generation;
        self.log_view = LogView::Loading(id.clone());

        let source = Arc::clone(&self.log_source);
        let tx = self.log_tx.clone();
        info!("fetching log for match {}", id);
        self.log_task = Some(tokio::spawn(async move {
            let result = source.fetch(&id).await;
            let _ = tx.send(LogResult { id, generation, result }).await;
        }));
    }

    /// Close the log panel and drop its entries.
    pub fn close_log(&mut self) {
        self.abort_log_task();
        self.log_generation += 1;
        self.log_view = LogView::Closed;
    }

    fn abort_log_task(&mut self) {
        if let Some(handle) = self.log_task.take() {
            handle.abort();
        }
    }

    /// Apply a finished fetch. Returns false when the result is stale.
    pub fn handle_log_result(&mut self, result: LogResult) -> bool {
        let current = matches!(&self.log_view, LogView::Loading(id) if *id == result.id);
        if !current || result.generation != self.log_generation {
            debug!("ignoring stale log result for {}", result.id);
            return false;
        }
        self.log_task = None;
        self.log_view = match result.result {
            Ok(entries) => {
                let format = &self.config.display.date_format;
                LogView::Loaded {
                    id: result.id,
                    lines: entries.iter().map(|e| e.display_line(format)).collect(),
                }
            }
            Err(e) => {
                warn!("log fetch for {} failed: {}", result.id, e);
                LogView::Failed {
                    id: result.id,
                    message: e.to_string(),
                }
            }
        };
        true
    }

    /// Apply one feed event to the router and channel status.
    pub fn handle_feed_event(&mut self, event: FeedEvent) {
        let now = self.now();
        match event {
            FeedEvent::Connected(channel) => {
                self.set_channel_status(channel, ConnectionStatus::Connected);
            }
            FeedEvent::Payload { channel, data } => {
                self.router.tick(now);
                if let Dispatch::Applied(id) = self.router.dispatch(channel, &data, now) {
                    debug!("[{}] applied update for {}", channel, id);
                }
            }
            FeedEvent::Error { channel, message } => {
                self.set_channel_status(channel, ConnectionStatus::Disconnected);
                self.router.transport_error(channel, &message);
            }
            FeedEvent::Closed(channel) => {
                info!("[{}] channel closed", channel);
                self.set_channel_status(channel, ConnectionStatus::Disconnected);
            }
        }
    }

    fn has_running_matches(&self) -> bool {
        self.router.store().in_progress().next().is_some()
    }

    /// Send a snapshot if anything visible changed since the last one.
    async fn push_snapshot(&mut self, ui_tx: &mpsc::Sender<UiUpdate>) {
        let snapshot = self.build_snapshot();
        if self.last_snapshot.as_ref() == Some(&snapshot) {
            return;
        }
        self.last_snapshot = Some(snapshot.clone());
        let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
    }

    async fn push_log(&mut self, ui_tx: &mpsc::Sender<UiUpdate>) {
        let _ = ui_tx.send(UiUpdate::Log(self.log_view.clone())).await;
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.abort_log_task();
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the orchestrator until a quit command arrives or the TUI goes away.
///
/// Selects over feed events, log results, user commands and the display
/// tick. A closed feed channel only stops polling it; the dashboard keeps
/// showing the last known state.
pub async fn run(
    mut feed_rx: mpsc::Receiver<FeedEvent>,
    mut log_rx: mpsc::Receiver<LogResult>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let mut feed_open = true;
    let mut tick = tokio::time::interval(state.config.tick_interval());
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately.
    tick.tick().await;

    let now = state.now();
    state.router.tick(now);
    state.push_snapshot(&ui_tx).await;

    loop {
        tokio::select! {
            event = feed_rx.recv(), if feed_open => {
                match event {
                    Some(event) => {
                        state.handle_feed_event(event);
                        state.push_snapshot(&ui_tx).await;
                    }
                    None => {
                        info!("Feed channel closed");
                        feed_open = false;
                    }
                }
            }

            Some(result) = log_rx.recv() => {
                if state.handle_log_result(result) {
                    state.push_log(&ui_tx).await;
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(UserCommand::OpenLog(id)) => {
                        state.open_log(id);
                        state.push_log(&ui_tx).await;
                    }
                    Some(UserCommand::CloseLog) => {
                        state.close_log();
                        state.push_log(&ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            _ = tick.tick() => {
                let now = state.now();
                state.router.tick(now);
                if state.has_running_matches() {
                    state.push_snapshot(&ui_tx).await;
                }
            }
        }
    }

    state.close_log();
    info!("Application event loop finished");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::logs::LogFetchError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use placar_core::log_entry::LogEntry;
    use placar_core::Stamp;
    use std::path::Path;

    struct FakeLogs;

    #[async_trait]
    impl LogSource for FakeLogs {
        async fn fetch(&self, id: &MatchId) -> Result<Vec<LogEntry>, LogFetchError> {
            if id.as_str() == "404" {
                return Err(LogFetchError::Status(404));
            }
            Ok(vec![LogEntry {
                id: "1".into(),
                description: format!("log of {id}"),
                operation: "GOL".into(),
                match_minute: Some(12),
                timestamp: Stamp::Missing,
            }])
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 13, 10, 0, 0).unwrap()
    }

    fn test_config() -> Config {
        parse_config(
            "[server]\nbase_url = \"http://localhost:8585/consumer/api\"\n",
            Path::new("placar.toml"),
        )
        .unwrap()
    }

    fn state() -> (AppState, mpsc::Receiver<LogResult>) {
        let (log_tx, log_rx) = mpsc::channel(4);
        let state = AppState::with_clock(test_config(), Arc::new(FakeLogs), log_tx, fixed_now);
        (state, log_rx)
    }

    fn id(s: &str) -> MatchId {
        MatchId::new(s).unwrap()
    }

    fn payload(channel: Channel, data: &str) -> FeedEvent {
        FeedEvent::Payload {
            channel,
            data: data.to_string(),
        }
    }

    #[tokio::test]
    async fn payloads_flow_into_snapshot_views() {
        let (mut state, _log_rx) = state();
        state.handle_feed_event(payload(Channel::New, r#"{"id": 7, "timeA": "Santos", "timeB": "Vasco"}"#));
        state.handle_feed_event(payload(Channel::New, r#"{"id": 8}"#));
        state.handle_feed_event(payload(Channel::Start, r#"{"id": "7", "tempoDeJogo": 5}"#));

        let snap = state.build_snapshot();
        assert_eq!(snap.not_started.len(), 1);
        assert_eq!(snap.not_started[0].clock, "");
        assert_eq!(snap.in_progress.len(), 1);
        let row = &snap.in_progress[0];
        assert_eq!(row.team_a, "Santos");
        assert_eq!(row.clock, "05:00");
        assert_eq!(row.started, "-");
    }

    #[tokio::test]
    async fn malformed_payload_changes_nothing() {
        let (mut state, _log_rx) = state();
        state.handle_feed_event(payload(Channel::New, r#"{"id": 1}"#));
        let before = state.build_snapshot();
        state.handle_feed_event(payload(Channel::Score, "not json"));
        state.handle_feed_event(payload(Channel::Finish, r#"{"placarA": 1}"#));
        assert_eq!(state.build_snapshot(), before);
    }

    #[tokio::test]
    async fn channel_status_follows_feed_events() {
        let (mut state, _log_rx) = state();
        assert_eq!(state.channel_status(Channel::Score), ConnectionStatus::Connecting);

        state.handle_feed_event(FeedEvent::Connected(Channel::Score));
        assert_eq!(state.channel_status(Channel::Score), ConnectionStatus::Connected);

        state.handle_feed_event(FeedEvent::Error {
            channel: Channel::Score,
            message: "network error: reset".into(),
        });
        assert_eq!(state.channel_status(Channel::Score), ConnectionStatus::Disconnected);
        assert_eq!(state.channel_status(Channel::New), ConnectionStatus::Connecting);
        assert_eq!(state.last_error().as_deref(), Some("score: network error: reset"));

        state.handle_feed_event(FeedEvent::Connected(Channel::Score));
        assert_eq!(state.channel_status(Channel::Score), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn log_fetch_loads_lines() {
        let (mut state, mut log_rx) = state();
        state.open_log(id("7"));
        assert_eq!(state.log_view, LogView::Loading(id("7")));

        let result = log_rx.recv().await.unwrap();
        assert!(state.handle_log_result(result));
        match &state.log_view {
            LogView::Loaded { id: loaded, lines } => {
                assert_eq!(loaded.as_str(), "7");
                assert_eq!(lines.len(), 1);
                assert!(lines[0].contains("log of 7"));
            }
            other => panic!("unexpected log view: {other:?}"),
        }
    }

    #[tokio::test]
    async fn log_fetch_error_becomes_message() {
        let (mut state, mut log_rx) = state();
        state.open_log(id("404"));
        let result = log_rx.recv().await.unwrap();
        assert!(state.handle_log_result(result));
        assert_eq!(
            state.log_view,
            LogView::Failed {
                id: id("404"),
                message: "server returned status 404".into()
            }
        );
    }

    #[tokio::test]
    async fn stale_log_results_are_ignored() {
        let (mut state, _log_rx) = state();
        state.open_log(id("7"));
        let stale_generation = state.log_generation;
        state.open_log(id("8"));

        let late = LogResult {
            id: id("7"),
            generation: stale_generation,
            result: Ok(vec![]),
        };
        assert!(!state.handle_log_result(late));
        assert_eq!(state.log_view, LogView::Loading(id("8")));

        state.close_log();
        let after_close = LogResult {
            id: id("8"),
            generation: state.log_generation,
            result: Ok(vec![]),
        };
        assert!(!state.handle_log_result(after_close));
        assert_eq!(state.log_view, LogView::Closed);
    }

    #[tokio::test]
    async fn run_pushes_snapshots_and_quits() {
        let (log_tx, log_rx) = mpsc::channel(4);
        let state = AppState::with_clock(test_config(), Arc::new(FakeLogs), log_tx, fixed_now);
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        let handle = tokio::spawn(run(feed_rx, log_rx, cmd_rx, ui_tx, state));

        // Initial empty snapshot.
        match ui_rx.recv().await.unwrap() {
            UiUpdate::Snapshot(snap) => assert!(snap.not_started.is_empty()),
            other => panic!("unexpected update: {other:?}"),
        }

        feed_tx.send(payload(Channel::New, r#"{"id": 3}"#)).await.unwrap();
        match ui_rx.recv().await.unwrap() {
            UiUpdate::Snapshot(snap) => assert_eq!(snap.not_started[0].id.as_str(), "3"),
            other => panic!("unexpected update: {other:?}"),
        }

        // Closing the feed does not stop the loop.
        drop(feed_tx);
        cmd_tx.send(UserCommand::OpenLog(id("3"))).await.unwrap();
        assert_eq!(
            ui_rx.recv().await.unwrap(),
            UiUpdate::Log(LogView::Loading(id("3")))
        );
        match ui_rx.recv().await.unwrap() {
            UiUpdate::Log(LogView::Loaded { id: loaded, .. }) => assert_eq!(loaded.as_str(), "3"),
            other => panic!("unexpected update: {other:?}"),
        }

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();
    }
}
