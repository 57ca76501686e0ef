// Integration tests: the app loop driven through its channels, the way the
// feed tasks and the TUI drive it at runtime.

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use placar::app::{self, AppState};
use placar::config::{parse_config, Config};
use placar::logs::{LogFetchError, LogResult, LogSource};
use placar::protocol::{ConnectionStatus, FeedEvent, LogView, Snapshot, UiUpdate, UserCommand};
use placar_core::log_entry::LogEntry;
use placar_core::{Channel, MatchId};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Milliseconds added to the test clock's base instant.
static CLOCK_OFFSET_MS: AtomicI64 = AtomicI64::new(0);

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 13, 15, 0, 0).unwrap()
}

fn static_clock() -> DateTime<Utc> {
    base_time()
}

fn moving_clock() -> DateTime<Utc> {
    base_time() + Duration::milliseconds(CLOCK_OFFSET_MS.load(Ordering::SeqCst))
}

struct ServerLogs;

#[async_trait]
impl LogSource for ServerLogs {
    async fn fetch(&self, id: &MatchId) -> Result<Vec<LogEntry>, LogFetchError> {
        let raw = json!([
            {"id": 1, "descricao": "Partida iniciada", "operacao": "INICIO", "minutoPartida": 0},
            {"id": 2, "descricao": format!("Gol na partida {id}"), "operacao": "GOL", "minutoPartida": 37}
        ]);
        serde_json::from_value(raw).map_err(|e| LogFetchError::Decode(e.to_string()))
    }
}

fn config() -> Config {
    parse_config(
        "[server]\nbase_url = \"http://localhost:8585/consumer/api\"\n",
        Path::new("placar.toml"),
    )
    .unwrap()
}

struct Harness {
    feed_tx: mpsc::Sender<FeedEvent>,
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    handle: JoinHandle<anyhow::Result<()>>,
}

fn start(clock: app::Clock) -> Harness {
    let (feed_tx, feed_rx) = mpsc::channel(64);
    let (log_tx, log_rx) = mpsc::channel::<LogResult>(4);
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (ui_tx, ui_rx) = mpsc::channel(64);
    let state = AppState::with_clock(config(), Arc::new(ServerLogs), log_tx, clock);
    let handle = tokio::spawn(app::run(feed_rx, log_rx, cmd_rx, ui_tx, state));
    Harness {
        feed_tx,
        cmd_tx,
        ui_rx,
        handle,
    }
}

impl Harness {
    async fn send(&self, channel: Channel, payload: serde_json::Value) {
        self.feed_tx
            .send(FeedEvent::Payload {
                channel,
                data: payload.to_string(),
            })
            .await
            .unwrap();
    }

    async fn next_snapshot(&mut self) -> Snapshot {
        loop {
            match self.ui_rx.recv().await.expect("app loop ended") {
                UiUpdate::Snapshot(snap) => return *snap,
                UiUpdate::Log(_) => continue,
            }
        }
    }

    async fn next_log(&mut self) -> LogView {
        loop {
            match self.ui_rx.recv().await.expect("app loop ended") {
                UiUpdate::Log(view) => return view,
                UiUpdate::Snapshot(_) => continue,
            }
        }
    }

    async fn quit(self) {
        self.cmd_tx.send(UserCommand::Quit).await.unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn match_moves_through_the_three_lists() {
    let mut h = start(static_clock);
    assert_eq!(h.next_snapshot().await, Snapshot {
        channels: Channel::ALL
            .into_iter()
            .map(|c| (c, ConnectionStatus::Connecting))
            .collect(),
        ..Snapshot::default()
    });

    h.feed_tx.send(FeedEvent::Connected(Channel::New)).await.unwrap();
    let snap = h.next_snapshot().await;
    assert_eq!(snap.channels[0], (Channel::New, ConnectionStatus::Connected));

    h.send(Channel::New, json!({"id": 21, "timeA": "Grêmio", "timeB": "Inter"})).await;
    let snap = h.next_snapshot().await;
    assert_eq!(snap.not_started.len(), 1);
    assert_eq!(snap.not_started[0].team_a, "Grêmio");

    h.send(Channel::Start, json!({"id": "21", "tempoDeJogo": 5})).await;
    let snap = h.next_snapshot().await;
    assert!(snap.not_started.is_empty());
    assert_eq!(snap.in_progress[0].clock, "05:00");

    h.send(Channel::Score, json!({"id": 21, "placarA": 2, "placarB": 1})).await;
    let snap = h.next_snapshot().await;
    assert_eq!((snap.in_progress[0].score_a, snap.in_progress[0].score_b), (2, 1));
    assert_eq!(snap.in_progress[0].team_b, "Inter");

    h.send(Channel::Finish, json!({"id": 21, "tempoDeJogo": 93})).await;
    let snap = h.next_snapshot().await;
    assert!(snap.in_progress.is_empty());
    assert_eq!(snap.finished[0].clock, "93:00");

    h.send(Channel::Deleted, json!({"id": 21})).await;
    let snap = h.next_snapshot().await;
    assert!(snap.finished.is_empty());

    h.quit().await;
}

#[tokio::test]
async fn bad_payload_and_transport_error_leave_matches_alone() {
    let mut h = start(static_clock);
    h.next_snapshot().await;

    h.send(Channel::New, json!({"id": 1})).await;
    let before = h.next_snapshot().await;

    h.feed_tx
        .send(FeedEvent::Payload {
            channel: Channel::Score,
            data: "{not json".into(),
        })
        .await
        .unwrap();
    h.feed_tx
        .send(FeedEvent::Error {
            channel: Channel::Finish,
            message: "server returned status 502 Bad Gateway".into(),
        })
        .await
        .unwrap();

    // Only the error shows up: channel status and message, same matches.
    let after = h.next_snapshot().await;
    assert_eq!(after.not_started, before.not_started);
    assert_eq!(after.channels[3], (Channel::Finish, ConnectionStatus::Disconnected));
    assert_eq!(
        after.last_error.as_deref(),
        Some("finish: server returned status 502 Bad Gateway")
    );

    h.quit().await;
}

#[tokio::test]
async fn log_panel_opens_and_closes() {
    let mut h = start(static_clock);
    h.next_snapshot().await;

    let id = MatchId::new("21").unwrap();
    h.cmd_tx.send(UserCommand::OpenLog(id.clone())).await.unwrap();
    assert_eq!(h.next_log().await, LogView::Loading(id.clone()));
    match h.next_log().await {
        LogView::Loaded { id: loaded, lines } => {
            assert_eq!(loaded, id);
            assert_eq!(lines.len(), 2);
            assert!(lines[1].contains("GOL"));
            assert!(lines[1].contains("Gol na partida 21"));
        }
        other => panic!("unexpected log view: {other:?}"),
    }

    h.cmd_tx.send(UserCommand::CloseLog).await.unwrap();
    assert_eq!(h.next_log().await, LogView::Closed);

    h.quit().await;
}

#[tokio::test(start_paused = true)]
async fn tick_refreshes_running_clocks() {
    CLOCK_OFFSET_MS.store(0, Ordering::SeqCst);
    let mut h = start(moving_clock);
    h.next_snapshot().await;

    h.send(Channel::Start, json!({"id": 7, "tempoDeJogo": 5})).await;
    assert_eq!(h.next_snapshot().await.in_progress[0].clock, "05:00");

    CLOCK_OFFSET_MS.store(3_000, Ordering::SeqCst);
    // The paused runtime auto-advances to the next tick.
    assert_eq!(h.next_snapshot().await.in_progress[0].clock, "05:03");

    h.quit().await;
}

#[tokio::test]
async fn closed_feed_keeps_the_dashboard_running() {
    let mut h = start(static_clock);
    h.next_snapshot().await;
    h.send(Channel::New, json!({"id": 5})).await;
    h.next_snapshot().await;

    h.feed_tx.send(FeedEvent::Closed(Channel::New)).await.unwrap();
    let snap = h.next_snapshot().await;
    assert_eq!(snap.channels[0], (Channel::New, ConnectionStatus::Disconnected));
    assert_eq!(snap.not_started.len(), 1);

    // Dropping the last sender closes the feed channel.
    h.feed_tx = mpsc::channel(1).0;
    tokio::task::yield_now().await;
    assert!(!h.handle.is_finished());
    h.quit().await;
}
