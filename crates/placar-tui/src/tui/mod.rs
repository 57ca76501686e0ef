// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the latest snapshot and log panel
// state pushed by the app orchestrator. Updates arrive over an mpsc channel
// and the frame is redrawn at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use placar_core::format::status_label;
use placar_core::MatchStatus;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::protocol::{LogView, MatchRow, Snapshot, UiUpdate, UserCommand};

use layout::build_layout;

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// One of the three match lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Column {
    NotStarted,
    #[default]
    InProgress,
    Finished,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::NotStarted, Column::InProgress, Column::Finished];

    pub fn status(self) -> MatchStatus {
        match self {
            Column::NotStarted => MatchStatus::NotStarted,
            Column::InProgress => MatchStatus::InProgress,
            Column::Finished => MatchStatus::Finished,
        }
    }

    pub fn title(self) -> &'static str {
        status_label(self.status())
    }

    pub fn next(self) -> Column {
        match self {
            Column::NotStarted => Column::InProgress,
            Column::InProgress => Column::Finished,
            Column::Finished => Column::NotStarted,
        }
    }

    fn index(self) -> usize {
        match self {
            Column::NotStarted => 0,
            Column::InProgress => 1,
            Column::Finished => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state read by `render_frame`.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub snapshot: Snapshot,
    pub log: LogView,
    pub focus: Column,
    /// Selected row per column, indexed like `Column::ALL`.
    pub selection: [usize; 3],
}

impl ViewState {
    pub fn rows(&self, column: Column) -> &[MatchRow] {
        match column {
            Column::NotStarted => &self.snapshot.not_started,
            Column::InProgress => &self.snapshot.in_progress,
            Column::Finished => &self.snapshot.finished,
        }
    }

    pub fn selected(&self, column: Column) -> usize {
        self.selection[column.index()]
    }

    pub fn selected_row(&self) -> Option<&MatchRow> {
        self.rows(self.focus).get(self.selected(self.focus))
    }

    /// Move the selection in the focused column by `delta`, clamped.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.rows(self.focus).len();
        let slot = &mut self.selection[self.focus.index()];
        if len == 0 {
            *slot = 0;
            return;
        }
        *slot = slot.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_selection(&mut self) {
        for column in Column::ALL {
            let len = self.rows(column).len();
            let slot = &mut self.selection[column.index()];
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }
}

/// Apply an update from the app orchestrator.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            state.snapshot = *snapshot;
            state.clamp_selection();
        }
        UiUpdate::Log(log) => state.log = log,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area(), state.log.is_open());

    widgets::status_bar::render(frame, layout.status_bar, state);
    for (column, area) in Column::ALL.into_iter().zip(layout.columns) {
        widgets::match_list::render(frame, area, state, column);
    }
    if let Some(area) = layout.log_panel {
        widgets::log_panel::render(frame, area, &state.log);
    }

    let text = if state.log.is_open() {
        " q:Quit | Tab:Column | j/k:Move | Enter:Log | Esc:Close log"
    } else {
        " q:Quit | Tab:Column | j/k:Move | Enter:Log"
    };
    let help = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(help, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the dashboard until the user quits or the app side goes away.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Restore the terminal before the default hook prints the panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(update) => apply_ui_update(&mut view_state, update),
                    // App is shutting down.
                    None => break Ok(()),
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(anyhow::Error::new(e).context("terminal input error")),
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(anyhow::Error::new(e).context("failed to draw frame"));
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
