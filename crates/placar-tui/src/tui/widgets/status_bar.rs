// Status bar widget: per-channel connection dots and match counts.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::ConnectionStatus;
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [● new ● start ● score ● finish ● deleted] [counts] [last error]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snap = &state.snapshot;
    let mut spans = vec![Span::raw(" ")];

    for (channel, status) in &snap.channels {
        let (dot, color) = connection_indicator(*status);
        spans.push(Span::styled(dot, Style::default().fg(color)));
        spans.push(Span::styled(
            format!(" {} ", channel),
            Style::default().fg(Color::White),
        ));
    }

    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
    spans.push(Span::styled(
        format!(
            "{} upcoming, {} live, {} finished",
            snap.not_started.len(),
            snap.in_progress.len(),
            snap.finished.len()
        ),
        Style::default().fg(Color::White),
    ));

    if let Some(err) = &snap.last_error {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(err.clone(), Style::default().fg(Color::Red)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the connection dot character and its color.
pub fn connection_indicator(status: ConnectionStatus) -> (&'static str, Color) {
    match status {
        ConnectionStatus::Connecting => ("●", Color::Yellow),
        ConnectionStatus::Connected => ("●", Color::Green),
        ConnectionStatus::Disconnected => ("●", Color::Red),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Snapshot;
    use placar_core::Channel;

    fn line_text(buffer: &ratatui::buffer::Buffer) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, 0)].symbol().to_string())
            .collect()
    }

    #[test]
    fn indicator_colors() {
        assert_eq!(connection_indicator(ConnectionStatus::Connected).1, Color::Green);
        assert_eq!(connection_indicator(ConnectionStatus::Connecting).1, Color::Yellow);
        assert_eq!(connection_indicator(ConnectionStatus::Disconnected).1, Color::Red);
    }

    #[test]
    fn shows_channels_counts_and_error() {
        let backend = ratatui::backend::TestBackend::new(140, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState {
            snapshot: Snapshot {
                channels: vec![
                    (Channel::New, ConnectionStatus::Connected),
                    (Channel::Score, ConnectionStatus::Disconnected),
                ],
                last_error: Some("score: network error".into()),
                ..Snapshot::default()
            },
            ..ViewState::default()
        };
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();

        let text = line_text(terminal.backend().buffer());
        assert!(text.contains("new"));
        assert!(text.contains("score"));
        assert!(text.contains("0 upcoming, 0 live, 0 finished"));
        assert!(text.contains("score: network error"));
    }
}
