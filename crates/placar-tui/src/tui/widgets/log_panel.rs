// Log panel widget: event log of the selected match.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::protocol::LogView;

pub fn render(frame: &mut Frame, area: Rect, log: &LogView) {
    let (title, lines, style) = match log {
        LogView::Closed => return,
        LogView::Loading(id) => (
            format!("Log: match {id}"),
            vec![Line::from("  Loading...")],
            Style::default().fg(Color::DarkGray),
        ),
        LogView::Loaded { id, lines } if lines.is_empty() => (
            format!("Log: match {id}"),
            vec![Line::from("  No log entries.")],
            Style::default().fg(Color::DarkGray),
        ),
        LogView::Loaded { id, lines } => (
            format!("Log: match {id} ({})", lines.len()),
            lines.iter().map(|l| Line::from(l.as_str())).collect(),
            Style::default().fg(Color::White),
        ),
        LogView::Failed { id, message } => (
            format!("Log: match {id}"),
            vec![Line::from(format!("  Could not load log: {message}"))],
            Style::default().fg(Color::Red),
        ),
    };

    let paragraph = Paragraph::new(lines)
        .style(style)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        );
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use placar_core::MatchId;

    fn draw(log: &LogView) -> String {
        let backend = ratatui::backend::TestBackend::new(70, 6);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), log))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
        }
        out
    }

    #[test]
    fn renders_each_state() {
        let id = MatchId::new("9").unwrap();
        assert!(draw(&LogView::Loading(id.clone())).contains("Loading..."));
        assert!(draw(&LogView::Loaded { id: id.clone(), lines: vec![] }).contains("No log entries."));

        let loaded = draw(&LogView::Loaded {
            id: id.clone(),
            lines: vec!["  37' GOL          Gol do Santos  -".into()],
        });
        assert!(loaded.contains("Log: match 9 (1)"));
        assert!(loaded.contains("Gol do Santos"));

        let failed = draw(&LogView::Failed {
            id,
            message: "server returned status 500".into(),
        });
        assert!(failed.contains("Could not load log: server returned status 500"));
    }

    #[test]
    fn closed_draws_nothing() {
        assert!(draw(&LogView::Closed).trim().is_empty());
    }
}
