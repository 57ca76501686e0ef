// Match list widget: one column of the dashboard.
//
// Each row: "{clock} {team A} {a}-{b} {team B}  {start time}"

use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use ratatui::Frame;

use crate::protocol::MatchRow;
use crate::tui::{Column, ViewState};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, column: Column) {
    let focused = state.focus == column;
    let focus_border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let rows = state.rows(column);
    let title = format!("{} ({})", column.title(), rows.len());

    if rows.is_empty() {
        let paragraph = Paragraph::new("  No matches.")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(focus_border)
                    .title(title),
            );
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_rows = (area.height as usize).saturating_sub(2).max(1);
    let selected = state.selected(column);
    let offset = scroll_offset(selected, visible_rows, rows.len());

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
        .map(|(i, row)| {
            let mut style = Style::default().fg(clock_color(column));
            if focused && i == selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(Span::styled(format_row(row), style)))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_border)
            .title(title),
    );
    frame.render_widget(list, area);

    if rows.len() > visible_rows {
        let mut scrollbar_state =
            ScrollbarState::new(rows.len().saturating_sub(visible_rows)).position(offset);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin { vertical: 1, horizontal: 0 }),
            &mut scrollbar_state,
        );
    }
}

pub fn format_row(row: &MatchRow) -> String {
    let clock = if row.clock.is_empty() {
        String::new()
    } else {
        format!("{} ", row.clock)
    };
    format!(
        "{}{} {}-{} {}  {}",
        clock, row.team_a, row.score_a, row.score_b, row.team_b, row.started
    )
}

/// First visible row so that `selected` stays on screen.
fn scroll_offset(selected: usize, visible_rows: usize, total: usize) -> usize {
    let max_offset = total.saturating_sub(visible_rows);
    (selected + 1).saturating_sub(visible_rows).min(max_offset)
}

fn clock_color(column: Column) -> Color {
    match column {
        Column::NotStarted => Color::White,
        Column::InProgress => Color::Green,
        Column::Finished => Color::Gray,
    }
}
