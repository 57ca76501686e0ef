// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +----------------+----------------+----------------+
// | Not started    | In progress    | Finished       |
// |                |                |                |
// +----------------+----------------+----------------+
// | Log panel (40%, only while open)                  |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    pub status_bar: Rect,
    /// Match lists, left to right: not started, in progress, finished.
    pub columns: [Rect; 3],
    pub log_panel: Option<Rect>,
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect, log_open: bool) -> AppLayout {
    let middle_constraints: &[Constraint] = if log_open {
        &[Constraint::Percentage(60), Constraint::Percentage(40)]
    } else {
        &[Constraint::Percentage(100)]
    };

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(3),    // lists (+ log)
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints(middle_constraints)
        .split(vertical[1]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(middle[0]);

    AppLayout {
        status_bar: vertical[0],
        columns: [columns[0], columns[1], columns[2]],
        log_panel: middle.get(1).copied(),
        help_bar: vertical[2],
    }
}
