// Keyboard input handling.
//
// Translates crossterm key events into `UserCommand`s for the app
// orchestrator, or into local `ViewState` changes (focus, selection).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ViewState;
use crate::protocol::UserCommand;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator, `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows reports both press and release.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    match key_event.code {
        KeyCode::Char('q') => Some(UserCommand::Quit),
        KeyCode::Tab => {
            view_state.focus = view_state.focus.next();
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.move_selection(-1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_state.move_selection(1);
            None
        }
        KeyCode::Enter | KeyCode::Char('l') => view_state
            .selected_row()
            .map(|row| UserCommand::OpenLog(row.id.clone())),
        KeyCode::Esc => view_state.log.is_open().then_some(UserCommand::CloseLog),
        _ => None,
    }
}
