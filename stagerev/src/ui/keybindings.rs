//! Keybinding dispatcher for stagerev.
//!
//! Translates crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue or quit. Quit chords
//! work in every phase; navigation and scrolling only in `Content`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{AppState, Phase};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Dispatches one key press.
///
/// | Key | Action |
/// |-----|--------|
/// | `q`, `Ctrl+C` | quit |
/// | `Up`, `k` | previous file |
/// | `Down`, `j` | next file |
/// | `Ctrl+D`, `PageDown` | scroll review down half a page |
/// | `Ctrl+U`, `PageUp` | scroll review up half a page |
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Char('q') if !ctrl => return KeyAction::Quit,
        _ => {}
    }

    if state.phase != Phase::Content {
        return KeyAction::Continue;
    }

    match key.code {
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::PageDown => state.half_page_down(),
        KeyCode::PageUp => state.half_page_up(),
        KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => state.select_next(),
        _ => {}
    }
    KeyAction::Continue
}
