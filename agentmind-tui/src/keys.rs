//! Keybinding definitions for the TUI.
//!
//! Text mode routes printable keys into the focused buffer; command mode
//! maps them to actions.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Text,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextView,
    PrevView,
    SwitchView(usize),
    ToggleVoice,

    // Text mode
    Insert(char),
    Backspace,
    Newline,
    Submit,
    NextField,
    PrevField,

    // Command mode
    MoveUp,
    MoveDown,
    AddField,
    EditField,
    DeleteField,
    EditPrompt,
    Save,
    Reset,

    Cancel,
}

pub fn map_key(event: KeyEvent, mode: InputMode) -> Option<Action> {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = event;

    if kind == KeyEventKind::Release {
        return None;
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    match code {
        KeyCode::F(n @ 1..=3) => return Some(Action::SwitchView(usize::from(n - 1))),
        KeyCode::F(5) => return Some(Action::ToggleVoice),
        KeyCode::Esc => return Some(Action::Cancel),
        _ => {}
    }

    match mode {
        InputMode::Text => map_text_key(code, modifiers),
        InputMode::Command => map_command_key(code),
    }
}

fn map_text_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    match code {
        KeyCode::Enter if modifiers.contains(KeyModifiers::ALT) => Some(Action::Newline),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Tab => Some(Action::NextField),
        KeyCode::BackTab => Some(Action::PrevField),
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::ALT) => Some(Action::Insert(c)),
        _ => None,
    }
}

fn map_command_key(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextView),
        KeyCode::BackTab => Some(Action::PrevView),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Char('a') => Some(Action::AddField),
        KeyCode::Char('e') | KeyCode::Enter => Some(Action::EditField),
        KeyCode::Char('d') => Some(Action::DeleteField),
        KeyCode::Char('p') => Some(Action::EditPrompt),
        KeyCode::Char('s') => Some(Action::Save),
        KeyCode::Char('r') => Some(Action::Reset),
        KeyCode::Char(c @ '1'..='3') => Some(Action::SwitchView(c as usize - '1' as usize)),
        _ => None,
    }
}
