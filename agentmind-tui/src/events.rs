//! Event types for the TUI event loop.

use agentmind_client::SpeechEvent;
use crossterm::event::KeyEvent;

/// Input to the UI loop from the terminal and background tasks.
///
/// Session completions travel on the session's own channel.
#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    Speech(SpeechEvent),
    Health(bool),
}
