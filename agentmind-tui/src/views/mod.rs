//! View rendering dispatch.

pub mod analysis;
pub mod chat;
pub mod settings;

use crate::keys::InputMode;
use crate::nav::View;
use crate::state::App;
use crate::theme::{health_color, notification_color};
use crate::widgets::StatusIndicator;
use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active_view {
        View::Chat => chat::render(f, app, layout[1]),
        View::Analysis => analysis::render(f, app, layout[1]),
        View::Settings => settings::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(26),
            Constraint::Length(18),
        ])
        .split(area);

    let titles: Vec<Line> = View::all()
        .iter()
        .enumerate()
        .map(|(index, view)| Line::from(format!("F{} {}", index + 1, view.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active_view.index())
        .style(Style::default().fg(app.theme.text_dim))
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border))
                .title("AgentMind"),
        );
    f.render_widget(tabs, chunks[0]);

    StatusIndicator {
        title: "Health",
        status: app.health.label(),
        style: Style::default().fg(health_color(app.health, &app.theme)),
        border_style: Style::default().fg(app.theme.border),
    }
    .render(f, chunks[1]);

    let (voice, voice_color) = if app.listening {
        ("Listening", app.theme.secondary)
    } else if app.voice_supported() {
        ("F5 to talk", app.theme.text_dim)
    } else {
        ("Unavailable", app.theme.text_dim)
    };
    StatusIndicator {
        title: "Voice",
        status: voice,
        style: Style::default().fg(voice_color),
        border_style: Style::default().fg(app.theme.border),
    }
    .render(f, chunks[2]);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let now = Utc::now();
    let (text, style) = match app.notifications.last().filter(|n| !n.is_expired(now)) {
        Some(note) => (
            format!("{}: {}", note.level.label(), note.message),
            Style::default().fg(notification_color(note.level, &app.theme)),
        ),
        None => (
            help_text(app).to_string(),
            Style::default().fg(app.theme.text_dim),
        ),
    };
    let footer = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(style);
    f.render_widget(footer, area);
}

fn help_text(app: &App) -> &'static str {
    match (app.active_view, app.input_mode()) {
        (View::Chat, _) => "Enter send • Esc clear • Tab next view • F5 voice • Ctrl+C quit",
        (View::Settings, InputMode::Text) if app.settings_view.prompt_editor.is_some() => {
            "Enter apply • Alt+Enter new line • Esc cancel"
        }
        (View::Settings, InputMode::Text) => {
            "Tab/Shift+Tab field • Space cycle type/toggle required • Enter apply • Esc cancel"
        }
        (View::Settings, InputMode::Command) => {
            "j/k move • a add • e edit • d delete • p prompt • s save • r reset • Esc discard • q quit"
        }
        (View::Analysis, _) => "j/k select message • Tab next view • q quit",
    }
}

/// Rectangle of the given percentage size centered in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
