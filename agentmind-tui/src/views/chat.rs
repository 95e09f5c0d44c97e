//! Conversation log and input line.

use crate::state::App;
use crate::theme::sender_color;
use agentmind_core::ChatMessage;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const INPUT_PLACEHOLDER: &str = "Введіть ваш запит...";
const LISTENING_PLACEHOLDER: &str = "Прослуховування...";

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    render_log(f, app, chunks[0]);
    render_input(f, app, chunks[1]);
}

fn render_log(f: &mut Frame<'_>, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for message in app.session.log().messages() {
        lines.extend(message_lines(app, message));
        lines.push(Line::default());
    }
    if app.session.is_replying() {
        lines.push(Line::from(Span::styled(
            "AI is typing…",
            Style::default()
                .fg(app.theme.text_dim)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the newest rows in view.
    let inner_width = usize::from(area.width.saturating_sub(2));
    let visible = usize::from(area.height.saturating_sub(2));
    let scroll = scroll_offset(wrapped_height(&lines, inner_width), visible);

    let log = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title("Conversation")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(log, area);
}

/// Rows `lines` occupy once word-wrapped to `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: usize) -> usize {
    lines.iter().map(|line| wrapped_rows(line, width)).sum()
}

fn wrapped_rows(line: &Line<'_>, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
    let mut rows = 1;
    let mut column = 0;
    for word in text.split(' ') {
        let word_width = Span::raw(word).width();
        let needed = if column == 0 {
            word_width
        } else {
            column + 1 + word_width
        };
        if needed <= width {
            column = needed;
        } else if word_width <= width {
            rows += 1;
            column = word_width;
        } else {
            // Words wider than the row are split across rows.
            if column > 0 {
                rows += 1;
            }
            rows += (word_width - 1) / width;
            column = (word_width - 1) % width + 1;
        }
    }
    rows
}

fn scroll_offset(total_rows: usize, visible_rows: usize) -> u16 {
    u16::try_from(total_rows.saturating_sub(visible_rows)).unwrap_or(u16::MAX)
}

fn message_lines<'a>(app: &App, message: &'a ChatMessage) -> Vec<Line<'a>> {
    let label_style = Style::default()
        .fg(sender_color(message.sender, &app.theme))
        .add_modifier(Modifier::BOLD);

    let status = if app.session.is_analyzing(message.id) {
        Some(("analyzing…", app.theme.text_dim))
    } else {
        match &message.analysis {
            Some(analysis) if analysis.is_failure() => Some(("analysis failed", app.theme.error)),
            Some(_) => Some(("analyzed", app.theme.success)),
            None => None,
        }
    };

    let mut header = vec![Span::styled(message.sender.label(), label_style)];
    if let Some((text, color)) = status {
        header.push(Span::styled(
            format!("  [{}]", text),
            Style::default().fg(color),
        ));
    }

    let mut lines = vec![Line::from(header)];
    lines.extend(
        message
            .text
            .lines()
            .map(|line| Line::from(Span::styled(line, Style::default().fg(app.theme.text)))),
    );
    lines
}

fn render_input(f: &mut Frame<'_>, app: &App, area: Rect) {
    let replying = app.session.is_replying();
    let input = &app.chat_view.input;

    let (text, style) = if input.is_empty() {
        let placeholder = if app.listening {
            LISTENING_PLACEHOLDER
        } else {
            INPUT_PLACEHOLDER
        };
        (placeholder, Style::default().fg(app.theme.text_dim))
    } else {
        (input.as_str(), Style::default().fg(app.theme.text))
    };

    let (title, border) = if replying {
        ("Waiting for reply", app.theme.border)
    } else {
        ("Message", app.theme.border_focus)
    };

    let widget = Paragraph::new(text).style(style).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(widget, area);

    if !replying && !app.listening {
        let offset = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(offset)
            .min(area.right().saturating_sub(2));
        f.set_cursor(x, area.y + 1);
    }
}
