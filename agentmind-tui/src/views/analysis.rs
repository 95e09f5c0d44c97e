//! Analyzed messages with their extraction results.

use crate::state::App;
use crate::theme::{analysis_color, sender_color};
use crate::widgets::DetailPanel;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const PREVIEW_CHARS: usize = 40;

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let analyzed: Vec<_> = app.session.log().analyzed().collect();
    if analyzed.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled(
                "No analyzed messages yet.",
                Style::default()
                    .fg(app.theme.text)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Send a prompt in the chat to see extraction results here.",
                Style::default().fg(app.theme.text_dim),
            )),
        ])
        .block(Block::default().title("Analysis Results").borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let items: Vec<ListItem> = analyzed
        .iter()
        .map(|message| {
            let style = Style::default().fg(analysis_color(message.analysis.as_ref(), &app.theme));
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<5}", message.sender.label()),
                    Style::default().fg(sender_color(message.sender, &app.theme)),
                ),
                Span::styled(preview(&message.text), style),
            ]))
        })
        .collect();

    let selected = app.selected_analysis();
    let mut state = ListState::default();
    state.select(selected.and_then(|s| analyzed.iter().position(|m| m.id == s.id)));

    let list = List::new(items)
        .block(Block::default().title("Analysis Results").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(app.theme.bg_highlight)
                .fg(app.theme.primary),
        );
    f.render_stateful_widget(list, chunks[0], &mut state);

    let Some(message) = selected else {
        return;
    };

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(chunks[1]);

    DetailPanel::new(
        "Original message",
        vec![
            ("Sender", message.sender.label().to_string()),
            ("Message", format!("“{}”", message.text)),
        ],
        Style::default().fg(app.theme.secondary),
    )
    .render(f, right[0]);

    let json = message
        .analysis
        .as_ref()
        .map(|analysis| analysis.to_pretty_json())
        .unwrap_or_default();
    let detail = Paragraph::new(json)
        .style(Style::default().fg(analysis_color(message.analysis.as_ref(), &app.theme)))
        .block(Block::default().title("Analysis").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(detail, right[1]);
}

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        let cut: String = first_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_and_multiline_text() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview("one\ntwo"), "one…");
        let long = "я".repeat(PREVIEW_CHARS + 5);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 1);
    }
}
