//! Agent settings: base prompt, schema fields and the generated schema.

use super::centered_rect;
use crate::state::{App, FieldForm, FormField};
use crate::theme::field_type_color;
use crate::widgets::DetailPanel;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(chunks[0]);

    render_prompt(f, app, left[0]);
    render_fields(f, app, left[1]);
    render_preview(f, app, chunks[1]);

    if let Some(form) = &app.settings_view.form {
        render_form(f, app, form, centered_rect(60, 50, area));
    }
}

fn render_prompt(f: &mut Frame<'_>, app: &App, area: Rect) {
    let view = &app.settings_view;
    let (text, title, border) = match &view.prompt_editor {
        Some(buffer) => (buffer.as_str(), "Base prompt (editing)", app.theme.border_focus),
        None => (view.editor.base_prompt(), "Base prompt", app.theme.border),
    };
    let widget = Paragraph::new(text)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn render_fields(f: &mut Frame<'_>, app: &App, area: Rect) {
    let view = &app.settings_view;
    let items: Vec<ListItem> = view
        .editor
        .fields()
        .iter()
        .map(|field| {
            let mut spans = vec![
                Span::styled(
                    field.name.clone(),
                    Style::default()
                        .fg(app.theme.text)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(
                    field.field_type.as_str(),
                    Style::default().fg(field_type_color(field.field_type, &app.theme)),
                ),
            ];
            if field.required {
                spans.push(Span::styled(" *", Style::default().fg(app.theme.warning)));
            }
            if !field.enum_tokens().is_empty() {
                spans.push(Span::styled(
                    format!(" [{}]", field.enum_tokens().join("|")),
                    Style::default().fg(app.theme.text_dim),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut state = ListState::default();
    state.select(
        view.selected
            .and_then(|id| view.editor.fields().iter().position(|f| f.id == id)),
    );

    let title = format!("Fields ({})", view.editor.fields().len());
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(app.theme.bg_highlight)
                .fg(app.theme.primary),
        );
    f.render_stateful_widget(list, area, &mut state);
}

fn render_preview(f: &mut Frame<'_>, app: &App, area: Rect) {
    let view = &app.settings_view;
    let title = if view.dirty {
        "JSON schema (unsaved)"
    } else {
        "JSON schema"
    };
    let widget = Paragraph::new(view.editor.preview())
        .style(Style::default().fg(app.theme.primary_dim))
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn render_form(f: &mut Frame<'_>, app: &App, form: &FieldForm, area: Rect) {
    let draft = &form.draft;
    let fields = FormField::all()
        .iter()
        .map(|field| {
            let value = match field {
                FormField::Name => draft.name.clone(),
                FormField::Type => draft.field_type.as_str().to_string(),
                FormField::Description => draft.description.clone(),
                FormField::EnumValues => draft.enum_values.clone(),
                FormField::Required => if draft.required { "yes" } else { "no" }.to_string(),
            };
            (field.label(), value)
        })
        .collect();

    let title = if form.target.is_some() {
        "Edit field"
    } else {
        "Add field"
    };
    let mut panel = DetailPanel::new(title, fields, Style::default().fg(app.theme.text_dim));
    panel.focused = FormField::all().iter().position(|f| *f == form.focus);
    panel.focus_style = Style::default()
        .fg(app.theme.primary)
        .add_modifier(Modifier::BOLD);
    panel.border_style = Style::default().fg(app.theme.border_focus);

    f.render_widget(Clear, area);
    panel.render(f, area);
}
