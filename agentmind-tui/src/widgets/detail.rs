//! Label/value panel.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub struct DetailPanel<'a> {
    pub title: &'a str,
    pub fields: Vec<(&'a str, String)>,
    pub label_style: Style,
    /// Row drawn with `focus_style`, if any.
    pub focused: Option<usize>,
    pub focus_style: Style,
    pub border_style: Style,
}

impl<'a> DetailPanel<'a> {
    pub fn new(title: &'a str, fields: Vec<(&'a str, String)>, label_style: Style) -> Self {
        Self {
            title,
            fields,
            label_style,
            focused: None,
            focus_style: label_style,
            border_style: Style::default(),
        }
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let lines: Vec<Line> = self
            .fields
            .iter()
            .enumerate()
            .map(|(index, (label, value))| {
                let (marker, style) = if self.focused == Some(index) {
                    ("> ", self.focus_style)
                } else {
                    ("  ", self.label_style)
                };
                Line::from(vec![
                    Span::styled(format!("{}{}: ", marker, label), style),
                    Span::raw(value.clone()),
                ])
            })
            .collect();

        let widget = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .title(self.title)
                    .borders(Borders::ALL)
                    .border_style(self.border_style),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(widget, area);
    }
}
