//! Help overlay listing the key bindings.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::theme::Theme;

const BINDINGS: &[(&str, &str)] = &[
    ("Enter", "Send message"),
    ("Shift+Enter / Ctrl+J", "New line"),
    ("Up / Down", "Previous / next sent message"),
    ("PgUp / PgDn / wheel", "Scroll conversation"),
    ("Ctrl+End", "Jump to latest"),
    ("Ctrl+L", "Clear conversation"),
    ("Esc", "Clear input"),
    ("F1", "Toggle this help"),
    ("Ctrl+C / Ctrl+Q", "Quit"),
];

/// A rectangle of at most `width` x `height` centered in `area`.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Help overlay widget.
pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl Widget for HelpOverlay<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key_style = Style::default()
            .fg(self.theme.primary)
            .add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(self.theme.text);

        let mut lines: Vec<Line<'_>> = BINDINGS
            .iter()
            .map(|(key, what)| {
                Line::from(vec![
                    Span::styled(format!("  {key:<22}"), key_style),
                    Span::styled(*what, text_style),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Press any key to close",
            Style::default().fg(self.theme.muted),
        )));

        let overlay = centered_fixed(60, lines.len() as u16 + 2, area);
        Clear.render(overlay, buf);
        Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Help ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border_focused))
                    .style(Style::default().bg(self.theme.surface)),
            )
            .render(overlay, buf);
    }
}
