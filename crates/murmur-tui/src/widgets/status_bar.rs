//! Status bar widget for the top of the TUI.
//!
//! Format: `● Phase │ endpoint │ scrolled │ → hint`

use murmur_engine::ExchangePhase;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::text::truncate_to_width;
use crate::theme::Theme;

/// Status bar content.
#[derive(Debug, Clone)]
pub struct StatusBarContent {
    pub phase: ExchangePhase,
    /// Chat endpoint URL.
    pub endpoint: String,
    /// Whether the conversation is scrolled away from the newest message.
    pub scrolled: bool,
}

impl StatusBarContent {
    fn phase_label(&self) -> &'static str {
        match self.phase {
            ExchangePhase::Idle => "Ready",
            ExchangePhase::AwaitingReply => "Waiting",
            ExchangePhase::Revealing => "Replying",
        }
    }

    fn hint(&self) -> &'static str {
        if self.scrolled {
            "Ctrl+End latest"
        } else {
            "F1 help"
        }
    }
}

/// Status bar widget.
pub struct StatusBar<'a> {
    content: &'a StatusBarContent,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(content: &'a StatusBarContent, theme: &'a Theme) -> Self {
        Self { content, theme }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dot = match self.content.phase {
            ExchangePhase::Idle => self.theme.success,
            ExchangePhase::AwaitingReply => self.theme.warning,
            ExchangePhase::Revealing => self.theme.info,
        };
        let separator = || Span::styled(" │ ", Style::default().fg(self.theme.muted));

        let mut spans = vec![
            Span::styled("● ", Style::default().fg(dot)),
            Span::styled(
                self.content.phase_label(),
                Style::default().fg(self.theme.text),
            ),
            separator(),
            Span::styled(
                truncate_to_width(&self.content.endpoint, usize::from(area.width) / 2),
                Style::default().fg(self.theme.subtext),
            ),
        ];
        if self.content.scrolled {
            spans.push(separator());
            spans.push(Span::styled("scrolled", Style::default().fg(self.theme.warning)));
        }
        spans.push(separator());
        spans.push(Span::styled(
            format!("→ {}", self.content.hint()),
            Style::default().fg(self.theme.secondary),
        ));

        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(content: &StatusBarContent) -> String {
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal
            .draw(|frame| frame.render_widget(StatusBar::new(content, &theme), frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn test_idle_status() {
        let content = StatusBarContent {
            phase: ExchangePhase::Idle,
            endpoint: "http://localhost:8000/chat".into(),
            scrolled: false,
        };
        let text = render(&content);
        assert!(text.contains("Ready"));
        assert!(text.contains("http://localhost:8000/chat"));
        assert!(text.contains("F1 help"));
    }

    #[test]
    fn test_scrolled_status() {
        let content = StatusBarContent {
            phase: ExchangePhase::AwaitingReply,
            endpoint: "http://localhost:8000/chat".into(),
            scrolled: true,
        };
        let text = render(&content);
        assert!(text.contains("Waiting"));
        assert!(text.contains("scrolled"));
        assert!(text.contains("Ctrl+End latest"));
    }
}
