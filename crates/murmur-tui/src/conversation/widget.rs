//! Conversation pane widget.
//!
//! Renders every message as a sender header followed by its body:
//!
//! ```text
//! ┌─ Conversation ──────────────────────┐
//! │ You · 14:02                          │
//! │ Find me a flight to LA               │
//! │                                      │
//! │ AI · 14:02                           │
//! │ ··  Thinking...                      │
//! └──────────────────────────────────────┘
//! ```

use chrono::Local;
use murmur_engine::{Config, Conversation, Message, MessageKind, Sender};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};

use crate::text::{render_markdown, reveal_prefix, wrap_lines, wrap_text};
use crate::theme::Theme;

use super::scroll::ScrollState;

/// Frames in one cycle of the loading ellipsis.
const ELLIPSIS_FRAMES: u64 = 3;

/// Conversation pane widget.
pub struct ConversationPane<'a> {
    conversation: &'a Conversation,
    config: &'a Config,
    theme: &'a Theme,
    /// Animation tick for the loading ellipsis.
    tick: u64,
}

impl<'a> ConversationPane<'a> {
    pub fn new(conversation: &'a Conversation, config: &'a Config, theme: &'a Theme) -> Self {
        Self {
            conversation,
            config,
            theme,
            tick: 0,
        }
    }

    #[must_use]
    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }
}

/// All lines of the conversation at `width` columns.
pub fn conversation_lines(
    conversation: &Conversation,
    config: &Config,
    theme: &Theme,
    width: usize,
    tick: u64,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, message) in conversation.messages().iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.extend(message_lines(message, config, theme, width, tick));
    }
    lines
}

/// Header and body lines for one message.
pub fn message_lines(
    message: &Message,
    config: &Config,
    theme: &Theme,
    width: usize,
    tick: u64,
) -> Vec<Line<'static>> {
    let mut lines = vec![header_line(message, config, theme)];

    match (message.sender, message.kind) {
        (_, MessageKind::Loading) => lines.push(loading_line(&config.loading_text, theme, tick)),
        (_, MessageKind::Error) => {
            let style = Style::default().fg(theme.error);
            lines.extend(
                wrap_text(&message.content, width)
                    .into_iter()
                    .map(|l| Line::from(Span::styled(l, style))),
            );
        }
        (Sender::User, MessageKind::Normal) => {
            let style = Style::default().fg(theme.text);
            for raw in message.content.split('\n') {
                let wrapped = wrap_text(raw, width);
                if wrapped.is_empty() {
                    lines.push(Line::from(""));
                }
                lines.extend(wrapped.into_iter().map(|l| Line::from(Span::styled(l, style))));
            }
        }
        (Sender::Assistant, MessageKind::Normal) => {
            let rendered = render_markdown(&message.content, width, theme);
            let shown = match message.revealed {
                Some(visible) => reveal_prefix(&rendered, visible),
                None => rendered,
            };
            lines.extend(wrap_lines(shown, width));
        }
    }
    lines
}

fn header_line(message: &Message, config: &Config, theme: &Theme) -> Line<'static> {
    let (name, color) = match message.sender {
        Sender::User => (config.user_name.clone(), theme.user),
        Sender::Assistant => (config.assistant_name.clone(), theme.assistant),
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    Line::from(vec![
        Span::styled(name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" · {time}"), Style::default().fg(theme.muted)),
    ])
}

fn loading_line(text: &str, theme: &Theme, tick: u64) -> Line<'static> {
    let dots = usize::try_from(tick % ELLIPSIS_FRAMES).unwrap_or(0) + 1;
    Line::from(vec![
        Span::styled(
            format!("{:<3} ", "·".repeat(dots)),
            Style::default().fg(theme.primary),
        ),
        Span::styled(
            text.to_string(),
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        ),
    ])
}

impl StatefulWidget for ConversationPane<'_> {
    type State = ScrollState;

    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ScrollState) {
        let block = Block::default()
            .title(" Conversation ")
            .title_style(Style::default().fg(self.theme.text))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .style(Style::default().bg(self.theme.base));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.conversation.is_empty() {
            let hint = format!("Say hello to {}.", self.config.assistant_name);
            Paragraph::new(Line::from(Span::styled(
                hint,
                Style::default().fg(self.theme.muted),
            )))
            .centered()
            .render(inner, buf);
            state.update_bounds(0, inner.height as usize);
            return;
        }

        let lines = conversation_lines(
            self.conversation,
            self.config,
            self.theme,
            inner.width as usize,
            self.tick,
        );
        let viewport = inner.height as usize;
        state.update_bounds(lines.len(), viewport);
        let top = state.top_line(lines.len(), viewport);

        let visible: Vec<Line<'static>> = lines.into_iter().skip(top).take(viewport).collect();
        Paragraph::new(visible).render(inner, buf);
    }
}
