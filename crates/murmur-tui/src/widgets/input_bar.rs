//! Full-width input bar at the bottom of the screen.
//!
//! Grows with its content up to [`MAX_INPUT_LINES`] and carries the send hint
//! in its bottom border.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use unicode_width::UnicodeWidthChar;

use crate::theme::Theme;

use super::TextInputState;

/// Most content rows the input bar grows to before scrolling.
pub const MAX_INPUT_LINES: usize = 8;

const PROMPT: &str = "> ";
const CONTINUATION: &str = "  ";
const CURSOR: &str = "█";
const SEND_HINT: &str = " Enter ↵ send · Shift+Enter newline ";

/// Input bar widget.
pub struct InputBar<'a> {
    input: &'a TextInputState,
    theme: &'a Theme,
    enabled: bool,
    placeholder: &'a str,
}

impl<'a> InputBar<'a> {
    pub fn new(input: &'a TextInputState, theme: &'a Theme) -> Self {
        Self {
            input,
            theme,
            enabled: true,
            placeholder: "",
        }
    }

    /// Whether the user can type and send.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Text shown while the input is empty.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Rows the bar needs for `input` at `width` columns, borders included.
    ///
    /// Long lines wrap, so the height grows with the wrapped row count.
    #[allow(clippy::cast_possible_truncation)]
    pub fn height_for(input: &TextInputState, width: u16) -> u16 {
        let text_width = text_width(width);
        let (cursor_line, cursor_col) = input.cursor_position();
        let rows: usize = input
            .content()
            .split('\n')
            .enumerate()
            .map(|(i, text)| {
                let cursor = (i == cursor_line).then_some(cursor_col);
                wrap_glyphs(&line_glyphs(text, cursor), text_width).len()
            })
            .sum();
        rows.clamp(1, MAX_INPUT_LINES) as u16 + 2
    }

    fn send_hint(&self) -> Option<Line<'static>> {
        if !self.enabled {
            return None;
        }
        let style = if self.input.has_text() {
            Style::default().fg(self.theme.primary).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.muted).add_modifier(Modifier::DIM)
        };
        Some(Line::from(Span::styled(SEND_HINT, style)).right_aligned())
    }

    /// Display rows and the index of the row holding the cursor.
    fn content_lines(&self, width: u16) -> (Vec<Line<'static>>, usize) {
        let prompt_style = Style::default().fg(self.theme.primary);
        let text_style = Style::default().fg(self.theme.text);

        if self.input.is_empty() {
            let mut spans = vec![Span::styled(PROMPT, prompt_style)];
            if self.enabled {
                spans.push(Span::styled(CURSOR, text_style));
            }
            spans.push(Span::styled(
                self.placeholder.to_string(),
                Style::default().fg(self.theme.muted),
            ));
            return (vec![Line::from(spans)], 0);
        }

        let text_width = text_width(width);
        let (cursor_line, cursor_col) = self.input.cursor_position();
        let mut lines = Vec::new();
        let mut cursor_row = 0;

        for (i, text) in self.input.content().split('\n').enumerate() {
            let cursor = (self.enabled && i == cursor_line).then_some(cursor_col);
            for row in wrap_glyphs(&line_glyphs(text, cursor), text_width) {
                let prefix = if lines.is_empty() { PROMPT } else { CONTINUATION };
                let mut spans = vec![Span::styled(prefix, prompt_style)];
                let mut run = String::new();
                for glyph in row {
                    match glyph {
                        Glyph::Char(ch) => run.push(ch),
                        Glyph::Cursor => {
                            cursor_row = lines.len();
                            spans.push(Span::styled(std::mem::take(&mut run), text_style));
                            spans.push(Span::styled(CURSOR, text_style));
                        }
                    }
                }
                if !run.is_empty() {
                    spans.push(Span::styled(run, text_style));
                }
                lines.push(Line::from(spans));
            }
        }
        (lines, cursor_row)
    }
}

/// One display cell group in the input: a character or the cursor block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Char(char),
    Cursor,
}

impl Glyph {
    fn width(self) -> usize {
        match self {
            Glyph::Char(ch) => ch.width().unwrap_or(0),
            Glyph::Cursor => 1,
        }
    }
}

/// Columns left for text once borders and the prompt are drawn.
fn text_width(width: u16) -> usize {
    usize::from(width.saturating_sub(2)).saturating_sub(PROMPT.len()).max(1)
}

/// Glyphs of one logical line, with the cursor inserted at `cursor`.
fn line_glyphs(text: &str, cursor: Option<usize>) -> Vec<Glyph> {
    let mut glyphs: Vec<Glyph> = text.chars().map(Glyph::Char).collect();
    if let Some(col) = cursor {
        glyphs.insert(col.min(glyphs.len()), Glyph::Cursor);
    }
    glyphs
}

/// Break glyphs into rows no wider than `width`. Always at least one row.
fn wrap_glyphs(glyphs: &[Glyph], width: usize) -> Vec<Vec<Glyph>> {
    let mut rows = vec![Vec::new()];
    let mut used = 0;
    for &glyph in glyphs {
        let w = glyph.width();
        if used + w > width && used > 0 {
            rows.push(Vec::new());
            used = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(glyph);
        }
        used += w;
    }
    rows
}

impl Widget for InputBar<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.enabled {
            self.theme.border_focused
        } else {
            self.theme.border
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        if let Some(hint) = self.send_hint() {
            block = block.title_bottom(hint);
        }

        let inner_height = area.height.saturating_sub(2) as usize;
        let (lines, cursor_line) = self.content_lines(area.width);
        let scroll = if lines.len() <= inner_height {
            0
        } else {
            cursor_line.saturating_sub(inner_height.saturating_sub(1))
        };

        let mut paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((scroll as u16, 0));
        if !self.enabled {
            paragraph = paragraph.style(Style::default().add_modifier(Modifier::DIM));
        }
        paragraph.render(area, buf);
    }
}
