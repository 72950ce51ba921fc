//! Wrapping styled lines to a terminal width.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Visual width of a string in terminal cells.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Wrap plain text to `width` cells.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    textwrap::wrap(text, width)
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect()
}

/// Wrap every line to `width` cells, keeping span styles.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }
    lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if line.width() <= width {
        return vec![line];
    }

    let styled: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |ch| (ch, span.style)))
        .collect();
    let plain: String = styled.iter().map(|(ch, _)| *ch).collect();

    // textwrap decides the break points; styles are then re-attached by walking
    // the original characters, skipping whitespace it dropped at the breaks.
    let mut cursor = 0;
    let mut wrapped = Vec::new();
    for row in textwrap::wrap(&plain, width) {
        while cursor < styled.len()
            && styled[cursor].0.is_whitespace()
            && !row.starts_with(styled[cursor].0)
        {
            cursor += 1;
        }

        let mut spans: Vec<Span<'static>> = Vec::new();
        for expected in row.chars() {
            let style = match styled.get(cursor) {
                Some(&(ch, style)) if ch == expected => {
                    cursor += 1;
                    style
                }
                _ => Style::default(),
            };
            match spans.last_mut() {
                Some(last) if last.style == style => last.content.to_mut().push(expected),
                _ => spans.push(Span::styled(expected.to_string(), style)),
            }
        }
        wrapped.push(Line::from(spans));
    }

    if wrapped.is_empty() {
        wrapped.push(Line::from(""));
    }
    wrapped
}

/// Cut a string to at most `max_width` cells, ending with `...` when shortened.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str("...");
    out
}
