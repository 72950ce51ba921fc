//! Partial display of rendered text for the typewriter effect.
//!
//! Lengths are counted in characters of the rendered spans, so markdown syntax
//! never appears half-revealed.

use ratatui::text::{Line, Span};

/// Number of rendered characters across all lines.
pub fn rendered_len(lines: &[Line<'_>]) -> usize {
    lines
        .iter()
        .flat_map(|l| l.spans.iter())
        .map(|s| s.content.chars().count())
        .sum()
}

/// The first `visible` rendered characters of `lines`, styles intact.
///
/// Blank lines are kept only once text after them is visible.
pub fn reveal_prefix(lines: &[Line<'static>], visible: usize) -> Vec<Line<'static>> {
    let mut remaining = visible;
    let mut out = Vec::new();
    let mut pending_blank = 0;

    for line in lines {
        if remaining == 0 {
            break;
        }
        let len: usize = line.spans.iter().map(|s| s.content.chars().count()).sum();
        if len == 0 {
            pending_blank += 1;
            continue;
        }
        for _ in 0..pending_blank {
            out.push(Line::from(""));
        }
        pending_blank = 0;

        if len <= remaining {
            out.push(line.clone());
            remaining -= len;
            continue;
        }

        let mut spans = Vec::new();
        for span in &line.spans {
            if remaining == 0 {
                break;
            }
            let count = span.content.chars().count();
            if count <= remaining {
                spans.push(span.clone());
                remaining -= count;
            } else {
                let cut: String = span.content.chars().take(remaining).collect();
                spans.push(Span::styled(cut, span.style));
                remaining = 0;
            }
        }
        out.push(Line::from(spans).style(line.style));
    }
    out
}
