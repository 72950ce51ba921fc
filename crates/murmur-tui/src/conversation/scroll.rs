//! Scroll position of the conversation pane.
//!
//! The offset is counted in rendered lines up from the bottom, so follow mode
//! is simply an offset of zero that stays pinned as content grows.

/// Lines scrolled per mouse wheel tick.
pub const WHEEL_LINES: usize = 3;

/// Scroll state for [`super::ConversationPane`].
#[derive(Debug, Clone)]
pub struct ScrollState {
    offset: usize,
    follow: bool,
    /// Largest useful offset seen at the last render.
    max_offset: usize,
    /// Body height at the last render, used for paging.
    viewport: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            follow: true,
            max_offset: 0,
            viewport: 0,
        }
    }
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines scrolled up from the bottom.
    pub fn offset(&self) -> usize {
        if self.follow {
            0
        } else {
            self.offset
        }
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Jump to the newest content and stick to it.
    pub fn follow_latest(&mut self) {
        self.follow = true;
        self.offset = 0;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = (self.offset() + lines).min(self.max_offset);
        self.follow = self.offset == 0;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = self.offset().saturating_sub(lines);
        self.follow = self.offset == 0;
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport.saturating_sub(1).max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport.saturating_sub(1).max(1));
    }

    /// Record the layout of a render and clamp the offset to it.
    pub(crate) fn update_bounds(&mut self, total_lines: usize, viewport: usize) {
        self.viewport = viewport;
        self.max_offset = total_lines.saturating_sub(viewport);
        self.offset = self.offset.min(self.max_offset);
    }

    /// First line to draw for `total_lines` of content in `viewport` rows.
    pub(crate) fn top_line(&self, total_lines: usize, viewport: usize) -> usize {
        total_lines
            .saturating_sub(viewport)
            .saturating_sub(self.offset())
    }
}
