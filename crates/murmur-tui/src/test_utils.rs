//! Test helpers for rendering the app into a `TestBackend`.

use crate::app::App;
use crate::ui;
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Create a test terminal with the default dimensions (80x24).
pub fn create_test_terminal() -> Terminal<TestBackend> {
    create_test_terminal_sized(TEST_WIDTH, TEST_HEIGHT)
}

/// Create a test terminal with custom dimensions.
pub fn create_test_terminal_sized(width: u16, height: u16) -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(width, height)).expect("Failed to create test terminal")
}

/// Draw one frame of `app`.
pub fn render_app(terminal: &mut Terminal<TestBackend>, app: &mut App) {
    terminal
        .draw(|frame| ui::draw(frame, app))
        .expect("Failed to draw");
}

/// Buffer text with one line per row and trailing spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    crate::headless::buffer_to_string(buffer)
}
