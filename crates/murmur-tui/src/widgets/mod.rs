//! UI widgets for the TUI.
//!
//! - [`StatusBar`]: phase, endpoint and a key hint
//! - [`InputBar`]: auto-growing message input
//! - [`HelpOverlay`]: key binding reference

mod help;
mod input_bar;
mod status_bar;
mod text_input;

pub use help::{centered_fixed, HelpOverlay};
pub use input_bar::{InputBar, MAX_INPUT_LINES};
pub use status_bar::{StatusBar, StatusBarContent};
pub use text_input::TextInputState;
