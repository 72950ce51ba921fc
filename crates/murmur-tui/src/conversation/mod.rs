//! Conversation pane: message rendering, scroll state and input placeholders.

mod placeholder;
mod scroll;
mod widget;

pub use placeholder::input_placeholder;
pub use scroll::{ScrollState, WHEEL_LINES};
pub use widget::{conversation_lines, message_lines, ConversationPane};
