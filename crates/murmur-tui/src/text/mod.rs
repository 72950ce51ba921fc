//! Text rendering utilities.
//!
//! - [`render_markdown`] turns reply markdown into styled lines
//! - [`wrap_lines`] fits styled lines to a width
//! - [`reveal_prefix`] cuts rendered lines for the typewriter effect

mod markdown;
mod reveal;
mod styles;
mod wrap;

pub use markdown::render_markdown;
pub use reveal::{rendered_len, reveal_prefix};
pub use styles::MarkdownStyles;
pub use wrap::{display_width, truncate_to_width, wrap_lines, wrap_text};
