//! murmur-engine: Headless core of the murmur chat client
//!
//! This crate provides everything below the terminal UI:
//! - Configuration loading and validation
//! - The `/chat` wire protocol and HTTP client
//! - The conversation model and per-exchange state machine
//! - The cancellable typewriter reveal task

pub mod client;
pub mod config;
pub mod conversation;
pub mod protocol;
pub mod reveal;
pub mod session;

// Re-export commonly used types
pub use client::{ChatClient, ChatError};
pub use config::{Config, ConfigError, ReplyMode, RevealConfig, DEFAULT_BASE_URL, MURMUR_DIR};
pub use conversation::{Conversation, Message, MessageId, MessageKind, Sender};
pub use protocol::{ChatRequest, ChatResponse, ItineraryItem, Price, Reply};
pub use reveal::{spawn_reveal, RevealEvent, RevealHandle, RevealSchedule};
pub use session::{ExchangePhase, ExchangeToken, RevealProgress, Session, Settlement, Submission};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
