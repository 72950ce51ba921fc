//! Phase-aware placeholder text for the input area.

use murmur_engine::ExchangePhase;

/// Placeholder shown in the empty input box for the current exchange phase.
#[must_use]
pub fn input_placeholder(phase: ExchangePhase) -> &'static str {
    match phase {
        ExchangePhase::Idle => "Type a message...",
        ExchangePhase::AwaitingReply => "Waiting for a reply...",
        ExchangePhase::Revealing => "Type your next message...",
    }
}
