//! Wire types for the `/chat` endpoint.
//!
//! A request carries one message. The reply is either plain markdown text or a
//! list of itinerary entries; both shapes are decoded here so nothing past the
//! boundary has to inspect raw JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a successful `/chat` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: Reply,
}

/// The two reply shapes the backend produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    /// Markdown text.
    Text(String),
    /// Structured entries, one message each.
    Itinerary(Vec<ItineraryItem>),
}

impl Reply {
    /// Plain-text lines for this reply, one per message it produces.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Reply::Text(text) => vec![text.clone()],
            Reply::Itinerary(items) => items.iter().map(ItineraryItem::summary).collect(),
        }
    }
}

/// One structured reply entry.
///
/// Only these three fields have been observed from the backend; anything else
/// it sends is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub airline: String,
    pub route: String,
    pub price: Price,
}

impl ItineraryItem {
    /// One-line summary, e.g. `Flight: Delta | JFK → LAX | Price: $249`.
    pub fn summary(&self) -> String {
        format!(
            "Flight: {} | {} | Price: ${}",
            self.airline, self.route, self.price
        )
    }
}

/// A price as sent by the backend: a bare number or preformatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(serde_json::Number),
    Label(String),
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Amount(n) => write!(f, "{n}"),
            Price::Label(s) => f.write_str(s),
        }
    }
}
