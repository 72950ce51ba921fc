//! Conversation model: the ordered messages shown in the chat view.
//!
//! Messages are addressed by [`MessageId`] handles so the loading placeholder
//! and an in-progress reveal can be updated in place after later appends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable handle to a message in a [`Conversation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(u64);

/// Who a message is from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// What a message represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Ordinary content.
    Normal,
    /// Pending-reply placeholder.
    Loading,
    /// Failed exchange.
    Error,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    /// Raw content; markdown for assistant replies.
    pub content: String,
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
    /// Rendered characters visible while a reveal is running. `None` shows everything.
    #[serde(skip)]
    pub revealed: Option<usize>,
}

impl Message {
    /// Whether this is the loading placeholder.
    pub fn is_loading(&self) -> bool {
        self.kind == MessageKind::Loading
    }

    /// Whether a reveal is still hiding part of the content.
    pub fn is_revealing(&self) -> bool {
        self.revealed.is_some()
    }
}

/// Ordered list of messages with at most one loading placeholder.
#[derive(Debug)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the conversation is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Look up a message by handle.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// The newest message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Append a message and return its handle.
    pub fn append(&mut self, sender: Sender, content: impl Into<String>, kind: MessageKind) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            sender,
            content: content.into(),
            kind,
            timestamp: Utc::now(),
            revealed: None,
        });
        id
    }

    /// Append the loading placeholder.
    ///
    /// If one already exists its handle is returned instead of adding a second.
    pub fn append_placeholder(&mut self) -> MessageId {
        if let Some(existing) = self.placeholder() {
            tracing::debug!(?existing, "placeholder already present");
            return existing;
        }
        self.append(Sender::Assistant, String::new(), MessageKind::Loading)
    }

    /// Handle of the current loading placeholder, if any.
    pub fn placeholder(&self) -> Option<MessageId> {
        self.messages.iter().find(|m| m.is_loading()).map(|m| m.id)
    }

    /// Overwrite a message's content and kind. Returns false if it no longer exists.
    pub fn replace(&mut self, id: MessageId, content: impl Into<String>, kind: MessageKind) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                message.content = content.into();
                message.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Set how much of a message is revealed. Returns false if it no longer exists.
    pub fn set_revealed(&mut self, id: MessageId, revealed: Option<usize>) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                message.revealed = revealed;
                true
            }
            None => false,
        }
    }

    /// Remove a message.
    pub fn remove(&mut self, id: MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(index))
    }

    /// Remove all messages. Handles are never reused.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Count messages matching a sender and kind.
    pub fn count(&self, sender: Sender, kind: MessageKind) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender == sender && m.kind == kind)
            .count()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
