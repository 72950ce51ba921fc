//! Exchange controller: one submission, its request, and how the reply lands.
//!
//! A [`Session`] owns the [`Conversation`] and the per-exchange state machine:
//!
//! ```text
//! Idle ──submit──▶ AwaitingReply ──settle(text, typewriter)──▶ Revealing ──finished──▶ Idle
//!                        │
//!                        └──settle(error | itinerary | immediate)──▶ Idle
//! ```
//!
//! Only one exchange can be in flight. It is identified by an [`ExchangeToken`], and a
//! completion carrying any other token is ignored. Input is accepted in every
//! phase except `AwaitingReply`. Submitting while a reveal is running
//! completes that reveal at once.

use crate::client::ChatError;
use crate::config::{Config, ReplyMode};
use crate::conversation::{Conversation, MessageId, MessageKind, Sender};
use crate::protocol::{ChatRequest, ChatResponse, Reply};
use crate::reveal::{spawn_reveal, RevealEvent, RevealHandle};
use tokio::sync::mpsc;

/// Where the current exchange is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangePhase {
    /// Ready for input.
    #[default]
    Idle,
    /// Request sent, no answer yet.
    AwaitingReply,
    /// Reply received and being revealed.
    Revealing,
}

/// Identifies the exchange currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeToken(u64);

/// A submission that was accepted and needs to be sent.
#[derive(Debug, Clone)]
pub struct Submission {
    pub token: ExchangeToken,
    pub request: ChatRequest,
    pub user_message: MessageId,
    pub placeholder: MessageId,
}

/// How a settled exchange changed the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Text reply is in place and hidden; call [`Session::start_reveal`].
    Reveal { message: MessageId },
    /// Reply is fully visible.
    Shown { messages: Vec<MessageId> },
    /// Exchange failed; the placeholder now holds the error message.
    Failed { message: MessageId },
}

/// Result of applying a reveal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealProgress {
    /// More of the message is visible.
    Advanced,
    /// Reveal complete; the exchange is over.
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    token: ExchangeToken,
    placeholder: MessageId,
}

/// Conversation plus the exchange state machine.
#[derive(Debug)]
pub struct Session {
    config: Config,
    conversation: Conversation,
    phase: ExchangePhase,
    in_flight: Option<InFlight>,
    next_token: u64,
    reveal: Option<RevealHandle>,
    reveal_tx: mpsc::UnboundedSender<RevealEvent>,
}

impl Session {
    /// Create a session. Reveal progress is sent to `reveal_tx`.
    pub fn new(config: Config, reveal_tx: mpsc::UnboundedSender<RevealEvent>) -> Self {
        Self {
            config,
            conversation: Conversation::new(),
            phase: ExchangePhase::Idle,
            in_flight: None,
            next_token: 1,
            reveal: None,
            reveal_tx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    /// Whether input and send are enabled.
    pub fn input_enabled(&self) -> bool {
        self.phase != ExchangePhase::AwaitingReply
    }

    /// Token of the exchange awaiting a reply, if any.
    pub fn in_flight(&self) -> Option<ExchangeToken> {
        self.in_flight.map(|f| f.token)
    }

    /// Message currently being revealed, if any.
    pub fn revealing(&self) -> Option<MessageId> {
        self.reveal.as_ref().map(RevealHandle::message)
    }

    /// Accept user text and begin an exchange.
    ///
    /// Returns `None` without side effects if the trimmed text is empty or an
    /// exchange is already awaiting its reply.
    pub fn submit(&mut self, raw: &str) -> Option<Submission> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(in_flight) = self.in_flight {
            tracing::debug!(token = ?in_flight.token, "submission refused: exchange in flight");
            return None;
        }

        if self.phase == ExchangePhase::Revealing {
            self.complete_reveal();
        }

        let token = ExchangeToken(self.next_token);
        self.next_token += 1;

        let user_message = self
            .conversation
            .append(Sender::User, text, MessageKind::Normal);
        let placeholder = self.conversation.append_placeholder();

        self.in_flight = Some(InFlight { token, placeholder });
        self.phase = ExchangePhase::AwaitingReply;
        tracing::debug!(?token, "exchange started");

        Some(Submission {
            token,
            request: ChatRequest::new(text),
            user_message,
            placeholder,
        })
    }

    /// Apply the outcome of the exchange identified by `token`.
    ///
    /// Returns `None` if `token` is not the exchange in flight.
    pub fn settle(
        &mut self,
        token: ExchangeToken,
        outcome: Result<ChatResponse, ChatError>,
    ) -> Option<Settlement> {
        let in_flight = match self.in_flight {
            Some(f) if f.token == token => f,
            _ => {
                tracing::debug!(?token, "ignoring stale exchange result");
                return None;
            }
        };
        self.in_flight = None;
        self.phase = ExchangePhase::Idle;

        let settlement = match outcome {
            Ok(response) => self.place_reply(in_flight.placeholder, response.reply),
            Err(e) => {
                tracing::warn!(?token, error = %e, "exchange failed");
                let message = self.fill_placeholder(
                    in_flight.placeholder,
                    self.config.error_message.clone(),
                    MessageKind::Error,
                );
                Settlement::Failed { message }
            }
        };

        Some(settlement)
    }

    fn place_reply(&mut self, placeholder: MessageId, reply: Reply) -> Settlement {
        match reply {
            Reply::Text(text) => {
                let content = if text.trim().is_empty() {
                    self.config.empty_reply_message.clone()
                } else {
                    text
                };
                let message = self.fill_placeholder(placeholder, content, MessageKind::Normal);

                if self.config.reply_mode == ReplyMode::Typewriter {
                    self.conversation.set_revealed(message, Some(0));
                    self.phase = ExchangePhase::Revealing;
                    Settlement::Reveal { message }
                } else {
                    Settlement::Shown {
                        messages: vec![message],
                    }
                }
            }
            Reply::Itinerary(items) => {
                self.conversation.remove(placeholder);
                let lines = if items.is_empty() {
                    vec![self.config.empty_reply_message.clone()]
                } else {
                    Reply::Itinerary(items).lines()
                };
                let messages = lines
                    .into_iter()
                    .map(|line| {
                        self.conversation
                            .append(Sender::Assistant, line, MessageKind::Normal)
                    })
                    .collect();
                Settlement::Shown { messages }
            }
        }
    }

    /// Put content into the placeholder, or append it if the placeholder is gone.
    fn fill_placeholder(&mut self, placeholder: MessageId, content: String, kind: MessageKind) -> MessageId {
        if self.conversation.replace(placeholder, content.clone(), kind) {
            placeholder
        } else {
            self.conversation.append(Sender::Assistant, content, kind)
        }
    }

    /// Start revealing `message`, whose rendered form is `total` characters long.
    ///
    /// Returns false unless `message` is the one [`Settlement::Reveal`] named.
    pub fn start_reveal(&mut self, message: MessageId, total: usize) -> bool {
        let pending = self.phase == ExchangePhase::Revealing
            && self.reveal.is_none()
            && self
                .conversation
                .get(message)
                .is_some_and(|m| m.revealed == Some(0));
        if !pending {
            return false;
        }

        self.reveal = Some(spawn_reveal(
            message,
            total,
            &self.config.reveal,
            self.reveal_tx.clone(),
        ));
        true
    }

    /// Apply a frame or completion from the running reveal.
    ///
    /// Events from cancelled reveals are dropped and return `None`.
    pub fn apply_reveal(&mut self, event: RevealEvent) -> Option<RevealProgress> {
        if self.revealing() != Some(event.message()) {
            return None;
        }

        match event {
            RevealEvent::Frame { message, visible } => {
                if self.conversation.set_revealed(message, Some(visible)) {
                    Some(RevealProgress::Advanced)
                } else {
                    self.complete_reveal();
                    None
                }
            }
            RevealEvent::Finished { .. } => {
                self.complete_reveal();
                Some(RevealProgress::Finished)
            }
        }
    }

    /// Stop any running reveal and show its message in full.
    pub fn complete_reveal(&mut self) {
        if let Some(handle) = self.reveal.take() {
            handle.cancel();
            self.conversation.set_revealed(handle.message(), None);
        }
        // Settled for reveal but never started.
        if let Some(pending) = self
            .conversation
            .messages()
            .iter()
            .find(|m| m.is_revealing())
            .map(|m| m.id)
        {
            self.conversation.set_revealed(pending, None);
        }
        if self.phase == ExchangePhase::Revealing {
            self.phase = ExchangePhase::Idle;
        }
    }

    /// Remove a message, stopping its reveal if one is running.
    pub fn remove_message(&mut self, id: MessageId) -> bool {
        if self.revealing() == Some(id) {
            self.complete_reveal();
        }
        let removed = self.conversation.remove(id).is_some();
        if removed && self.phase == ExchangePhase::Revealing && self.revealing().is_none() {
            self.phase = ExchangePhase::Idle;
        }
        removed
    }

    /// Remove every message. An exchange in flight still lands when it settles.
    pub fn clear(&mut self) {
        self.complete_reveal();
        self.conversation.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ItineraryItem, Price};
    use std::time::Duration;

    fn text_reply(text: &str) -> Result<ChatResponse, ChatError> {
        Ok(ChatResponse {
            reply: Reply::Text(text.into()),
        })
    }

    fn session(mode: ReplyMode) -> (Session, mpsc::UnboundedReceiver<RevealEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Config {
            reply_mode: mode,
            ..Config::default()
        };
        (Session::new(config, tx), rx)
    }

    fn failure() -> Result<ChatResponse, ChatError> {
        Err(ChatError::Status(502))
    }

    #[test]
    fn test_blank_submission_is_ignored() {
        let (mut s, _rx) = session(ReplyMode::Immediate);
        assert!(s.submit("").is_none());
        assert!(s.submit("   \n\t ").is_none());
        assert!(s.conversation().is_empty());
        assert!(s.input_enabled());
        assert_eq!(s.phase(), ExchangePhase::Idle);
    }

    #[test]
    fn test_submit_appends_user_message_and_placeholder() {
        let (mut s, _rx) = session(ReplyMode::Immediate);
        let sub = s.submit("  Hello  ").unwrap();

        assert_eq!(sub.request.message, "Hello");
        let messages = s.conversation().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].id, sub.placeholder);
        assert!(messages[1].is_loading());
        assert!(!s.input_enabled());
        assert_eq!(s.phase(), ExchangePhase::AwaitingReply);
    }

    #[test]
    fn test_second_submission_refused_while_in_flight() {
        let (mut s, _rx) = session(ReplyMode::Immediate);
        let first = s.submit("Hello").unwrap();
        assert!(s.submit("Again").is_none());
        assert_eq!(s.conversation().len(), 2);
        assert_eq!(s.in_flight(), Some(first.token));
    }

    #[test]
    fn test_immediate_text_reply_replaces_placeholder() {
        let (mut s, _rx) = session(ReplyMode::Immediate);
        let sub = s.submit("Hello").unwrap();

        let settlement = s.settle(sub.token, text_reply("Hi **there**")).unwrap();
        assert_eq!(
            settlement,
            Settlement::Shown {
                messages: vec![sub.placeholder]
            }
        );

        let conv = s.conversation();
        assert_eq!(conv.count(Sender::User, MessageKind::Normal), 1);
        assert_eq!(conv.count(Sender::Assistant, MessageKind::Normal), 1);
        assert!(conv.placeholder().is_none());
        assert_eq!(conv.get(sub.placeholder).unwrap().content, "Hi **there**");
        assert!(s.input_enabled());
        assert!(s.in_flight().is_none());
    }

    #[test]
    fn test_failure_shows_fixed_error_once() {
        let (mut s, _rx) = session(ReplyMode::Typewriter);
        let sub = s.submit("Hello").unwrap();

        let settlement = s.settle(sub.token, failure()).unwrap();
        assert_eq!(settlement, Settlement::Failed { message: sub.placeholder });

        let conv = s.conversation();
        assert!(conv.placeholder().is_none());
        assert_eq!(conv.count(Sender::Assistant, MessageKind::Error), 1);
        assert_eq!(conv.count(Sender::Assistant, MessageKind::Normal), 0);
        assert_eq!(conv.last().unwrap().content, Config::default().error_message);
        assert!(s.input_enabled());
        assert_eq!(s.phase(), ExchangePhase::Idle);
    }

    #[test]
    fn test_settle_is_applied_once() {
        let (mut s, _rx) = session(ReplyMode::Immediate);
        let sub = s.submit("Hello").unwrap();
        assert!(s.settle(sub.token, text_reply("one")).is_some());
        assert!(s.settle(sub.token, text_reply("two")).is_none());
        assert_eq!(s.conversation().len(), 2);
    }

    #[test]
    fn test_itinerary_reply_replaces_placeholder_with_one_message_per_item() {
        let (mut s, _rx) = session(ReplyMode::Typewriter);
        let sub = s.submit("flights to LA").unwrap();

        let items = vec![
            ItineraryItem {
                airline: "Delta".into(),
                route: "JFK → LAX".into(),
                price: Price::Amount(249.into()),
            },
            ItineraryItem {
                airline: "JetBlue".into(),
                route: "JFK → LAX".into(),
                price: Price::Label("199".into()),
            },
        ];
        let settlement = s
            .settle(
                sub.token,
                Ok(ChatResponse {
                    reply: Reply::Itinerary(items),
                }),
            )
            .unwrap();

        let Settlement::Shown { messages } = settlement else {
            panic!("itinerary replies are shown without a reveal");
        };
        assert_eq!(messages.len(), 2);
        assert!(s.conversation().get(sub.placeholder).is_none());
        let contents: Vec<&str> = s.conversation().messages()[1..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![
                "Flight: Delta | JFK → LAX | Price: $249",
                "Flight: JetBlue | JFK → LAX | Price: $199",
            ]
        );
        assert_eq!(s.phase(), ExchangePhase::Idle);
    }

    #[test]
    fn test_empty_text_reply_uses_fallback() {
        let (mut s, _rx) = session(ReplyMode::Immediate);
        let sub = s.submit("Hello").unwrap();
        s.settle(sub.token, text_reply("  ")).unwrap();
        assert_eq!(
            s.conversation().last().unwrap().content,
            Config::default().empty_reply_message
        );
    }

    #[test]
    fn test_reply_after_placeholder_removed_is_appended() {
        let (mut s, _rx) = session(ReplyMode::Immediate);
        let sub = s.submit("Hello").unwrap();
        s.clear();

        let settlement = s.settle(sub.token, text_reply("late")).unwrap();
        let Settlement::Shown { messages } = settlement else {
            panic!("expected shown");
        };
        assert_eq!(s.conversation().len(), 1);
        assert_eq!(s.conversation().get(messages[0]).unwrap().content, "late");
    }

    #[tokio::test(start_paused = true)]
    async fn test_typewriter_reveal_runs_to_completion() {
        let (mut s, mut rx) = session(ReplyMode::Typewriter);
        let sub = s.submit("Hello").unwrap();

        let settlement = s.settle(sub.token, text_reply("Hi **there**")).unwrap();
        assert_eq!(settlement, Settlement::Reveal { message: sub.placeholder });
        assert_eq!(s.phase(), ExchangePhase::Revealing);
        assert!(s.input_enabled());
        assert_eq!(s.conversation().get(sub.placeholder).unwrap().revealed, Some(0));

        assert!(s.start_reveal(sub.placeholder, 8));
        assert!(!s.start_reveal(sub.placeholder, 8));

        let mut frames = 0;
        loop {
            let event = rx.recv().await.unwrap();
            match s.apply_reveal(event) {
                Some(RevealProgress::Advanced) => frames += 1,
                Some(RevealProgress::Finished) => break,
                None => panic!("unexpected stale event {event:?}"),
            }
        }

        assert_eq!(frames, 3);
        assert_eq!(s.phase(), ExchangePhase::Idle);
        assert!(s.revealing().is_none());
        assert_eq!(s.conversation().get(sub.placeholder).unwrap().revealed, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_submission_completes_running_reveal() {
        let (mut s, mut rx) = session(ReplyMode::Typewriter);
        let first = s.submit("Hello").unwrap();
        s.settle(first.token, text_reply("a long reply that takes a while"))
            .unwrap();
        s.start_reveal(first.placeholder, 31);

        let event = rx.recv().await.unwrap();
        assert_eq!(s.apply_reveal(event), Some(RevealProgress::Advanced));

        let second = s.submit("Next").unwrap();
        assert_eq!(s.conversation().get(first.placeholder).unwrap().revealed, None);
        assert!(s.revealing().is_none());
        assert_eq!(s.in_flight(), Some(second.token));

        // Anything the old reveal still delivers is ignored.
        tokio::time::advance(Duration::from_secs(1)).await;
        while let Ok(event) = rx.try_recv() {
            assert_eq!(s.apply_reveal(event), None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_removing_revealed_message_cancels_reveal() {
        let (mut s, mut rx) = session(ReplyMode::Typewriter);
        let sub = s.submit("Hello").unwrap();
        s.settle(sub.token, text_reply("some reply text")).unwrap();
        s.start_reveal(sub.placeholder, 15);

        assert!(s.remove_message(sub.placeholder));
        assert!(s.revealing().is_none());
        assert_eq!(s.phase(), ExchangePhase::Idle);

        tokio::time::advance(Duration::from_secs(1)).await;
        while let Ok(event) = rx.try_recv() {
            assert_eq!(s.apply_reveal(event), None);
        }
        assert!(s.conversation().get(sub.placeholder).is_none());
    }
}
