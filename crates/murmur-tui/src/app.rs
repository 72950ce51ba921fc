//! Application state for the murmur TUI.

use murmur_engine::{
    ChatError, ChatResponse, Config, ExchangePhase, ExchangeToken, RevealEvent, RevealProgress,
    Session, Settlement, Submission,
};
use tokio::sync::mpsc;

use crate::conversation::{ScrollState, WHEEL_LINES};
use crate::event::Action;
use crate::text::{render_markdown, rendered_len};
use crate::theme::Theme;
use crate::widgets::TextInputState;

/// Conversation width assumed before the first draw.
const DEFAULT_CONTENT_WIDTH: usize = 78;

/// Main application state.
pub struct App {
    session: Session,
    input: TextInputState,
    scroll: ScrollState,
    theme: Theme,
    pub show_help: bool,
    pub should_quit: bool,
    /// Animation counter, advanced on every tick.
    tick: u64,
    /// Width the conversation body was last drawn at.
    content_width: usize,
    bell_pending: bool,
}

impl App {
    /// Create the app. Reveal progress for the session is sent to `reveal_tx`.
    pub fn new(config: Config, theme: Theme, reveal_tx: mpsc::UnboundedSender<RevealEvent>) -> Self {
        Self {
            session: Session::new(config, reveal_tx),
            input: TextInputState::new(),
            scroll: ScrollState::new(),
            theme,
            show_help: false,
            should_quit: false,
            tick: 0,
            content_width: DEFAULT_CONTENT_WIDTH,
            bell_pending: false,
        }
    }

    /// App with default config and a discarded reveal channel.
    #[cfg(test)]
    pub fn new_for_test() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self::new(Config::default(), Theme::default(), tx)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        self.session.config()
    }

    pub fn input(&self) -> &TextInputState {
        &self.input
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    /// Session and theme for drawing the conversation, plus its scroll state.
    pub(crate) fn pane_parts(&mut self) -> (&Session, &Theme, &mut ScrollState) {
        (&self.session, &self.theme, &mut self.scroll)
    }

    pub fn phase(&self) -> ExchangePhase {
        self.session.phase()
    }

    pub fn input_enabled(&self) -> bool {
        self.session.input_enabled()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Advance animations.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Record the conversation body width from the latest layout.
    pub fn set_content_width(&mut self, width: usize) {
        self.content_width = width.max(1);
    }

    /// Whether a bell should ring, clearing the request.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    /// Apply an action. Returns a submission when a request must be sent.
    pub fn handle_action(&mut self, action: Action) -> Option<Submission> {
        if self.show_help {
            // Any key closes help; quitting still works
            self.show_help = false;
            if action == Action::Quit {
                self.should_quit = true;
            }
            return None;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::Help => self.show_help = true,
            Action::Back => self.input.clear(),
            Action::Submit => return self.submit(),
            Action::Clear => {
                self.session.clear();
                self.scroll.follow_latest();
            }
            Action::ScrollUp => self.scroll.scroll_up(WHEEL_LINES),
            Action::ScrollDown => self.scroll.scroll_down(WHEEL_LINES),
            Action::PageUp => self.scroll.page_up(),
            Action::PageDown => self.scroll.page_down(),
            Action::FollowLatest => self.scroll.follow_latest(),
            Action::None => {}
            edit => self.edit_input(edit),
        }
        None
    }

    fn edit_input(&mut self, action: Action) {
        if !self.input_enabled() {
            return;
        }
        match action {
            Action::Newline => self.input.insert('\n'),
            Action::Insert(ch) => self.input.insert(ch),
            Action::Backspace => self.input.backspace(),
            Action::Delete => self.input.delete(),
            Action::Left => self.input.move_left(),
            Action::Right => self.input.move_right(),
            Action::Home => self.input.move_home(),
            Action::End => self.input.move_end(),
            Action::HistoryPrev => self.input.history_prev(),
            Action::HistoryNext => self.input.history_next(),
            _ => {}
        }
    }

    /// Insert pasted text at the cursor. Line breaks stay literal newlines.
    pub fn paste(&mut self, text: &str) {
        if self.show_help || !self.input_enabled() {
            return;
        }
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.input.insert_str(&text);
    }

    /// Send the current input if it has text and no exchange is pending.
    pub fn submit(&mut self) -> Option<Submission> {
        if !self.input_enabled() {
            return None;
        }
        let submission = self.session.submit(self.input.content())?;
        self.input.submit();
        self.scroll.follow_latest();
        Some(submission)
    }

    /// Apply the outcome of a request.
    pub fn settle(&mut self, token: ExchangeToken, outcome: Result<ChatResponse, ChatError>) {
        let Some(settlement) = self.session.settle(token, outcome) else {
            return;
        };
        match settlement {
            Settlement::Reveal { message } => {
                let total = self.session.conversation().get(message).map_or(0, |m| {
                    rendered_len(&render_markdown(&m.content, self.content_width, &self.theme))
                });
                self.session.start_reveal(message, total);
            }
            Settlement::Shown { .. } => self.bell_pending = self.config().bell_on_reply,
            Settlement::Failed { .. } => {}
        }
        self.scroll.follow_latest();
    }

    /// Apply a frame from the running reveal.
    pub fn apply_reveal(&mut self, event: RevealEvent) {
        if self.session.apply_reveal(event) == Some(RevealProgress::Finished) {
            self.bell_pending = self.config().bell_on_reply;
        }
    }

    /// Stop background work owned by the session.
    pub fn shutdown(&mut self) {
        self.session.complete_reveal();
    }
}
