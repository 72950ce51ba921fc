//! Headless mode for the murmur TUI.
//!
//! Runs the full app against a real [`ChatClient`] but draws into a
//! `TestBackend`. Actions are sent over a channel and the screen is published
//! after every frame, so tests can drive a complete exchange end to end.

use murmur_engine::{ChatClient, Config, ExchangePhase};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::app::App;
use crate::event::Action;
use crate::theme::Theme;
use crate::{spawn_exchange, ui, ExchangeResult};

/// Default terminal dimensions for headless mode.
pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// State captured after each render.
#[derive(Debug, Clone)]
pub struct HeadlessState {
    /// Text contents of the terminal buffer.
    pub screen_contents: String,
    pub phase: ExchangePhase,
    pub input_enabled: bool,
    /// Number of messages in the conversation.
    pub messages: usize,
    pub should_quit: bool,
    pub show_help: bool,
}

impl Default for HeadlessState {
    fn default() -> Self {
        Self {
            screen_contents: String::new(),
            phase: ExchangePhase::Idle,
            input_enabled: true,
            messages: 0,
            should_quit: false,
            show_help: false,
        }
    }
}

/// Handle to control a headless TUI instance.
pub struct HeadlessHandle {
    action_tx: mpsc::UnboundedSender<Action>,
    state_rx: watch::Receiver<HeadlessState>,
}

impl HeadlessHandle {
    /// Send an action. Returns `false` once the TUI has stopped.
    pub fn send_action(&self, action: Action) -> bool {
        self.action_tx.send(action).is_ok()
    }

    /// Type `text` one character at a time.
    pub fn type_text(&self, text: &str) {
        for ch in text.chars() {
            let action = if ch == '\n' {
                Action::Newline
            } else {
                Action::Insert(ch)
            };
            self.send_action(action);
        }
    }

    /// The most recently published state.
    pub fn state(&self) -> HeadlessState {
        self.state_rx.borrow().clone()
    }

    /// Wait until `condition` holds, or `None` after `timeout`.
    pub async fn wait_for<F>(&mut self, condition: F, timeout: Duration) -> Option<HeadlessState>
    where
        F: Fn(&HeadlessState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let state = self.state();
            if condition(&state) {
                return Some(state);
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }

            match tokio::time::timeout(remaining, self.state_rx.changed()).await {
                Ok(Ok(())) => {}
                // Timed out, or the TUI stopped publishing
                Ok(Err(_)) | Err(_) => return None,
            }
        }
    }

    /// Wait for `text` to appear on screen.
    pub async fn wait_for_text(&mut self, text: &str, timeout: Duration) -> Option<HeadlessState> {
        self.wait_for(|s| s.screen_contents.contains(text), timeout)
            .await
    }

    pub fn has_quit(&self) -> bool {
        self.state().should_quit
    }
}

/// Options for headless mode.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub width: u16,
    pub height: u16,
    pub tick_rate: Duration,
    /// Client to send requests with. Built from the config when `None`.
    pub client: Option<ChatClient>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tick_rate: Duration::from_millis(50),
            client: None,
        }
    }
}

/// Run the TUI in headless mode.
///
/// Returns a handle to control it and the task running it.
///
/// ```ignore
/// let (mut handle, task) = run_tui_headless(config, HeadlessConfig::default());
/// handle.type_text("Hello");
/// handle.send_action(Action::Submit);
/// handle.wait_for_text("Hi there", Duration::from_secs(5)).await;
/// handle.send_action(Action::Quit);
/// task.await.unwrap().unwrap();
/// ```
pub fn run_tui_headless(
    config: Config,
    headless: HeadlessConfig,
) -> (HeadlessHandle, JoinHandle<Result<(), String>>) {
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(HeadlessState::default());

    let task = tokio::spawn(async move {
        run_headless_loop(config, headless, action_rx, state_tx)
            .await
            .map_err(|e| e.to_string())
    });

    (
        HeadlessHandle {
            action_tx,
            state_rx,
        },
        task,
    )
}

async fn run_headless_loop(
    config: Config,
    headless: HeadlessConfig,
    mut action_rx: mpsc::UnboundedReceiver<Action>,
    state_tx: watch::Sender<HeadlessState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = match headless.client {
        Some(client) => client,
        None => ChatClient::new(&config)?,
    };
    let mut terminal = Terminal::new(TestBackend::new(headless.width, headless.height))?;

    let (reveal_tx, mut reveal_rx) = mpsc::unbounded_channel();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ExchangeResult>();
    let mut app = App::new(config, Theme::default(), reveal_tx);
    let mut requests: Vec<JoinHandle<()>> = Vec::new();
    let mut ticker = tokio::time::interval(headless.tick_rate);

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        let _ = state_tx.send(HeadlessState {
            screen_contents: buffer_to_string(terminal.backend().buffer()),
            phase: app.phase(),
            input_enabled: app.input_enabled(),
            messages: app.session().conversation().len(),
            should_quit: app.should_quit,
            show_help: app.show_help,
        });

        if app.should_quit {
            for handle in requests {
                handle.abort();
            }
            app.shutdown();
            break;
        }

        tokio::select! {
            action = action_rx.recv() => match action {
                Some(action) => {
                    if let Some(submission) = app.handle_action(action) {
                        requests.push(spawn_exchange(&client, submission, &reply_tx));
                    }
                }
                None => app.should_quit = true,
            },
            Some((token, outcome)) = reply_rx.recv() => app.settle(token, outcome),
            Some(event) = reveal_rx.recv() => app.apply_reveal(event),
            _ = ticker.tick() => app.tick(),
        }

        requests.retain(|handle| !handle.is_finished());
    }

    Ok(())
}

/// Buffer text with one line per row and trailing spaces trimmed.
pub(crate) fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut rows = Vec::with_capacity(usize::from(area.height));

    for y in area.y..area.y + area.height {
        let row: String = (area.x..area.x + area.width)
            .filter_map(|x| buffer.cell((x, y)))
            .map(ratatui::buffer::Cell::symbol)
            .collect();
        rows.push(row.trim_end().to_string());
    }

    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_engine::RevealConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WAIT: Duration = Duration::from_secs(5);

    fn config_for(server: &MockServer) -> Config {
        Config {
            reveal: RevealConfig {
                step_chars: 3,
                delay_ms: 5,
            },
            ..Config::default()
        }
        .with_base_url(&server.uri())
        .unwrap()
    }

    /// Headless options with a proxy-free client pointed at `server`.
    fn headless_for(server: &MockServer) -> HeadlessConfig {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        HeadlessConfig {
            client: Some(ChatClient::with_http_client(&config_for(server), http)),
            ..HeadlessConfig::default()
        }
    }

    async fn mock_reply(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_headless_defaults() {
        let state = HeadlessState::default();
        assert!(state.input_enabled);
        assert_eq!(state.phase, ExchangePhase::Idle);
        assert!(state.screen_contents.is_empty());

        let config = HeadlessConfig::default();
        assert_eq!((config.width, config.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert!(config.client.is_none());
    }

    #[test]
    fn test_buffer_to_string() {
        use ratatui::layout::Rect;
        use ratatui::style::Style;

        let mut buffer = Buffer::empty(Rect::new(0, 0, 10, 2));
        buffer.set_string(0, 0, "Hello", Style::default());
        buffer.set_string(0, 1, "World", Style::default());

        assert_eq!(buffer_to_string(&buffer), "Hello\nWorld");
    }

    #[tokio::test]
    async fn test_text_reply_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({ "message": "Hello" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "reply": "Hi **there**" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (mut handle, task) = run_tui_headless(config_for(&server), headless_for(&server));
        handle.type_text("  Hello  ");
        handle.send_action(Action::Submit);

        let state = handle
            .wait_for(
                |s| s.phase == ExchangePhase::Idle && s.screen_contents.contains("Hi there"),
                WAIT,
            )
            .await
            .expect("reply should be revealed");
        assert_eq!(state.messages, 2);
        assert!(state.input_enabled);
        assert!(!state.screen_contents.contains("**"));
        assert!(!state.screen_contents.contains("Thinking..."));

        handle.send_action(Action::Quit);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_server_error_shows_fixed_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (mut handle, task) = run_tui_headless(config_for(&server), headless_for(&server));
        handle.type_text("Hello");
        handle.send_action(Action::Submit);

        let state = handle
            .wait_for_text("Could not reach the server.", WAIT)
            .await
            .expect("error should be shown");
        assert!(state.input_enabled);
        assert_eq!(state.messages, 2);
        assert!(!state.screen_contents.contains("boom"));

        handle.send_action(Action::Quit);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_input_disabled_until_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "reply": "done" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (mut handle, task) = run_tui_headless(config_for(&server), headless_for(&server));
        handle.type_text("Hello");
        handle.send_action(Action::Submit);

        let waiting = handle
            .wait_for(|s| !s.input_enabled, WAIT)
            .await
            .expect("input should be disabled");
        assert!(waiting.screen_contents.contains("Waiting for a reply..."));

        // Neither typing nor a second submit gets through
        handle.type_text("again");
        handle.send_action(Action::Submit);

        let state = handle
            .wait_for(|s| s.phase == ExchangePhase::Idle && s.input_enabled, WAIT)
            .await
            .expect("input should come back");
        assert_eq!(state.messages, 2);
        assert!(!state.screen_contents.contains("again"));

        handle.send_action(Action::Quit);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_itinerary_reply_lists_flights() {
        let server = MockServer::start().await;
        mock_reply(
            &server,
            json!({ "reply": [
                { "airline": "Delta", "route": "JFK → LAX", "price": 249 },
                { "airline": "United", "route": "EWR → SFO", "price": "199.99" }
            ]}),
        )
        .await;

        let (mut handle, task) = run_tui_headless(config_for(&server), headless_for(&server));
        handle.type_text("flights please");
        handle.send_action(Action::Submit);

        let state = handle
            .wait_for_text("Flight: United | EWR → SFO | Price: $199.99", WAIT)
            .await
            .expect("itinerary should be listed");
        assert!(state
            .screen_contents
            .contains("Flight: Delta | JFK → LAX | Price: $249"));
        assert_eq!(state.messages, 3);

        handle.send_action(Action::Quit);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_quit_while_request_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "reply": "late" }))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let (mut handle, task) = run_tui_headless(config_for(&server), headless_for(&server));
        handle.type_text("Hello");
        handle.send_action(Action::Submit);
        handle
            .wait_for(|s| !s.input_enabled, WAIT)
            .await
            .expect("request should be in flight");

        handle.send_action(Action::Quit);
        tokio::time::timeout(WAIT, task)
            .await
            .expect("quit should not wait for the request")
            .unwrap()
            .unwrap();
        assert!(handle.has_quit());
    }

    #[tokio::test]
    async fn test_supplied_client_is_used() {
        let server = MockServer::start().await;
        mock_reply(&server, json!({ "reply": "from the mock" })).await;

        // The config points nowhere; only the supplied client reaches the server
        let config = Config::default()
            .with_base_url("http://127.0.0.1:9")
            .unwrap();
        let (mut handle, task) = run_tui_headless(config, headless_for(&server));
        handle.type_text("Hello");
        handle.send_action(Action::Submit);

        handle
            .wait_for_text("from the mock", WAIT)
            .await
            .expect("reply should come from the supplied client");

        handle.send_action(Action::Quit);
        task.await.unwrap().unwrap();
    }
}
