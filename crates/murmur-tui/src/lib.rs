//! murmur-tui: Terminal front end for the murmur chat client
//!
//! This crate provides:
//! - The conversation pane with markdown rendering and typewriter reveal
//! - An auto-growing input bar with history
//! - Headless mode for testing without a terminal

mod app;
pub mod conversation;
mod event;
pub mod headless;
pub mod text;
pub mod theme;
#[cfg(test)]
pub mod test_utils;
mod ui;
pub mod widgets;

pub use app::App;
pub use event::{key_to_action, mouse_to_action, Action, Event, EventHandler};
pub use murmur_engine;
pub use theme::Theme;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use murmur_engine::{ChatClient, ChatError, ChatResponse, Config, ExchangeToken, Submission};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Tick rate for animations while idle.
const TICK_RATE: Duration = Duration::from_millis(150);

/// Outcome of one request, tagged with its exchange.
pub(crate) type ExchangeResult = (ExchangeToken, Result<ChatResponse, ChatError>);

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen,
            ShowCursor
        );
    }
}

/// Run the interactive chat until the user quits.
pub async fn run_tui(config: Config, theme: Theme) -> Result<(), Box<dyn std::error::Error>> {
    let client = ChatClient::new(&config)?;
    tracing::info!(url = client.url(), "starting tui");

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (reveal_tx, reveal_rx) = mpsc::unbounded_channel();
    let mut app = App::new(config, theme, reveal_tx);
    let mut events = EventHandler::new(TICK_RATE);

    let result = run_loop(&mut terminal, &mut app, &client, &mut events, reveal_rx).await;

    terminal.show_cursor()?;
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &ChatClient,
    events: &mut EventHandler,
    mut reveal_rx: mpsc::UnboundedReceiver<murmur_engine::RevealEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ExchangeResult>();
    let mut requests: Vec<JoinHandle<()>> = Vec::new();

    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;
        if app.take_bell() {
            let backend = terminal.backend_mut();
            backend.write_all(b"\x07")?;
            backend.flush()?;
        }

        tokio::select! {
            event = events.next() => match event {
                Some(Event::Key(key)) => {
                    if let Some(submission) = app.handle_action(key_to_action(key)) {
                        requests.push(spawn_exchange(client, submission, &reply_tx));
                    }
                }
                Some(Event::Mouse(mouse)) => {
                    app.handle_action(mouse_to_action(mouse));
                }
                Some(Event::Paste(text)) => app.paste(&text),
                Some(Event::Tick) => app.tick(),
                // The next draw picks up the new size
                Some(Event::Resize(..)) => {}
                None => app.should_quit = true,
            },
            Some((token, outcome)) = reply_rx.recv() => app.settle(token, outcome),
            Some(event) = reveal_rx.recv() => app.apply_reveal(event),
        }

        requests.retain(|handle| !handle.is_finished());

        if app.should_quit {
            for handle in requests {
                handle.abort();
            }
            app.shutdown();
            break;
        }
    }

    Ok(())
}

/// Send a submission on a background task; its result arrives on `reply_tx`.
pub(crate) fn spawn_exchange(
    client: &ChatClient,
    submission: Submission,
    reply_tx: &mpsc::UnboundedSender<ExchangeResult>,
) -> JoinHandle<()> {
    let client = client.clone();
    let reply_tx = reply_tx.clone();
    tokio::spawn(async move {
        let outcome = client.send(&submission.request.message).await;
        let _ = reply_tx.send((submission.token, outcome));
    })
}

/// Returns the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
