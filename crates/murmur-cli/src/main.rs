//! murmur CLI: terminal chat client for a `/chat` backend

use clap::{Parser, Subcommand};
use murmur_engine::{ChatClient, ChatResponse, Config, ConfigError, Reply, MURMUR_DIR};
use murmur_tui::Theme;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Chat with a backend from the terminal
#[derive(Parser)]
#[command(name = "murmur")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: .murmur/config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Color theme: mocha, latte or high-contrast
    #[arg(long, global = true, default_value = "mocha")]
    theme: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat TUI (default when no command specified)
    Tui,

    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,

        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default .murmur/config.json
    Init,

    /// Print the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

const LOG_FILE: &str = "murmur.log";

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "warn,murmur_engine=info,murmur_tui=info";

fn main() {
    let cli = Cli::parse();
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => fail(format!("cannot read working directory: {e}")),
    };

    match cli.command {
        None | Some(Commands::Tui) => {
            init_file_logging(&cwd);
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref(), &cwd)
                .unwrap_or_else(|e| fail(e));
            let Some(theme) = Theme::by_name(&cli.theme) else {
                fail(format!("unknown theme: {}", cli.theme));
            };
            let rt = runtime();
            if let Err(e) = rt.block_on(murmur_tui::run_tui(config, theme)) {
                fail(e);
            }
        }
        Some(Commands::Send { message, json }) => {
            init_stderr_logging();
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref(), &cwd)
                .unwrap_or_else(|e| fail(e));
            let client = ChatClient::new(&config).unwrap_or_else(|e| fail(e));
            let rt = runtime();
            match rt.block_on(cmd_send(&client, &config, &message, json)) {
                Ok(lines) => {
                    for line in lines {
                        println!("{line}");
                    }
                }
                Err(e) => fail(e),
            }
        }
        Some(Commands::Init) => match cmd_init(&cwd) {
            Ok(Some(path)) => println!("Created {}", path.display()),
            Ok(None) => println!(
                "Config already exists at {}",
                Config::default_path(&cwd).display()
            ),
            Err(e) => fail(format!("Failed to write config: {e}")),
        },
        Some(Commands::Config { json }) => {
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref(), &cwd)
                .unwrap_or_else(|e| fail(e));
            match describe_config(&config, json) {
                Ok(text) => println!("{text}"),
                Err(e) => fail(e),
            }
        }
    }
}

/// Print an error and exit with status 1.
fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap_or_else(|e| fail(format!("tokio runtime: {e}")))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to `.murmur/murmur.log` so output never lands on the TUI screen.
fn init_file_logging(cwd: &Path) {
    let dir = cwd.join(MURMUR_DIR);
    let file = std::fs::create_dir_all(&dir).and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))
    });
    // Without a log file the TUI runs unlogged
    if let Ok(file) = file {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    }
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve configuration: explicit file, else discovered file, else defaults,
/// then the `--base-url` override.
fn load_config(
    path: Option<&Path>,
    base_url: Option<&str>,
    cwd: &Path,
) -> Result<Config, ConfigError> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::discover(cwd)?,
    };
    match base_url {
        Some(url) => config.with_base_url(url),
        None => Ok(config),
    }
}

/// Text lines printed for a reply.
fn reply_lines(response: &ChatResponse, config: &Config) -> Vec<String> {
    let empty = match &response.reply {
        Reply::Text(text) => text.trim().is_empty(),
        Reply::Itinerary(items) => items.is_empty(),
    };
    if empty {
        vec![config.empty_reply_message.clone()]
    } else {
        response.reply.lines()
    }
}

/// Send one message and return the lines to print.
async fn cmd_send(
    client: &ChatClient,
    config: &Config,
    message: &str,
    json: bool,
) -> Result<Vec<String>, String> {
    let message = message.trim();
    if message.is_empty() {
        return Err("message is empty".into());
    }

    let response = match client.send(message).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "send failed");
            return Err(config.error_message.clone());
        }
    };

    if json {
        let text = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
        Ok(vec![text])
    } else {
        Ok(reply_lines(&response, config))
    }
}

/// Write the default config under `cwd`. Returns `None` if one already exists.
fn cmd_init(cwd: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let path = Config::default_path(cwd);
    if path.exists() {
        return Ok(None);
    }
    Config::default().save(&path)?;
    Ok(Some(path))
}

fn describe_config(config: &Config, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string_pretty(config);
    }

    let timeout = config
        .request_timeout_secs
        .map_or_else(|| "none".to_string(), |s| format!("{s}s"));
    let mode = serde_json::to_value(config.reply_mode)?;
    Ok([
        format!("endpoint:       {}", config.chat_url()),
        format!("reply mode:     {}", mode.as_str().unwrap_or_default()),
        format!(
            "reveal:         {} chars every {}ms",
            config.reveal.step_chars, config.reveal.delay_ms
        ),
        format!("timeout:        {timeout}"),
        format!("names:          {} / {}", config.user_name, config.assistant_name),
        format!("bell on reply:  {}", config.bell_on_reply),
    ]
    .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use murmur_engine::{ItineraryItem, Price};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_tui() {
        let cli = Cli::try_parse_from(["murmur"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.theme, "mocha");
    }

    #[test]
    fn test_send_with_global_flags() {
        let cli = Cli::try_parse_from([
            "murmur",
            "send",
            "hello there",
            "--json",
            "--base-url",
            "http://example.test",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://example.test"));
        match cli.command {
            Some(Commands::Send { message, json }) => {
                assert_eq!(message, "hello there");
                assert!(json);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_load_config_defaults_and_override() {
        let dir = TempDir::new().unwrap();
        let config = load_config(None, None, dir.path()).unwrap();
        assert_eq!(config, Config::default());

        let config = load_config(None, Some("https://chat.example.com/"), dir.path()).unwrap();
        assert_eq!(config.chat_url(), "https://chat.example.com/chat");

        assert!(load_config(None, Some("ftp://nope"), dir.path()).is_err());
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"base_url": "http://10.0.0.5:9000"}"#).unwrap();

        let config = load_config(Some(&path), None, dir.path()).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.assistant_name, "AI");
    }

    #[test]
    fn test_load_config_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_config(Some(&missing), None, dir.path()),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_init_writes_once() {
        let dir = TempDir::new().unwrap();
        let created = cmd_init(dir.path()).unwrap();
        assert_eq!(created, Some(Config::default_path(dir.path())));
        assert_eq!(cmd_init(dir.path()).unwrap(), None);

        let loaded = load_config(None, None, dir.path()).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_reply_lines() {
        let config = Config::default();
        let text = ChatResponse {
            reply: Reply::Text("Hi **there**".into()),
        };
        assert_eq!(reply_lines(&text, &config), vec!["Hi **there**"]);

        let blank = ChatResponse {
            reply: Reply::Text(" ".into()),
        };
        assert_eq!(reply_lines(&blank, &config), vec![config.empty_reply_message.clone()]);

        let itinerary = ChatResponse {
            reply: Reply::Itinerary(vec![ItineraryItem {
                airline: "Delta".into(),
                route: "JFK → LAX".into(),
                price: Price::Amount(249.into()),
            }]),
        };
        assert_eq!(
            reply_lines(&itinerary, &config),
            vec!["Flight: Delta | JFK → LAX | Price: $249"]
        );
    }

    #[test]
    fn test_describe_config() {
        let text = describe_config(&Config::default(), false).unwrap();
        assert!(text.contains("http://localhost:8000/chat"));
        assert!(text.contains("typewriter"));
        assert!(text.contains("timeout:        none"));

        let json = describe_config(&Config::default(), true).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Config::default());
    }

    fn client_for(config: &Config) -> ChatClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        ChatClient::with_http_client(config, http)
    }

    async fn server_replying(body: serde_json::Value) -> (MockServer, Config) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let config = Config::default().with_base_url(&server.uri()).unwrap();
        (server, config)
    }

    #[tokio::test]
    async fn test_send_rejects_blank_message() {
        let config = Config::default();
        let err = cmd_send(&client_for(&config), &config, "   ", false)
            .await
            .unwrap_err();
        assert_eq!(err, "message is empty");
    }

    #[tokio::test]
    async fn test_send_prints_text_reply() {
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
        let config = Config::default().with_base_url(&server.uri()).unwrap();

        let lines = cmd_send(&client_for(&config), &config, "  Hello ", false)
            .await
            .unwrap();
        assert_eq!(lines, vec!["Hi **there**"]);
    }

    #[tokio::test]
    async fn test_send_prints_one_line_per_flight() {
        let (_server, config) = server_replying(json!({ "reply": [
            { "airline": "Delta", "route": "JFK → LAX", "price": 249 },
            { "airline": "United", "route": "EWR → SFO", "price": "199.99" }
        ]}))
        .await;

        let lines = cmd_send(&client_for(&config), &config, "flights", false)
            .await
            .unwrap();
        assert_eq!(
            lines,
            vec![
                "Flight: Delta | JFK → LAX | Price: $249",
                "Flight: United | EWR → SFO | Price: $199.99",
            ]
        );
    }

    #[tokio::test]
    async fn test_send_empty_reply_prints_fallback() {
        let (_server, config) = server_replying(json!({ "reply": "" })).await;

        let lines = cmd_send(&client_for(&config), &config, "Hello", false)
            .await
            .unwrap();
        assert_eq!(lines, vec![config.empty_reply_message.clone()]);
    }

    #[tokio::test]
    async fn test_send_json_prints_response() {
        let (_server, config) = server_replying(json!({ "reply": "Hi **there**" })).await;

        let lines = cmd_send(&client_for(&config), &config, "Hello", true)
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        let printed: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(printed, json!({ "reply": "Hi **there**" }));
    }

    #[tokio::test]
    async fn test_send_server_error_reports_fixed_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let config = Config::default().with_base_url(&server.uri()).unwrap();

        let err = cmd_send(&client_for(&config), &config, "Hello", false)
            .await
            .unwrap_err();
        assert_eq!(err, config.error_message);
    }

    #[tokio::test]
    async fn test_send_failure_reports_fixed_message() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = Config::default()
            .with_base_url(&format!("http://127.0.0.1:{port}"))
            .unwrap();

        let err = cmd_send(&client_for(&config), &config, "Hello", false)
            .await
            .unwrap_err();
        assert_eq!(err, config.error_message);
    }
}
