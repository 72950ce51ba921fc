//! Configuration types for the murmur engine.
//!
//! This module defines the configuration schema: the backend endpoint,
//! how replies are presented, and the fixed strings shown to the user.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding murmur's per-project files.
pub const MURMUR_DIR: &str = ".murmur";

/// Config file name inside [`MURMUR_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Main configuration for murmur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the chat backend; requests go to `{base_url}/chat`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// How text replies are presented.
    #[serde(default)]
    pub reply_mode: ReplyMode,

    /// Typewriter reveal settings.
    #[serde(default)]
    pub reveal: RevealConfig,

    /// Request timeout in seconds. `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Header shown above assistant messages.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Header shown above user messages.
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Label shown next to the loading ellipsis.
    #[serde(default = "default_loading_text")]
    pub loading_text: String,

    /// The one message shown for every failed exchange.
    #[serde(default = "default_error_message")]
    pub error_message: String,

    /// Shown in place of an empty text reply.
    #[serde(default = "default_empty_reply_message")]
    pub empty_reply_message: String,

    /// Ring the terminal bell when a reply has finished rendering.
    #[serde(default)]
    pub bell_on_reply: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_assistant_name() -> String {
    "AI".into()
}

fn default_user_name() -> String {
    "You".into()
}

fn default_loading_text() -> String {
    "Thinking...".into()
}

fn default_error_message() -> String {
    "Could not reach the server. Check that the backend is running and try again.".into()
}

fn default_empty_reply_message() -> String {
    "I apologize, but I encountered an issue. Please try again.".into()
}

/// How a text reply is put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplyMode {
    /// Reveal the rendered reply a few characters at a time.
    #[default]
    Typewriter,
    /// Show the whole reply as soon as it arrives.
    Immediate,
}

/// Settings for the typewriter reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Rendered characters added per frame.
    #[serde(default = "default_step_chars")]
    pub step_chars: usize,

    /// Delay between frames in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_step_chars() -> usize {
    3
}

fn default_delay_ms() -> u64 {
    70
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            step_chars: default_step_chars(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RevealConfig {
    /// Delay between frames, never shorter than 1ms.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.max(1))
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validated()
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Default config path for a working directory.
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(MURMUR_DIR).join(CONFIG_FILE)
    }

    /// Load `.murmur/config.json` under `dir`, or defaults if it doesn't exist.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::default_path(dir);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Replace the base URL, validating it.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = base_url.to_string();
        self.validated()
    }

    /// The chat endpoint URL.
    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }

    /// Request timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Check values and normalize the base URL.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let host = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"));
        if host.is_none_or(str::is_empty) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url));
        }
        self.base_url = trimmed.to_string();

        if self.reveal.step_chars == 0 {
            return Err(ConfigError::Invalid(
                "reveal.step_chars must be at least 1".into(),
            ));
        }
        if self.reveal.delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "reveal.delay_ms must be at least 1".into(),
            ));
        }

        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            reply_mode: ReplyMode::default(),
            reveal: RevealConfig::default(),
            request_timeout_secs: None,
            assistant_name: default_assistant_name(),
            user_name: default_user_name(),
            loading_text: default_loading_text(),
            error_message: default_error_message(),
            empty_reply_message: default_empty_reply_message(),
            bell_on_reply: false,
        }
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Base URL is not an http(s) URL.
    #[error("Invalid base URL: {0:?} (expected http:// or https://)")]
    InvalidBaseUrl(String),

    /// Some other value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}
