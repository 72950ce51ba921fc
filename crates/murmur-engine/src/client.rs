//! HTTP client for the chat backend.

use crate::config::Config;
use crate::protocol::{ChatRequest, ChatResponse};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Sends chat requests to `{base_url}/chat`.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    url: String,
    timeout: Option<Duration>,
}

impl ChatClient {
    /// Build a client for the configured backend.
    pub fn new(config: &Config) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ChatError::Transport)?;
        Ok(Self::with_http_client(config, http))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http_client(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            url: config.chat_url(),
            timeout: config.request_timeout(),
        }
    }

    /// The endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one message and decode the reply.
    ///
    /// Transport failures, non-2xx statuses, timeouts and bodies that are not a
    /// valid [`ChatResponse`] all come back as `Err`.
    pub async fn send(&self, message: &str) -> Result<ChatResponse, ChatError> {
        let start = Instant::now();
        let request = ChatRequest::new(message);

        tracing::debug!(url = %self.url, len = message.len(), "sending chat request");

        let result = match self.timeout {
            Some(limit) => timeout(limit, self.exchange(&request))
                .await
                .map_err(|_| ChatError::Timeout(limit))?,
            None => self.exchange(&request).await,
        };

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::debug!(duration_ms, "chat request completed"),
            Err(e) => tracing::warn!(duration_ms, error = %e, "chat request failed"),
        }

        result
    }

    async fn exchange(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(ChatError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(ChatError::Transport)?;
        serde_json::from_slice(&body).map_err(ChatError::Malformed)
    }
}

/// Errors from a chat exchange.
///
/// Callers show users one fixed message for all of these; the variants exist for logs.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Connection, DNS or body read failure.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned HTTP {0}")]
    Status(u16),

    /// Response body was not `{"reply": ...}`.
    #[error("Malformed response: {0}")]
    Malformed(#[source] serde_json::Error),

    /// No response within the configured limit.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}
