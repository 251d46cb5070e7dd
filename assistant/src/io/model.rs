//! Chat-completions client for the remote model.
//!
//! The session only needs "submit history, receive assistant text or fail",
//! captured by [`ModelClient`]. Tests use scripted clients.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::conversation::{Message, decode_content};
use crate::io::settings::Settings;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model request timed out")]
    Timeout,

    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Reply was not JSON or had no `choices[0].message.content`.
    #[error("malformed model reply")]
    Malformed { raw: String },
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Submit the conversation, receive the assistant's reply text.
pub trait ModelClient {
    fn complete(&self, messages: &[Message]) -> Result<String, ModelError>;
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(api_key: &str, settings: &Settings) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

impl ModelClient for OpenAiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model, messages = messages.len()))]
    fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "model request rejected");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(bytes = body.len(), "model reply received");
        parse_reply(&body)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Extract and percent-decode `choices[0].message.content`.
///
/// The model sees encoded history and may answer in kind, so its reply is
/// decoded before anything else looks at it.
pub fn parse_reply(raw: &str) -> Result<String, ModelError> {
    let malformed = || ModelError::Malformed {
        raw: raw.to_string(),
    };
    let parsed: ChatResponse = serde_json::from_str(raw).map_err(|_| malformed())?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| decode_content(&content))
        .ok_or_else(malformed)
}
