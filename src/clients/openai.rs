use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ChatConfig;

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// One message in a completion request, in the wire shape the chat
/// completions API expects.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: &'static str,
    pub content: String,
}

impl ChatTurn {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("completion response had no content")]
    EmptyResponse,
}

/// Seam between the chat feature and the hosted language-model API.
/// Production uses [`OpenAiClient`]; tests inject canned or failing stubs.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Free-form completion over the given conversation.
    async fn complete(&self, turns: Vec<ChatTurn>) -> Result<String, CompletionError>;

    /// Completion constrained to a JSON object; returns the raw content
    /// string for the caller to parse.
    async fn complete_json(&self, turns: Vec<ChatTurn>) -> Result<String, CompletionError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    config: ChatConfig,
}

impl OpenAiClient {
    /// A missing API key is not a startup error; every call simply fails
    /// with [`CompletionError::MissingApiKey`] and the chat feature degrades.
    #[must_use]
    pub fn new(api_key: Option<String>, config: ChatConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            config,
        }
    }

    async fn post_completion(
        &self,
        body: serde_json::Value,
    ) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_ref().ok_or(CompletionError::MissingApiKey)?;

        let response = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api { status, body });
        }

        let response: CompletionResponse = response.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, turns: Vec<ChatTurn>) -> Result<String, CompletionError> {
        self.post_completion(json!({
            "model": self.config.model,
            "messages": turns,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        }))
        .await
    }

    async fn complete_json(&self, turns: Vec<ChatTurn>) -> Result<String, CompletionError> {
        self.post_completion(json!({
            "model": self.config.model,
            "messages": turns,
            "max_tokens": self.config.ideas_max_tokens,
            "response_format": { "type": "json_object" },
        }))
        .await
    }
}
