//! OpenAI chat-completions client.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::OpenAiConfig;

const TEMPERATURE: f32 = 0.7;

/// Upstream answer, passed back to the caller verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("OPENAI_API_KEY is not configured")]
    NotConfigured,
    #[error("chat completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: Vec<Value>) -> Result<ChatReply, ChatError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    temperature: f32,
}

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, messages: Vec<Value>) -> Result<ChatReply, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
        };

        debug!(model = %self.model, messages = request.messages.len(), "sending chat completion");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            warn!(status, "chat completion answered with an error status");
        }
        let body: Value = response.json().await?;
        Ok(ChatReply { status, body })
    }
}
