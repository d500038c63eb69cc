//! Chat-completion client for the hosted language model.
//!
//! Single-turn requests only: one system instruction, one user prompt. No
//! streaming, no retries, no conversation history.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::PixiError;

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// One single-turn completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
}

/// The model's completion, plus bookkeeping for logs.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Seam between the pipeline branches and the hosted model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier sent on the wire.
    fn model_id(&self) -> &str;

    /// Send a completion request and return the first choice's content.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, PixiError>;
}

/// Groq chat-completions client (OpenAI-compatible wire shape).
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireUsage {
    total_tokens: Option<u64>,
}

#[async_trait]
impl ChatModel for GroqClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, PixiError> {
        let start = Instant::now();

        let body = WireRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
        };

        tracing::debug!(model = %self.model, "Sending chat-completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PixiError::Model(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(PixiError::Model(format!("{}: {}", status, error_body)));
        }

        let decoded: WireResponse = response
            .json()
            .await
            .map_err(|e| PixiError::Model(format!("malformed response: {}", e)))?;

        let tokens_used = decoded
            .usage
            .as_ref()
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        // Only the first choice's message content is consumed.
        let content = decoded
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PixiError::Model("response contained no choices".to_string()))?;

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(tokens = tokens_used, latency_ms, "Chat completion received");

        Ok(ChatReply {
            content,
            model: self.model.clone(),
            tokens_used,
            latency_ms,
        })
    }
}
