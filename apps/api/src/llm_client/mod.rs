//! LLM client: single-attempt transport to the OpenRouter chat-completions API.
//!
//! RULE: no retries here. The chat orchestrator owns the attempt budget and
//! backoff; this module performs exactly one POST per `call`.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::models::chat::ChatMessage;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("cannot connect to provider: {0}")]
    Connect(String),

    #[error("provider request timed out")]
    Timeout,

    #[error("provider request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        // A connect timeout is a timeout, not an unreachable host.
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_connect() {
            UpstreamError::Connect(e.to_string())
        } else {
            UpstreamError::Other(e.to_string())
        }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if the provider returned any.
    pub fn first_content(self) -> Option<String> {
        self.choices.into_iter().next().map(|c| c.message.content)
    }
}

/// Raw status and body of one provider call. Interpretation is left to the caller.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// One network attempt against the provider. Swapped for a stub in tests.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn call(
        &self,
        headers: &HeaderMap,
        payload: &ChatCompletionRequest,
    ) -> Result<UpstreamResponse, UpstreamError>;
}

#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    url: String,
}

impl OpenRouterClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(config.request_timeout).build()?,
            url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl UpstreamClient for OpenRouterClient {
    async fn call(
        &self,
        headers: &HeaderMap,
        payload: &ChatCompletionRequest,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .headers(headers.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Provider responded {status} ({} bytes)", body.len());

        Ok(UpstreamResponse { status, body })
    }
}
