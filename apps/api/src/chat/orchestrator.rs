//! Chat orchestration: turns one user question into one `ChatOutcome`.
//!
//! Flow: credential guard → load resume → build prompt + message window →
//!       attempt loop over the upstream client → classify → outcome.
//!
//! Provider-side failures never escape as errors; every path ends in a
//! `ChatOutcome`. Only internal failures (the store) surface as `ChatError`.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::chat::prompts::build_system_prompt;
use crate::config::ProviderConfig;
use crate::llm_client::{
    ChatCompletionRequest, ChatCompletionResponse, UpstreamClient, UpstreamError, UpstreamResponse,
};
use crate::models::chat::{ChatMessage, Role};
use crate::resume::ResumeProvider;

/// Most recent history entries forwarded to the provider.
pub const HISTORY_WINDOW: usize = 20;

/// Upstream error bodies are cut to this many characters in logs.
const LOGGED_BODY_CHARS: usize = 300;

/// User-facing failure taxonomy. `Display` is the exact message shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatFailure {
    #[error("AI chat is not configured")]
    NotConfigured,

    #[error("Resume data is not available")]
    ResumeUnavailable,

    #[error("Too many requests, please wait and try again")]
    RateLimited,

    #[error("Cannot reach AI provider, check network")]
    Unreachable,

    #[error("AI service is temporarily unavailable, please try again")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Reply(String),
    Failed(ChatFailure),
}

impl ChatOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            ChatOutcome::Reply(text) => Some(text),
            ChatOutcome::Failed(_) => None,
        }
    }
}

/// Internal failures the orchestrator cannot turn into an outcome.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to load resume: {0}")]
    Resume(#[from] sqlx::Error),
}

/// How a single attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptClass {
    Success(String),
    /// 429: worth a delayed retry.
    RetryableRateLimit,
    /// Ends the loop immediately with the given failure.
    NonRetryableFailure(ChatFailure),
    /// Any other status, or a 200 without choices: next attempt, no delay.
    AmbiguousFailure,
}

/// Maps one raw attempt result to its class. Pure; no I/O and no logging.
pub fn classify(result: Result<UpstreamResponse, UpstreamError>) -> AttemptClass {
    let response = match result {
        Ok(response) => response,
        Err(UpstreamError::Connect(_)) => {
            return AttemptClass::NonRetryableFailure(ChatFailure::Unreachable)
        }
        Err(_) => return AttemptClass::NonRetryableFailure(ChatFailure::Unavailable),
    };

    match response.status {
        200 => match serde_json::from_str::<ChatCompletionResponse>(&response.body) {
            Ok(parsed) => match parsed.first_content() {
                Some(text) => AttemptClass::Success(text),
                None => AttemptClass::AmbiguousFailure,
            },
            // A 200 we cannot read is not worth a second blind attempt.
            Err(_) => AttemptClass::NonRetryableFailure(ChatFailure::Unavailable),
        },
        429 => AttemptClass::RetryableRateLimit,
        _ => AttemptClass::AmbiguousFailure,
    }
}

/// Keeps the last `HISTORY_WINDOW` entries, then drops any with empty content.
pub fn history_window(history: &[ChatMessage]) -> impl Iterator<Item = &ChatMessage> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .filter(|message| !message.content.is_empty())
}

/// `[system] + history window + [user]`, in conversation order.
pub fn build_messages(
    system_prompt: String,
    history: &[ChatMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(HISTORY_WINDOW + 2);
    messages.push(ChatMessage::new(Role::System, system_prompt));
    messages.extend(history_window(history).cloned());
    messages.push(ChatMessage::new(Role::User, user_message));
    messages
}

fn request_headers(config: &ProviderConfig, api_key: &str) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("http-referer", HeaderValue::from_str(&config.referer)?);
    headers.insert("x-title", HeaderValue::from_str(&config.title)?);
    Ok(headers)
}

/// The chat orchestrator. Holds no per-request state; cheap to share behind an `Arc`.
pub struct ChatService {
    config: ProviderConfig,
    upstream: Arc<dyn UpstreamClient>,
    resume: Arc<dyn ResumeProvider>,
}

impl ChatService {
    pub fn new(
        config: ProviderConfig,
        upstream: Arc<dyn UpstreamClient>,
        resume: Arc<dyn ResumeProvider>,
    ) -> Self {
        Self {
            config,
            upstream,
            resume,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Answers `user_message` in the context of `history` and the stored resume.
    pub async fn respond(
        &self,
        user_message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatOutcome, ChatError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!("Chat requested but OPENROUTER_API_KEY is not set");
            return Ok(ChatOutcome::Failed(ChatFailure::NotConfigured));
        };

        let resume = self.resume.get_resume().await?;
        if resume.is_empty() {
            warn!("Chat requested but no resume data is available");
            return Ok(ChatOutcome::Failed(ChatFailure::ResumeUnavailable));
        }

        let payload = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: build_messages(build_system_prompt(&resume), history, user_message),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let headers = match request_headers(&self.config, api_key) {
            Ok(headers) => headers,
            Err(e) => {
                error!("Cannot build provider headers: {e}");
                return Ok(ChatOutcome::Failed(ChatFailure::Unavailable));
            }
        };

        Ok(self.run_attempts(&headers, &payload).await)
    }

    async fn run_attempts(&self, headers: &HeaderMap, payload: &ChatCompletionRequest) -> ChatOutcome {
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let result = self.upstream.call(headers, payload).await;

            match &result {
                Ok(response) => {
                    info!(
                        "OpenRouter ({}) -> {} (attempt {attempt})",
                        self.config.model, response.status
                    );
                    if response.status != 200 && response.status != 429 {
                        let snippet: String =
                            response.body.chars().take(LOGGED_BODY_CHARS).collect();
                        warn!("OpenRouter error: {} - {snippet}", response.status);
                    }
                }
                Err(e) => warn!("OpenRouter call failed (attempt {attempt}): {e}"),
            }

            match classify(result) {
                AttemptClass::Success(text) => {
                    info!("Chat response from model: {}", self.config.model);
                    return ChatOutcome::Reply(text);
                }
                AttemptClass::RetryableRateLimit if attempt < max_attempts => {
                    warn!(
                        "Rate limited, retrying in {}ms...",
                        self.config.retry_delay.as_millis()
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                AttemptClass::RetryableRateLimit => {
                    return ChatOutcome::Failed(ChatFailure::RateLimited);
                }
                AttemptClass::NonRetryableFailure(failure) => {
                    return ChatOutcome::Failed(failure);
                }
                AttemptClass::AmbiguousFailure => {}
            }
        }

        ChatOutcome::Failed(ChatFailure::Unavailable)
    }
}
