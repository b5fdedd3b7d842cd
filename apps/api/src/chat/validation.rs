use serde::Deserialize;
use thiserror::Error;

use crate::errors::AppError;
use crate::models::chat::{ChatMessage, Role};

pub const MAX_MESSAGE_CHARS: usize = 2000;
pub const MAX_HISTORY_ITEMS: usize = 50;
pub const MAX_CONTENT_CHARS: usize = 4000;
pub const MAX_SESSION_ID_CHARS: usize = 128;

/// Body of `POST /api/chat`. Unknown fields are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    /// Enables the append-only chat log for this conversation.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryItem {
    pub role: HistoryRole,
    pub content: String,
    /// Sent by the frontend; not used server-side.
    #[serde(default)]
    #[allow(dead_code)]
    pub timestamp: Option<String>,
}

/// Callers may only replay their own and the assistant's turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

impl From<HistoryRole> for Role {
    fn from(role: HistoryRole) -> Self {
        match role {
            HistoryRole::User => Role::User,
            HistoryRole::Assistant => Role::Assistant,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message must be at most 2000 characters")]
    MessageTooLong,

    #[error("History too long (max 50 messages)")]
    HistoryTooLong,

    #[error("history[{0}].content must be between 1 and 4000 characters")]
    HistoryContentLength(usize),

    #[error("session_id must be between 1 and 128 characters")]
    SessionIdLength,
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::UnprocessableEntity(e.to_string())
    }
}

/// A request that passed schema checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedChat {
    /// Nothing left after trimming; answered without calling the orchestrator.
    Blank,
    Ready {
        message: String,
        history: Vec<ChatMessage>,
        session_id: Option<String>,
    },
}

/// Checks lengths and caps, trims the message and normalizes history.
///
/// Size violations are errors (422). A blank message is not an error: it
/// becomes `ValidatedChat::Blank` so the caller can answer it politely.
pub fn validate_chat_request(req: ChatRequest) -> Result<ValidatedChat, ValidationError> {
    if req.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ValidationError::MessageTooLong);
    }
    if req.history.len() > MAX_HISTORY_ITEMS {
        return Err(ValidationError::HistoryTooLong);
    }
    for (i, item) in req.history.iter().enumerate() {
        let len = item.content.chars().count();
        if len == 0 || len > MAX_CONTENT_CHARS {
            return Err(ValidationError::HistoryContentLength(i));
        }
    }
    if let Some(session_id) = &req.session_id {
        let len = session_id.chars().count();
        if len == 0 || len > MAX_SESSION_ID_CHARS {
            return Err(ValidationError::SessionIdLength);
        }
    }

    let message = req.message.trim();
    if message.is_empty() {
        return Ok(ValidatedChat::Blank);
    }

    let history = req
        .history
        .into_iter()
        .map(|item| ChatMessage::new(item.role.into(), item.content))
        .collect();

    Ok(ValidatedChat::Ready {
        message: message.to_string(),
        history,
        session_id: req.session_id,
    })
}
