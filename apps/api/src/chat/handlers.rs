use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use tracing::{error, warn};

use crate::chat::orchestrator::ChatOutcome;
use crate::chat::validation::{validate_chat_request, ChatRequest, ValidatedChat};
use crate::errors::AppError;
use crate::models::chat::Role;
use crate::resume::store::ResumeStore;
use crate::state::AppState;

pub const BLANK_MESSAGE: &str = "Please enter a question.";
pub const TIMEOUT_MESSAGE: &str = "AI is taking too long. Please try again.";
pub const INTERNAL_MESSAGE: &str = "Something went wrong. Please try again.";

/// `response` is empty whenever `error` is set.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub error: Option<String>,
}

impl ChatResponse {
    fn reply(text: String) -> Self {
        Self {
            response: text,
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            response: String::new(),
            error: Some(message.into()),
        }
    }
}

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload?;

    let (message, history, session_id) = match validate_chat_request(req)? {
        ValidatedChat::Blank => return Ok(Json(ChatResponse::error(BLANK_MESSAGE))),
        ValidatedChat::Ready {
            message,
            history,
            session_id,
        } => (message, history, session_id),
    };

    let result = tokio::time::timeout(state.chat_timeout, state.chat.respond(&message, &history)).await;

    let response = match result {
        Err(_) => {
            warn!("Chat timed out after {}s", state.chat_timeout.as_secs());
            ChatResponse::error(TIMEOUT_MESSAGE)
        }
        Ok(Err(e)) => {
            error!("Chat error: {e}");
            ChatResponse::error(INTERNAL_MESSAGE)
        }
        Ok(Ok(outcome)) => {
            if let Some(session_id) = session_id {
                spawn_chat_log(state.store.clone(), session_id, message, &outcome);
            }
            match outcome {
                ChatOutcome::Reply(text) => ChatResponse::reply(text),
                ChatOutcome::Failed(failure) => ChatResponse::error(failure.to_string()),
            }
        }
    };

    Ok(Json(response))
}

/// Fire-and-forget: the caller's response never waits on or fails because of the log.
fn spawn_chat_log(store: ResumeStore, session_id: String, question: String, outcome: &ChatOutcome) {
    let reply = outcome.text().map(str::to_owned);
    tokio::spawn(async move {
        if let Err(e) = store
            .append_chat_message(&session_id, Role::User, &question)
            .await
        {
            warn!("Failed to log chat message for session {session_id}: {e}");
            return;
        }
        if let Some(reply) = reply {
            if let Err(e) = store
                .append_chat_message(&session_id, Role::Assistant, &reply)
                .await
            {
                warn!("Failed to log chat reply for session {session_id}: {e}");
            }
        }
    });
}
