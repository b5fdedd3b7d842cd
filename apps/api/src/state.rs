use std::sync::Arc;
use std::time::Duration;

use crate::chat::orchestrator::ChatService;
use crate::resume::store::ResumeStore;

/// Overall deadline for one chat request, wrapping every upstream attempt and backoff.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(45);

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: ResumeStore,
    pub chat: Arc<ChatService>,
    /// Gateway deadline for `POST /api/chat`. The orchestrator does not see it.
    pub chat_timeout: Duration,
}
