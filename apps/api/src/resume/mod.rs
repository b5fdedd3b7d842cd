pub mod handlers;
pub mod store;

use async_trait::async_trait;

use crate::models::resume::ResumeDocument;

/// Read-only source of resume data for the chat orchestrator.
///
/// Implementations are read fresh on every call; nothing is cached between requests.
#[async_trait]
pub trait ResumeProvider: Send + Sync {
    async fn get_resume(&self) -> Result<ResumeDocument, sqlx::Error>;
}
