use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::resume::ResumeProvider;
use crate::state::AppState;

/// GET /api/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
) -> Result<Json<ResumeDocument>, AppError> {
    let resume = state.store.get_resume().await?;
    if resume.is_empty() {
        return Err(AppError::NotFound("Resume data not found".to_string()));
    }
    Ok(Json(resume))
}
