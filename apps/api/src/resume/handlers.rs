use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::resume::ResumeProfile;
use crate::resume::{parser::parse_resume, store::insert_resume};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ResumeUploadRequest {
    pub user_id: i64,
    pub text: String,
}

#[derive(Serialize)]
pub struct ResumeUploadResponse {
    pub resume_id: i64,
    pub user_id: i64,
    pub uploaded_at: DateTime<Utc>,
    pub parsed_data: ResumeProfile,
    pub skills_found: usize,
    pub experience_count: usize,
}

/// POST /api/v1/resumes
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Json(req): Json<ResumeUploadRequest>,
) -> Result<Json<ResumeUploadResponse>, AppError> {
    let profile = parse_resume(&req.text, &state.llm).await?;
    let row = insert_resume(&state.db, req.user_id, req.text.trim(), &profile).await?;

    Ok(Json(ResumeUploadResponse {
        resume_id: row.id,
        user_id: row.user_id,
        uploaded_at: row.created_at,
        skills_found: profile.skills.len(),
        experience_count: profile.experience.len(),
        parsed_data: profile,
    }))
}
