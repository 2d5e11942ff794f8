use tracing::info;

use crate::errors::AppError;
use crate::evaluation::prompts::fill;
use crate::llm_client::{prompts::JSON_ONLY_SYSTEM, LlmClient};
use crate::models::resume::ResumeProfile;
use crate::resume::prompts::RESUME_PARSE_PROMPT_TEMPLATE;

/// Résumés longer than this are cut before being sent to the backend.
const MAX_RESUME_CHARS: usize = 20_000;

/// Extracts a structured profile from résumé text via the LLM.
pub async fn parse_resume(resume_text: &str, llm: &LlmClient) -> Result<ResumeProfile, AppError> {
    let text = prepare_text(resume_text)?;
    let prompt = fill(RESUME_PARSE_PROMPT_TEMPLATE, &[("resume_text", text.as_str())]);

    let profile = llm
        .call_json::<ResumeProfile>(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Resume parsing failed: {e}")))?;

    info!(
        "Parsed resume: {} skills, {} positions, {} projects",
        profile.skills.len(),
        profile.experience.len(),
        profile.projects.len()
    );
    Ok(profile)
}

/// Trims the text and rejects blank input before any backend call.
fn prepare_text(resume_text: &str) -> Result<String, AppError> {
    let trimmed = resume_text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Resume text cannot be empty".to_string()));
    }
    Ok(trimmed.chars().take(MAX_RESUME_CHARS).collect())
}
