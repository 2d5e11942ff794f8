use sqlx::types::Json;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::resume::{ResumeProfile, ResumeRow};

/// Stores a parsed résumé and returns its row.
pub async fn insert_resume(
    pool: &PgPool,
    user_id: i64,
    text_content: &str,
    profile: &ResumeProfile,
) -> Result<ResumeRow, AppError> {
    let row: ResumeRow = sqlx::query_as(
        r#"
        INSERT INTO resumes (user_id, text_content, parsed_data)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, parsed_data, created_at
        "#,
    )
    .bind(user_id)
    .bind(text_content)
    .bind(Json(profile))
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Loads a résumé owned by `user_id`. Another user's résumé reads as missing.
pub async fn get_resume(pool: &PgPool, id: i64, user_id: i64) -> Result<ResumeRow, AppError> {
    let row: Option<ResumeRow> = sqlx::query_as(
        "SELECT id, user_id, parsed_data, created_at FROM resumes WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}
