//! Session persistence.
//!
//! One row per interview: scalar columns plus a single typed JSONB blob holding
//! the answer history and the overall evaluation. Rows are validated as they are
//! read; a blob that does not deserialize, or that breaks the completion
//! invariant, surfaces as `SessionError::Corrupt`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::error;

use crate::errors::{AppError, SessionError};
use crate::models::language::Language;
use crate::models::session::{EvaluationRecord, InterviewRow, InterviewSession};

const SELECT_INTERVIEW: &str = "SELECT id, user_id, language, start_time, end_time, transcript, evaluation, report_key FROM interviews";

/// Storage seam for sessions. `SessionManager` holds an `Arc<dyn SessionStore>`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts a CREATED session and returns it with its assigned id.
    async fn create(
        &self,
        user_id: i64,
        language: Language,
        started_at: DateTime<Utc>,
    ) -> Result<InterviewSession, AppError>;

    async fn load(&self, id: i64) -> Result<InterviewSession, AppError>;

    /// Overwrites the mutable part of a session: end time, transcript and blob.
    async fn save(&self, session: &InterviewSession) -> Result<(), AppError>;

    /// All of a user's sessions, oldest first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<InterviewSession>, AppError>;

    async fn set_report_key(&self, id: i64, report_key: &str) -> Result<(), AppError>;
}

/// Postgres-backed store over the `interviews` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(
        &self,
        user_id: i64,
        language: Language,
        started_at: DateTime<Utc>,
    ) -> Result<InterviewSession, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO interviews (user_id, language, start_time, transcript, evaluation)
            VALUES ($1, $2, $3, '', $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(language.code())
        .bind(started_at)
        .bind(Json(EvaluationRecord::default()))
        .fetch_one(&self.pool)
        .await?;

        Ok(InterviewSession::new(id, user_id, language, started_at))
    }

    async fn load(&self, id: i64) -> Result<InterviewSession, AppError> {
        let row: Option<InterviewRow> = sqlx::query_as(&format!("{SELECT_INTERVIEW} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or(SessionError::NotFound(id))?;
        Ok(InterviewSession::try_from(row)?)
    }

    async fn save(&self, session: &InterviewSession) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE interviews
            SET end_time = $2, transcript = $3, evaluation = $4
            WHERE id = $1 AND end_time IS NULL
            "#,
        )
        .bind(session.id)
        .bind(session.ended_at)
        .bind(&session.transcript)
        .bind(Json(session.evaluation_record()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing updated: either the row is gone or another writer completed it.
        let completed: Option<bool> =
            sqlx::query_scalar("SELECT end_time IS NOT NULL FROM interviews WHERE id = $1")
                .bind(session.id)
                .fetch_optional(&self.pool)
                .await?;
        Err(match completed {
            Some(true) => SessionError::AlreadyCompleted(session.id),
            _ => SessionError::NotFound(session.id),
        }
        .into())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<InterviewSession>, AppError> {
        let rows: Vec<InterviewRow> = sqlx::query_as(&format!(
            "{SELECT_INTERVIEW} WHERE user_id = $1 ORDER BY start_time ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        // A corrupt row must not hide the rest of the user's history.
        let sessions = rows
            .into_iter()
            .filter_map(|row| match InterviewSession::try_from(row) {
                Ok(session) => Some(session),
                Err(e) => {
                    error!("Skipping interview in listing: {e}");
                    None
                }
            })
            .collect();
        Ok(sessions)
    }

    async fn set_report_key(&self, id: i64, report_key: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE interviews SET report_key = $2 WHERE id = $1")
            .bind(id)
            .bind(report_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! Map-backed store for manager tests. Every call yields to the scheduler
    //! first so unserialized read-modify-write sequences would interleave.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};

    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemorySessionStore {
        rows: Mutex<HashMap<i64, InterviewSession>>,
        next_id: AtomicI64,
    }

    impl InMemorySessionStore {
        /// Stores a session as-is, bypassing `create`.
        pub async fn insert(&self, session: InterviewSession) {
            self.rows.lock().await.insert(session.id, session);
        }
    }

    #[async_trait]
    impl SessionStore for InMemorySessionStore {
        async fn create(
            &self,
            user_id: i64,
            language: Language,
            started_at: DateTime<Utc>,
        ) -> Result<InterviewSession, AppError> {
            tokio::task::yield_now().await;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let session = InterviewSession::new(id, user_id, language, started_at);
            self.rows.lock().await.insert(id, session.clone());
            Ok(session)
        }

        async fn load(&self, id: i64) -> Result<InterviewSession, AppError> {
            tokio::task::yield_now().await;
            let session = self
                .rows
                .lock()
                .await
                .get(&id)
                .cloned()
                .ok_or(SessionError::NotFound(id))?;
            session.validate()?;
            Ok(session)
        }

        async fn save(&self, session: &InterviewSession) -> Result<(), AppError> {
            tokio::task::yield_now().await;
            let mut rows = self.rows.lock().await;
            match rows.get_mut(&session.id) {
                Some(row) if row.is_completed() => {
                    Err(SessionError::AlreadyCompleted(session.id).into())
                }
                Some(row) => {
                    *row = session.clone();
                    Ok(())
                }
                None => Err(SessionError::NotFound(session.id).into()),
            }
        }

        async fn list_for_user(&self, user_id: i64) -> Result<Vec<InterviewSession>, AppError> {
            let rows = self.rows.lock().await;
            let mut sessions: Vec<InterviewSession> = rows
                .values()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect();
            sessions.sort_by_key(|s| (s.started_at, s.id));
            Ok(sessions)
        }

        async fn set_report_key(&self, id: i64, report_key: &str) -> Result<(), AppError> {
            if let Some(row) = self.rows.lock().await.get_mut(&id) {
                row.report_key = Some(report_key.to_string());
            }
            Ok(())
        }
    }
}
