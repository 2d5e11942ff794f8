use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::AppError;
use crate::evaluation::EvaluationEngine;
use crate::models::language::Language;
use crate::models::session::{AnswerEvaluation, InterviewSession};
use crate::session::store::SessionStore;

/// Drives sessions through CREATED → ACTIVE → COMPLETED.
///
/// Every mutation is a load → check → mutate → save sequence executed while
/// holding that session's lock, so two appends to one session never interleave.
/// Different sessions proceed in parallel.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_for(&self, id: i64) -> Arc<Mutex<()>> {
        self.locks.lock().await.entry(id).or_default().clone()
    }

    /// Drops the registry entry once nobody else holds or waits on it.
    async fn release(&self, id: i64, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    async fn lock_entries(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn start(&self, user_id: i64, language: Language) -> Result<InterviewSession, AppError> {
        let session = self.store.create(user_id, language, Utc::now()).await?;
        info!(
            "Interview {} started for user {} in {}",
            session.id,
            user_id,
            language.name()
        );
        Ok(session)
    }

    /// Loads a session owned by `user_id`.
    pub async fn get(&self, id: i64, user_id: i64) -> Result<InterviewSession, AppError> {
        let session = self.store.load(id).await?;
        session.ensure_owner(user_id)?;
        Ok(session)
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<InterviewSession>, AppError> {
        self.store.list_for_user(user_id).await
    }

    /// Completed sessions only, oldest first.
    pub async fn completed(&self, user_id: i64) -> Result<Vec<InterviewSession>, AppError> {
        let mut sessions = self.list(user_id).await?;
        sessions.retain(InterviewSession::is_completed);
        Ok(sessions)
    }

    /// Appends an evaluated answer. Rejected once the session is completed.
    pub async fn record_answer(
        &self,
        id: i64,
        user_id: i64,
        evaluation: AnswerEvaluation,
    ) -> Result<InterviewSession, AppError> {
        let lock = self.lock_for(id).await;
        let result = {
            let _guard = lock.lock().await;
            self.append_answer(id, user_id, evaluation).await
        };
        self.release(id, lock).await;
        result
    }

    async fn append_answer(
        &self,
        id: i64,
        user_id: i64,
        evaluation: AnswerEvaluation,
    ) -> Result<InterviewSession, AppError> {
        let mut session = self.get(id, user_id).await?;
        session.record_answer(evaluation)?;
        self.store.save(&session).await?;

        info!(
            "Interview {}: recorded answer {} (score {:.1})",
            id,
            session.history.len(),
            session.history.last().map_or(0.0, |a| a.score)
        );
        Ok(session)
    }

    /// Synthesizes the overall evaluation and moves the session to COMPLETED.
    /// Needs at least one recorded answer.
    pub async fn complete(
        &self,
        id: i64,
        user_id: i64,
        engine: &EvaluationEngine,
    ) -> Result<InterviewSession, AppError> {
        let lock = self.lock_for(id).await;
        let result = {
            let _guard = lock.lock().await;
            self.finish_session(id, user_id, engine).await
        };
        self.release(id, lock).await;
        result
    }

    async fn finish_session(
        &self,
        id: i64,
        user_id: i64,
        engine: &EvaluationEngine,
    ) -> Result<InterviewSession, AppError> {
        let mut session = self.get(id, user_id).await?;
        session.ensure_completable()?;

        let overall = engine
            .generate_overall_evaluation(&session.transcript, &session.history)
            .await;
        session.finish(overall, Utc::now())?;
        self.store.save(&session).await?;

        info!(
            "Interview {} completed: {} answers, overall {:.1}",
            id,
            session.history.len(),
            session.overall.as_ref().map_or(0.0, |o| o.overall_score)
        );
        Ok(session)
    }

    /// Records where the rendered report was stored.
    pub async fn attach_report(&self, id: i64, report_key: &str) -> Result<(), AppError> {
        self.store.set_report_key(id, report_key).await
    }
}
