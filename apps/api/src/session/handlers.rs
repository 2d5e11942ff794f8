use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::report::{upload_report, SessionReport};
use crate::errors::AppError;
use crate::evaluation::fallback;
use crate::models::language::Language;
use crate::models::session::{AnswerEvaluation, InterviewSession, OverallEvaluation, SessionStatus};
use crate::resume::store::get_resume;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct StartInterviewRequest {
    pub user_id: i64,
    pub resume_id: i64,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct StartInterviewResponse {
    pub interview_id: i64,
    pub language: Language,
    pub candidate_name: String,
    pub questions: Vec<String>,
}

/// POST /api/v1/interviews/start
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Result<Json<StartInterviewResponse>, AppError> {
    let resume = get_resume(&state.db, req.resume_id, req.user_id).await?;
    let language = Language::resolve(req.language.as_deref(), state.config.default_language);
    if resume.parsed_data.is_empty() {
        warn!(
            "Resume {} has no skills, experience or projects; questions will be generic",
            resume.id
        );
    }

    let questions = state
        .engine(language)
        .generate_questions(&resume.parsed_data)
        .await;
    let session = state.sessions.start(req.user_id, language).await?;

    let candidate_name = if resume.parsed_data.name.trim().is_empty() {
        "Candidate".to_string()
    } else {
        resume.parsed_data.name.clone()
    };

    Ok(Json(StartInterviewResponse {
        interview_id: session.id,
        language,
        candidate_name,
        questions,
    }))
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub user_id: i64,
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub evaluation: AnswerEvaluation,
    pub score: f64,
    pub next_question: String,
    pub answers_recorded: usize,
}

/// POST /api/v1/interviews/:id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::Validation("question is required".to_string()));
    }

    // Reject early so a finished or foreign session costs no backend calls.
    let session = state.sessions.get(id, req.user_id).await?;
    session.ensure_accepting_answers()?;

    let engine = state.engine(session.language);
    let answer = req.answer.trim();
    let evaluation = engine.evaluate_answer(&req.question, answer).await;
    let next_question = if answer.is_empty() {
        fallback::FOLLOW_UP_FALLBACK.to_string()
    } else {
        engine.generate_follow_up(&req.question, answer).await
    };

    let session = state
        .sessions
        .record_answer(id, req.user_id, evaluation.clone())
        .await?;

    Ok(Json(AnswerResponse {
        score: evaluation.score,
        evaluation,
        next_question,
        answers_recorded: session.history.len(),
    }))
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    pub user_id: i64,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub interview_id: i64,
    pub average_score: f64,
    pub overall_evaluation: OverallEvaluation,
    pub skills_breakdown: Vec<SkillEntry>,
    pub report_key: Option<String>,
}

#[derive(Serialize)]
pub struct SkillEntry {
    pub skill: &'static str,
    pub score: f64,
}

/// POST /api/v1/interviews/:id/complete
pub async fn handle_complete_interview(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, AppError> {
    let language = state.sessions.get(id, req.user_id).await?.language;
    let session = state
        .sessions
        .complete(id, req.user_id, &state.engine(language))
        .await?;

    let report_key = publish_report(&state, &session).await;
    let overall = session
        .overall
        .clone()
        .ok_or_else(|| anyhow::anyhow!("completed interview {id} has no overall evaluation"))?;

    Ok(Json(CompleteResponse {
        interview_id: session.id,
        average_score: session.average_score(),
        skills_breakdown: overall
            .skill_breakdown()
            .into_iter()
            .map(|(skill, score)| SkillEntry { skill, score })
            .collect(),
        overall_evaluation: overall,
        report_key,
    }))
}

/// Renders and stores the report document. Never fails the completion: any
/// error is logged and the session simply has no stored report.
async fn publish_report(state: &AppState, session: &InterviewSession) -> Option<String> {
    let report = match SessionReport::build(session) {
        Ok(report) => report,
        Err(e) => {
            warn!("Report skipped for interview {}: {e}", session.id);
            return None;
        }
    };

    let key = match upload_report(
        &state.s3,
        &state.config.s3_bucket,
        state.renderer.as_ref(),
        session.user_id,
        &report,
    )
    .await
    {
        Ok(key) => key,
        Err(e) => {
            warn!("Report generation failed for interview {}: {e:#}", session.id);
            return None;
        }
    };

    if let Err(e) = state.sessions.attach_report(session.id, &key).await {
        warn!("Could not record report key for interview {}: {e}", session.id);
        return None;
    }
    info!("Interview {} report stored at {}", session.id, key);
    Some(key)
}

#[derive(Serialize)]
pub struct InterviewSummary {
    pub id: i64,
    pub language: Language,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub answers: usize,
    pub overall_score: Option<f64>,
    pub report_available: bool,
}

impl From<&InterviewSession> for InterviewSummary {
    fn from(session: &InterviewSession) -> Self {
        InterviewSummary {
            id: session.id,
            language: session.language,
            status: session.status(),
            start_time: session.started_at,
            end_time: session.ended_at,
            duration_seconds: session.duration().map(|d| d.num_seconds()),
            answers: session.history.len(),
            overall_score: session.overall.as_ref().map(|o| o.overall_score),
            report_available: session.report_key.is_some(),
        }
    }
}

#[derive(Serialize)]
pub struct InterviewHistoryResponse {
    pub interviews: Vec<InterviewSummary>,
    pub total_count: usize,
}

/// GET /api/v1/interviews
pub async fn handle_interview_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<InterviewHistoryResponse>, AppError> {
    let sessions = state.sessions.list(params.user_id).await?;
    // Newest first for display.
    let interviews: Vec<InterviewSummary> = sessions.iter().rev().map(InterviewSummary::from).collect();
    Ok(Json(InterviewHistoryResponse {
        total_count: interviews.len(),
        interviews,
    }))
}

/// GET /api/v1/interviews/:id/report
pub async fn handle_interview_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionReport>, AppError> {
    let session = state.sessions.get(id, params.user_id).await?;
    Ok(Json(SessionReport::build(&session)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::fixtures;

    #[test]
    fn test_summary_of_open_session() {
        let mut session = InterviewSession::new(4, 1, Language::Vi, Utc::now());
        session
            .record_answer(fixtures::answer("Q", "A", 50.0))
            .unwrap();

        let summary = InterviewSummary::from(&session);
        assert_eq!(summary.status, SessionStatus::Active);
        assert_eq!(summary.answers, 1);
        assert_eq!(summary.overall_score, None);
        assert_eq!(summary.duration_seconds, None);
        assert!(!summary.report_available);
    }

    #[test]
    fn test_summary_of_completed_session() {
        let mut session = fixtures::completed_session(9, 77.0);
        session.report_key = Some("reports/1/9-abc.md".to_string());

        let summary = InterviewSummary::from(&session);
        assert_eq!(summary.status, SessionStatus::Completed);
        assert_eq!(summary.overall_score, Some(77.0));
        assert!(summary.duration_seconds.is_some());
        assert!(summary.report_available);
    }
}
