//! Interview session record and its state machine.
//!
//! A session is CREATED with an empty history, ACTIVE while it accepts answers
//! (observably the same as CREATED), and COMPLETED once the end timestamp and the
//! overall evaluation are set. History and transcript are append-only; nothing
//! changes after completion.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::errors::SessionError;
use crate::evaluation::round_score;
use crate::models::language::Language;

/// Evaluation of a single answer. Never mutated once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub question: String,
    pub answer: String,
    /// 0 – 100, one decimal.
    pub score: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
    pub ideal_answer: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// End-of-interview scorecard, created exactly once at completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallEvaluation {
    pub overall_score: f64,
    pub technical_skills: f64,
    pub communication: f64,
    pub problem_solving: f64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Vec<String>,
}

impl OverallEvaluation {
    /// Named sub-scores in display order.
    pub fn skill_breakdown(&self) -> [(&'static str, f64); 3] {
        [
            ("Technical Skills", self.technical_skills),
            ("Communication", self.communication),
            ("Problem Solving", self.problem_solving),
        ]
    }
}

/// The structured blob persisted alongside a session's scalar columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationRecord {
    pub answers: Vec<AnswerEvaluation>,
    pub overall: Option<OverallEvaluation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: i64,
    pub user_id: i64,
    pub language: Language,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub history: Vec<AnswerEvaluation>,
    pub overall: Option<OverallEvaluation>,
    pub transcript: String,
    pub report_key: Option<String>,
}

impl InterviewSession {
    pub fn new(id: i64, user_id: i64, language: Language, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            language,
            started_at,
            ended_at: None,
            history: Vec::new(),
            overall: None,
            transcript: String::new(),
            report_key: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.ended_at.is_some() {
            SessionStatus::Completed
        } else if self.history.is_empty() {
            SessionStatus::Created
        } else {
            SessionStatus::Active
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status() == SessionStatus::Completed
    }

    pub fn ensure_owner(&self, user_id: i64) -> Result<(), SessionError> {
        if self.user_id != user_id {
            return Err(SessionError::AccessDenied(self.id));
        }
        Ok(())
    }

    pub fn ensure_accepting_answers(&self) -> Result<(), SessionError> {
        if self.is_completed() {
            return Err(SessionError::AlreadyCompleted(self.id));
        }
        Ok(())
    }

    pub fn ensure_completable(&self) -> Result<(), SessionError> {
        self.ensure_accepting_answers()?;
        if self.history.is_empty() {
            return Err(SessionError::Incomplete(self.id));
        }
        Ok(())
    }

    /// Appends an evaluated answer and its Q/A pair to the transcript.
    pub fn record_answer(&mut self, evaluation: AnswerEvaluation) -> Result<(), SessionError> {
        self.ensure_accepting_answers()?;

        if !self.transcript.is_empty() {
            self.transcript.push_str("\n\n");
        }
        self.transcript.push_str(&format!(
            "Q: {}\nA: {}",
            evaluation.question, evaluation.answer
        ));
        self.history.push(evaluation);
        Ok(())
    }

    /// Moves the session to COMPLETED. Terminal.
    pub fn finish(
        &mut self,
        overall: OverallEvaluation,
        ended_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.ensure_completable()?;
        self.overall = Some(overall);
        self.ended_at = Some(ended_at);
        Ok(())
    }

    /// Mean per-answer score rounded to one decimal; 0.0 for an empty history.
    pub fn average_score(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let total: f64 = self.history.iter().map(|a| a.score).sum();
        round_score(total / self.history.len() as f64)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Checks the invariants a persisted record must satisfy.
    pub fn validate(&self) -> Result<(), SessionError> {
        match (self.ended_at.is_some(), self.overall.is_some()) {
            (true, false) => Err(SessionError::Corrupt(
                self.id,
                "completed session has no overall evaluation".to_string(),
            )),
            (false, true) => Err(SessionError::Corrupt(
                self.id,
                "overall evaluation present on an open session".to_string(),
            )),
            (true, true) if self.history.is_empty() => Err(SessionError::Corrupt(
                self.id,
                "completed session has no answers".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Raw `interviews` row as stored in Postgres.
#[derive(Debug, Clone, FromRow)]
pub struct InterviewRow {
    pub id: i64,
    pub user_id: i64,
    pub language: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub transcript: String,
    pub evaluation: Json<serde_json::Value>,
    pub report_key: Option<String>,
}

impl TryFrom<InterviewRow> for InterviewSession {
    type Error = SessionError;

    fn try_from(row: InterviewRow) -> Result<Self, Self::Error> {
        let language = Language::from_code(&row.language).ok_or_else(|| {
            SessionError::Corrupt(row.id, format!("unknown language '{}'", row.language))
        })?;
        let record: EvaluationRecord = serde_json::from_value(row.evaluation.0)
            .map_err(|e| SessionError::Corrupt(row.id, format!("evaluation blob: {e}")))?;

        let session = InterviewSession {
            id: row.id,
            user_id: row.user_id,
            language,
            started_at: row.start_time,
            ended_at: row.end_time,
            history: record.answers,
            overall: record.overall,
            transcript: row.transcript,
            report_key: row.report_key,
        };
        session.validate()?;
        Ok(session)
    }
}

impl InterviewSession {
    pub fn evaluation_record(&self) -> EvaluationRecord {
        EvaluationRecord {
            answers: self.history.clone(),
            overall: self.overall.clone(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn new_session() -> InterviewSession {
        InterviewSession::new(7, 1, Language::En, Utc::now())
    }

    #[test]
    fn test_new_session_is_created() {
        let session = new_session();
        assert_eq!(session.status(), SessionStatus::Created);
        assert!(session.history.is_empty());
        assert!(session.ended_at.is_none());
    }

    #[test]
    fn test_record_answer_appends_history_and_transcript() {
        let mut session = new_session();
        session.record_answer(answer("Q1?", "A1.", 50.0)).unwrap();
        session.record_answer(answer("Q2?", "A2.", 70.0)).unwrap();

        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.transcript, "Q: Q1?\nA: A1.\n\nQ: Q2?\nA: A2.");
        assert_eq!(session.average_score(), 60.0);
    }

    #[test]
    fn test_record_answer_rejected_after_completion() {
        let mut session = completed_session(3, 80.0);
        let err = session.record_answer(answer("Late?", "Yes.", 10.0)).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyCompleted(3)));
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn test_finish_requires_history() {
        let mut session = new_session();
        let err = session.finish(overall(50.0), Utc::now()).unwrap_err();
        assert!(matches!(err, SessionError::Incomplete(7)));
        assert!(session.ended_at.is_none());
        assert!(session.overall.is_none());
    }

    #[test]
    fn test_finish_twice_is_rejected() {
        let mut session = completed_session(4, 60.0);
        let err = session.finish(overall(90.0), Utc::now()).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyCompleted(4)));
        assert_eq!(session.overall.as_ref().unwrap().overall_score, 60.0);
    }

    #[test]
    fn test_ensure_owner() {
        let session = new_session();
        assert!(session.ensure_owner(1).is_ok());
        assert!(matches!(
            session.ensure_owner(2),
            Err(SessionError::AccessDenied(7))
        ));
    }

    #[test]
    fn test_row_with_malformed_blob_is_corrupt() {
        let row = InterviewRow {
            id: 9,
            user_id: 1,
            language: "en".to_string(),
            start_time: Utc::now(),
            end_time: None,
            transcript: String::new(),
            evaluation: Json(serde_json::json!({"answers": "not-a-list"})),
            report_key: None,
        };
        let err = InterviewSession::try_from(row).unwrap_err();
        assert!(matches!(err, SessionError::Corrupt(9, _)));
    }

    #[test]
    fn test_row_with_end_time_but_no_overall_is_corrupt() {
        let record = EvaluationRecord {
            answers: vec![answer("Q?", "A.", 40.0)],
            overall: None,
        };
        let row = InterviewRow {
            id: 10,
            user_id: 1,
            language: "vi".to_string(),
            start_time: Utc::now(),
            end_time: Some(Utc::now()),
            transcript: String::new(),
            evaluation: Json(serde_json::to_value(&record).unwrap()),
            report_key: None,
        };
        assert!(matches!(
            InterviewSession::try_from(row),
            Err(SessionError::Corrupt(10, _))
        ));
    }

    #[test]
    fn test_row_round_trips_into_session() {
        let session = completed_session(11, 75.0);
        let row = InterviewRow {
            id: 11,
            user_id: session.user_id,
            language: session.language.code().to_string(),
            start_time: session.started_at,
            end_time: session.ended_at,
            transcript: session.transcript.clone(),
            evaluation: Json(serde_json::to_value(session.evaluation_record()).unwrap()),
            report_key: None,
        };
        let restored = InterviewSession::try_from(row).unwrap();
        assert_eq!(restored, session);
    }
}
