use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Protocol and state errors: caller mistakes, never transient.
/// Each variant carries a stable reason code for clients.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Interview {0} not found")]
    NotFound(i64),

    #[error("Interview {0} belongs to another user")]
    AccessDenied(i64),

    #[error("Interview {0} is already completed")]
    AlreadyCompleted(i64),

    #[error("Interview {0} has no answers to evaluate")]
    Incomplete(i64),

    #[error("Interview {0} is not completed yet")]
    NotCompleted(i64),

    #[error("Interview {0} has a corrupt record: {1}")]
    Corrupt(i64, String),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "SESSION_NOT_FOUND",
            SessionError::AccessDenied(_) => "ACCESS_DENIED",
            SessionError::AlreadyCompleted(_) => "SESSION_COMPLETED",
            SessionError::Incomplete(_) => "INCOMPLETE_SESSION",
            SessionError::NotCompleted(_) => "SESSION_NOT_COMPLETED",
            SessionError::Corrupt(..) => "CORRUPT_SESSION",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            // Ownership failures look like missing records to the caller.
            SessionError::NotFound(_) | SessionError::AccessDenied(_) => StatusCode::NOT_FOUND,
            SessionError::AlreadyCompleted(_) | SessionError::NotCompleted(_) => {
                StatusCode::CONFLICT
            }
            SessionError::Incomplete(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::Corrupt(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Session(SessionError::AccessDenied(id)) => {
                // Rendered exactly like a missing session so ids cannot be probed.
                tracing::warn!("{self}");
                let hidden = SessionError::NotFound(*id);
                (hidden.status(), hidden.code(), hidden.to_string())
            }
            AppError::Session(e) => {
                if let SessionError::Corrupt(..) = e {
                    tracing::error!("{e}");
                }
                (e.status(), e.code(), e.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_codes_are_stable() {
        assert_eq!(SessionError::AlreadyCompleted(1).code(), "SESSION_COMPLETED");
        assert_eq!(SessionError::Incomplete(1).code(), "INCOMPLETE_SESSION");
        assert_eq!(SessionError::AccessDenied(1).code(), "ACCESS_DENIED");
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_access_denied_is_reported_as_not_found() {
        let response = AppError::from(SessionError::AccessDenied(5)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let denied = body_json(SessionError::AccessDenied(5).into()).await;
        let missing = body_json(SessionError::NotFound(5).into()).await;
        assert_eq!(denied, missing);
        assert_eq!(denied["error"]["code"], "SESSION_NOT_FOUND");
        assert_eq!(denied["error"]["message"], "Interview 5 not found");
    }

    #[test]
    fn test_incomplete_session_status() {
        let response = AppError::from(SessionError::Incomplete(5)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_completed_session_status() {
        let response = AppError::from(SessionError::AlreadyCompleted(5)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
