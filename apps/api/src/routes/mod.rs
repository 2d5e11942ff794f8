pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analytics::handlers as analytics;
use crate::resume::handlers as resume;
use crate::session::handlers as interviews;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/languages", get(health::languages_handler))
        .route("/api/v1/resumes", post(resume::handle_upload_resume))
        // Interview lifecycle
        .route(
            "/api/v1/interviews",
            get(interviews::handle_interview_history),
        )
        .route(
            "/api/v1/interviews/start",
            post(interviews::handle_start_interview),
        )
        .route(
            "/api/v1/interviews/:id/answers",
            post(interviews::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:id/complete",
            post(interviews::handle_complete_interview),
        )
        .route(
            "/api/v1/interviews/:id/report",
            get(interviews::handle_interview_report),
        )
        .route("/api/v1/analytics", get(analytics::handle_analytics))
        .with_state(state)
}
