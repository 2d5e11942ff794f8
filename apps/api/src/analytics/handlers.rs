use axum::{
    extract::{Query, State},
    Json,
};

use crate::analytics::trends::{summarize, TrendReport};
use crate::errors::AppError;
use crate::session::handlers::UserIdQuery;
use crate::state::AppState;

/// GET /api/v1/analytics
pub async fn handle_analytics(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TrendReport>, AppError> {
    let completed = state.sessions.completed(params.user_id).await?;
    Ok(Json(summarize(&completed)))
}
