use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::language::Language;
use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "interview-api"
    }))
}

#[derive(Serialize)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

#[derive(Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
    pub default: Language,
}

/// GET /api/v1/languages
pub async fn languages_handler(State(state): State<AppState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: Language::ALL
            .iter()
            .map(|lang| LanguageInfo {
                code: lang.code(),
                name: lang.name(),
                native_name: lang.native_name(),
            })
            .collect(),
        default: state.config.default_language,
    })
}
