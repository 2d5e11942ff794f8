use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::analytics::ReportRenderer;
use crate::config::Config;
use crate::evaluation::{EvaluationEngine, SimilarityScorer};
use crate::llm_client::{LlmClient, TextGenerator};
use crate::models::language::Language;
use crate::session::SessionManager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Concrete client, used directly for JSON extraction (résumé parsing).
    pub llm: LlmClient,
    /// Free-text backend handed to every evaluation engine.
    pub generator: Arc<dyn TextGenerator>,
    /// Pluggable similarity scorer. Default: TfIdfScorer.
    pub similarity: Arc<dyn SimilarityScorer>,
    /// Report document format. Default: MarkdownReportRenderer.
    pub renderer: Arc<dyn ReportRenderer>,
    pub sessions: SessionManager,
    pub config: Config,
}

impl AppState {
    /// A short-lived engine bound to one session's language.
    pub fn engine(&self, language: Language) -> EvaluationEngine {
        EvaluationEngine::new(
            self.generator.clone(),
            self.similarity.clone(),
            language,
            self.config.engine_config(),
        )
    }
}
