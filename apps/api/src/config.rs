use std::time::Duration;

use anyhow::{Context, Result};

use crate::evaluation::EngineConfig;
use crate::models::language::Language;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Number of questions requested when an interview starts.
    pub num_interview_questions: usize,
    /// Language used when a caller asks for an unsupported code.
    pub default_language: Language,
    /// Upper bound on a single generative backend call.
    pub llm_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_language = optional_env("DEFAULT_LANGUAGE", "en");
        let default_language = Language::from_code(&default_language).with_context(|| {
            format!("DEFAULT_LANGUAGE '{default_language}' is not a supported language")
        })?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            num_interview_questions: optional_env("NUM_INTERVIEW_QUESTIONS", "10")
                .parse::<usize>()
                .context("NUM_INTERVIEW_QUESTIONS must be a positive integer")?,
            default_language,
            llm_timeout: Duration::from_secs(
                optional_env("LLM_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        })
    }

    /// Engine settings threaded into every per-session `EvaluationEngine`.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            question_count: self.num_interview_questions.max(1),
            backend_timeout: self.llm_timeout,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
