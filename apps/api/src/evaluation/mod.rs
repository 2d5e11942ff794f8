// Interview evaluation: question generation, answer scoring, follow-ups and the
// end-of-interview synthesis. Backend calls go through llm_client::TextGenerator;
// every one of them has a deterministic fallback in `fallback`.

pub mod engine;
pub mod fallback;
pub mod parser;
pub mod prompts;
pub mod similarity;

use std::time::Duration;

pub use engine::EvaluationEngine;
pub use similarity::{SimilarityScorer, TfIdfScorer};

/// Per-call engine settings, passed explicitly rather than read from globals.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub question_count: usize,
    pub backend_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            question_count: 10,
            backend_timeout: Duration::from_secs(30),
        }
    }
}

/// Rounds to one decimal place, the precision every score is reported at.
pub fn round_score(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Clamps an arbitrary number into the 0 – 100 score range.
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
