//! Lexical similarity between a reference answer and a candidate answer.
//!
//! TF-IDF vectors are fitted on just the two input texts, then compared by cosine
//! similarity and scaled to 0 – 100. The score is advisory: degenerate input
//! yields `NEUTRAL_SIMILARITY` instead of an error.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::evaluation::round_score;
use crate::models::language::Language;

/// Returned whenever vectors cannot be built (e.g. an empty candidate).
pub const NEUTRAL_SIMILARITY: f64 = 50.0;

/// Vocabulary cap, by total term frequency across both texts.
const MAX_FEATURES: usize = 1000;

/// Scores how closely `candidate` covers the content of `reference`.
pub trait SimilarityScorer: Send + Sync {
    /// Returns a value in [0, 100] rounded to one decimal. Never fails.
    fn score(&self, reference: &str, candidate: &str, language: Language) -> f64;
}

/// Default scorer: smoothed TF-IDF + cosine similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl SimilarityScorer for TfIdfScorer {
    fn score(&self, reference: &str, candidate: &str, language: Language) -> f64 {
        match tfidf_cosine(reference, candidate, language.stop_words()) {
            Some(cosine) => round_score((cosine * 100.0).clamp(0.0, 100.0)),
            None => {
                debug!("Similarity vectors were degenerate, using neutral score");
                NEUTRAL_SIMILARITY
            }
        }
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Two or more word characters, Unicode-aware so Vietnamese tokens survive.
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Lowercases, tokenizes and drops stop words.
fn tokenize(text: &str, stop_words: Option<&[&str]>) -> Vec<String> {
    let lower = text.to_lowercase();
    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|tok| stop_words.map_or(true, |words| !words.contains(tok)))
        .map(str::to_string)
        .collect()
}

/// Cosine similarity of the two TF-IDF vectors, or `None` when either vector is empty.
fn tfidf_cosine(reference: &str, candidate: &str, stop_words: Option<&[&str]>) -> Option<f64> {
    let docs = [tokenize(reference, stop_words), tokenize(candidate, stop_words)];
    if docs.iter().any(Vec::is_empty) {
        return None;
    }

    let vocab = build_vocab(&docs);
    if vocab.is_empty() {
        return None;
    }

    let vectors: Vec<Vec<f64>> = docs.iter().map(|d| tfidf_vector(d, &docs, &vocab)).collect();
    cosine_similarity(&vectors[0], &vectors[1])
}

/// Maps each retained term to its column, keeping the `MAX_FEATURES` most frequent.
fn build_vocab(docs: &[Vec<String>]) -> HashMap<String, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for doc in docs {
        for tok in doc {
            *counts.entry(tok.as_str()).or_insert(0) += 1;
        }
    }

    let mut terms: Vec<(&str, usize)> = counts.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    terms.truncate(MAX_FEATURES);

    terms
        .into_iter()
        .enumerate()
        .map(|(idx, (term, _))| (term.to_string(), idx))
        .collect()
}

fn tfidf_vector(doc: &[String], corpus: &[Vec<String>], vocab: &HashMap<String, usize>) -> Vec<f64> {
    let num_docs = corpus.len() as f64;
    let doc_sets: Vec<HashSet<&str>> = corpus
        .iter()
        .map(|d| d.iter().map(String::as_str).collect())
        .collect();

    let mut vector = vec![0.0; vocab.len()];
    for tok in doc {
        if let Some(&idx) = vocab.get(tok) {
            vector[idx] += 1.0;
        }
    }

    for (term, &idx) in vocab {
        if vector[idx] == 0.0 {
            continue;
        }
        let df = doc_sets.iter().filter(|s| s.contains(term.as_str())).count() as f64;
        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1
        let idf = ((1.0 + num_docs) / (1.0 + df)).ln() + 1.0;
        vector[idx] *= idf;
    }

    vector
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    let mut dot = 0.0;
    let mut mag_a = 0.0;
    let mut mag_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 {
        None
    } else {
        Some(dot / denom)
    }
}

#[cfg(test)]
pub(crate) mod stubs {
    use super::*;

    /// Returns the same similarity for every pair.
    pub struct FixedSimilarity(pub f64);

    impl SimilarityScorer for FixedSimilarity {
        fn score(&self, _reference: &str, _candidate: &str, _language: Language) -> f64 {
            self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_score_100() {
        let text = "I designed a caching layer in Rust that cut latency by forty percent.";
        assert_eq!(TfIdfScorer.score(text, text, Language::En), 100.0);
    }

    #[test]
    fn test_disjoint_vocabularies_score_zero() {
        let score = TfIdfScorer.score(
            "kubernetes deployment pipelines",
            "watercolor painting weekends",
            Language::En,
        );
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_candidate_returns_neutral() {
        assert_eq!(
            TfIdfScorer.score("A thorough reference answer.", "", Language::En),
            NEUTRAL_SIMILARITY
        );
    }

    #[test]
    fn test_stop_words_only_candidate_returns_neutral() {
        assert_eq!(
            TfIdfScorer.score("Rust ownership model", "and the of it", Language::En),
            NEUTRAL_SIMILARITY
        );
    }

    #[test]
    fn test_vietnamese_keeps_all_terms() {
        // Without a stop-word list, shared function words still count as overlap.
        let score = TfIdfScorer.score("của bạn là gì", "của tôi là gì", Language::Vi);
        assert!(score > 0.0 && score < 100.0, "score was {score}");
    }

    #[test]
    fn test_partial_overlap_is_between_bounds() {
        let score = TfIdfScorer.score(
            "I use Rust and Tokio to build async network services",
            "I build network services with Go",
            Language::En,
        );
        assert!(score > 0.0 && score < 100.0, "score was {score}");
    }

    #[test]
    fn test_score_is_symmetric() {
        let a = "Led the migration of billing services to Postgres";
        let b = "Migrated billing to Postgres with the team";
        assert_eq!(
            TfIdfScorer.score(a, b, Language::En),
            TfIdfScorer.score(b, a, Language::En)
        );
    }

    #[test]
    fn test_tokenize_drops_short_tokens_and_stop_words() {
        let tokens = tokenize("I am a Rust dev, and I ship.", Language::En.stop_words());
        assert_eq!(tokens, vec!["rust", "dev", "ship"]);
    }

    #[test]
    fn test_vocab_is_capped() {
        let doc: Vec<String> = (0..1500).map(|i| format!("term{i}")).collect();
        let vocab = build_vocab(&[doc.clone(), doc]);
        assert_eq!(vocab.len(), MAX_FEATURES);
    }
}
