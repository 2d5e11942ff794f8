use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;
use tracing::{info, warn};

use crate::evaluation::parser::{self, labels, DEFAULT_SCORE};
use crate::evaluation::prompts::{
    fill, FEEDBACK_PROMPT_TEMPLATE, FOLLOW_UP_PROMPT_TEMPLATE, IDEAL_ANSWER_PROMPT_TEMPLATE,
    OVERALL_PROMPT_TEMPLATE, QUESTIONS_PROMPT_TEMPLATE, QUESTIONS_PROMPT_TEMPLATE_VI,
};
use crate::evaluation::{clamp_score, fallback, round_score, EngineConfig, SimilarityScorer};
use crate::llm_client::{generate_bounded, LlmError, TextGenerator};
use crate::models::language::Language;
use crate::models::resume::ResumeProfile;
use crate::models::session::{AnswerEvaluation, OverallEvaluation};

/// Relative weight of each question category: technical, behavioral,
/// experience, situational, career.
const CATEGORY_WEIGHTS: [usize; 5] = [3, 2, 2, 2, 1];

/// Scores interviews for one session language.
///
/// Every public operation returns a usable value: backend failures, timeouts and
/// unparseable output all land on the deterministic results in `fallback`.
#[derive(Clone)]
pub struct EvaluationEngine {
    backend: Arc<dyn TextGenerator>,
    scorer: Arc<dyn SimilarityScorer>,
    language: Language,
    config: EngineConfig,
}

impl EvaluationEngine {
    pub fn new(
        backend: Arc<dyn TextGenerator>,
        scorer: Arc<dyn SimilarityScorer>,
        language: Language,
        config: EngineConfig,
    ) -> Self {
        Self {
            backend,
            scorer,
            language,
            config,
        }
    }

    async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
        generate_bounded(self.backend.as_ref(), prompt, self.config.backend_timeout).await
    }

    /// Produces exactly `question_count` questions tailored to the profile.
    pub async fn generate_questions(&self, profile: &ResumeProfile) -> Vec<String> {
        let count = self.config.question_count;
        let prompt = self.questions_prompt(profile, count);

        match self.ask(&prompt).await {
            Ok(text) => {
                let mut questions = extract_questions(&text);
                if questions.len() < count {
                    warn!(
                        "Backend returned {} usable questions, expected {}; using defaults",
                        questions.len(),
                        count
                    );
                    return fallback::questions(self.language, count);
                }
                questions.truncate(count);
                info!("Generated {} questions in {}", count, self.language.name());
                questions
            }
            Err(e) => {
                warn!("Question generation failed, using defaults: {}", e);
                fallback::questions(self.language, count)
            }
        }
    }

    fn questions_prompt(&self, profile: &ResumeProfile, count: usize) -> String {
        let template = match self.language {
            Language::En => QUESTIONS_PROMPT_TEMPLATE,
            Language::Vi => QUESTIONS_PROMPT_TEMPLATE_VI,
        };
        let skills = if profile.skills.is_empty() {
            "Not specified".to_string()
        } else {
            profile.skills.join(", ")
        };
        let mix = category_mix(count).map(|n| n.to_string());
        let count = count.to_string();
        let experience_count = profile.experience.len().to_string();
        let project_count = profile.projects.len().to_string();

        fill(
            template,
            &[
                ("count", count.as_str()),
                ("language_name", self.language.name()),
                ("skills", skills.as_str()),
                ("experience_count", experience_count.as_str()),
                ("project_count", project_count.as_str()),
                ("technical", mix[0].as_str()),
                ("behavioral", mix[1].as_str()),
                ("experience", mix[2].as_str()),
                ("situational", mix[3].as_str()),
                ("career", mix[4].as_str()),
            ],
        )
    }

    /// Scores one answer. Blank answers are rejected locally without a backend call.
    pub async fn evaluate_answer(&self, question: &str, answer: &str) -> AnswerEvaluation {
        if answer.trim().is_empty() {
            info!("Empty answer submitted, scoring 0");
            return fallback::empty_answer(question, answer);
        }

        match self.evaluate_with_backend(question, answer).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!("Answer evaluation failed, using length heuristic: {}", e);
                fallback::heuristic_evaluation(question, answer)
            }
        }
    }

    async fn evaluate_with_backend(
        &self,
        question: &str,
        answer: &str,
    ) -> Result<AnswerEvaluation, LlmError> {
        let ideal_answer = self
            .ask(&fill(IDEAL_ANSWER_PROMPT_TEMPLATE, &[("question", question)]))
            .await?;

        let similarity = self.scorer.score(&ideal_answer, answer, self.language);

        let feedback = self
            .ask(&fill(
                FEEDBACK_PROMPT_TEMPLATE,
                &[
                    ("question", question),
                    ("answer", answer),
                    ("ideal_answer", ideal_answer.as_str()),
                ],
            ))
            .await?;

        let fields = parser::parse(&feedback, parser::feedback_schema());
        let ai_score = clamp_score(fields.integer(labels::SCORE).unwrap_or(DEFAULT_SCORE) as f64);
        let score = round_score(clamp_score((ai_score + similarity) / 2.0));

        info!(
            "Answer scored {:.1} (backend {:.0}, similarity {:.1})",
            score, ai_score, similarity
        );

        Ok(AnswerEvaluation {
            question: question.to_string(),
            answer: answer.to_string(),
            score,
            strengths: fields.list_owned(labels::STRENGTHS),
            improvements: fields.list_owned(labels::IMPROVEMENTS),
            suggestions: fields.list_owned(labels::SUGGESTIONS),
            feedback,
            ideal_answer: Some(ideal_answer),
            created_at: Utc::now(),
        })
    }

    pub async fn generate_follow_up(&self, question: &str, answer: &str) -> String {
        let prompt = fill(
            FOLLOW_UP_PROMPT_TEMPLATE,
            &[("question", question), ("answer", answer)],
        );
        match self.ask(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Follow-up generation failed, using default: {}", e);
                fallback::FOLLOW_UP_FALLBACK.to_string()
            }
        }
    }

    /// Synthesizes the end-of-interview scorecard from the transcript and history.
    pub async fn generate_overall_evaluation(
        &self,
        transcript: &str,
        history: &[AnswerEvaluation],
    ) -> OverallEvaluation {
        let average = mean_score(history);
        let average_text = format!("{average:.1}");
        let prompt = fill(
            OVERALL_PROMPT_TEMPLATE,
            &[("average_score", average_text.as_str()), ("transcript", transcript)],
        );

        let text = match self.ask(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Overall evaluation failed, using mean score: {}", e);
                return fallback::overall_evaluation(average);
            }
        };

        let fields = parser::parse(&text, parser::overall_schema());
        let sub_score = |label: &str| {
            clamp_score(fields.integer(label).unwrap_or(DEFAULT_SCORE) as f64)
        };

        OverallEvaluation {
            overall_score: sub_score(labels::OVERALL_SCORE),
            technical_skills: sub_score(labels::TECHNICAL_SKILLS),
            communication: sub_score(labels::COMMUNICATION),
            problem_solving: sub_score(labels::PROBLEM_SOLVING),
            summary: fields.text(labels::SUMMARY).unwrap_or_default().to_string(),
            strengths: fields.list_owned(labels::STRENGTHS),
            areas_for_improvement: fields.list_owned(labels::AREAS_FOR_IMPROVEMENT),
            recommendations: fields.list_owned(labels::RECOMMENDATIONS),
        }
    }
}

/// Unrounded mean answer score; 0.0 for no answers.
fn mean_score(history: &[AnswerEvaluation]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().map(|a| a.score).sum::<f64>() / history.len() as f64
}

/// Splits `count` across the question categories in 3:2:2:2:1 proportion.
fn category_mix(count: usize) -> [usize; 5] {
    let total: usize = CATEGORY_WEIGHTS.iter().sum();
    let mut mix = CATEGORY_WEIGHTS.map(|w| count * w / total);
    let mut remainder = count - mix.iter().sum::<usize>();
    for slot in mix.iter_mut() {
        if remainder == 0 {
            break;
        }
        *slot += 1;
        remainder -= 1;
    }
    mix
}

fn question_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // "1." / "2)" / "3 -" numbering, or a bullet.
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:\d+\s*[.):-]?|[-*•])\s*").expect("question marker pattern is valid")
    })
}

/// Keeps only numbered or bulleted lines, with the marker removed.
fn extract_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            line.chars()
                .next()
                .map_or(false, |c| c.is_ascii_digit() || matches!(c, '-' | '*' | '•'))
        })
        .map(|line| question_marker().replace(line, "").trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::evaluation::similarity::stubs::FixedSimilarity;
    use crate::evaluation::TfIdfScorer;
    use crate::llm_client::stubs::{FailingGenerator, ScriptedGenerator, StallingGenerator};

    const IDEAL_KEY: &str = "Provide a concise, professional answer";
    const FEEDBACK_KEY: &str = "Evaluate this interview answer";
    const QUESTIONS_KEY: &str = "interview questions";
    const FOLLOW_UP_KEY: &str = "follow-up question";
    const OVERALL_KEY: &str = "overall evaluation";

    fn engine(backend: Arc<dyn TextGenerator>, similarity: f64) -> EvaluationEngine {
        EvaluationEngine::new(
            backend,
            Arc::new(FixedSimilarity(similarity)),
            Language::En,
            EngineConfig::default(),
        )
    }

    fn numbered(count: usize) -> String {
        (1..=count)
            .map(|i| format!("{i}. Question number {i}?"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn profile() -> ResumeProfile {
        ResumeProfile {
            skills: vec!["Rust".to_string(), "Postgres".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_answer_scores_zero_without_backend_call() {
        let backend = Arc::new(ScriptedGenerator::new(vec![]));
        let engine = engine(backend.clone(), 80.0);

        let eval = engine.evaluate_answer("Tell me about yourself", "   ").await;

        assert_eq!(eval.score, 0.0);
        assert_eq!(eval.feedback, fallback::NO_ANSWER_FEEDBACK);
        assert!(eval.strengths.is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_score_blends_backend_and_similarity() {
        let backend = Arc::new(ScriptedGenerator::new(vec![
            (IDEAL_KEY, "A strong answer about ownership."),
            (FEEDBACK_KEY, "SCORE: 90\nSTRENGTHS: Good\nIMPROVEMENTS: More depth\nSUGGESTIONS: Use STAR"),
        ]));
        let engine = engine(backend.clone(), 80.0);

        let eval = engine
            .evaluate_answer("Explain ownership", "Each value has a single owner.")
            .await;

        assert_eq!(eval.score, 85.0);
        assert_eq!(eval.strengths, vec!["Good"]);
        assert_eq!(eval.improvements, vec!["More depth"]);
        assert_eq!(eval.suggestions, vec!["Use STAR"]);
        assert_eq!(eval.ideal_answer.as_deref(), Some("A strong answer about ownership."));
        assert!(eval.feedback.starts_with("SCORE: 90"));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_feedback_prompt_carries_ideal_answer() {
        let backend = Arc::new(ScriptedGenerator::new(vec![
            (IDEAL_KEY, "IDEAL-TEXT"),
            (FEEDBACK_KEY, "SCORE: 60"),
        ]));
        let engine = engine(backend.clone(), 50.0);
        engine.evaluate_answer("Why Rust?", "Safety {answer}").await;

        let prompts = backend.prompts();
        assert!(prompts[1].contains("IDEAL-TEXT"));
        assert!(prompts[1].contains("Safety {answer}"));
    }

    #[tokio::test]
    async fn test_missing_score_defaults_to_70() {
        let backend = Arc::new(ScriptedGenerator::new(vec![
            (IDEAL_KEY, "ideal"),
            (FEEDBACK_KEY, "The answer was fine overall."),
        ]));
        let eval = engine(backend, 50.0).evaluate_answer("q", "some answer").await;
        assert_eq!(eval.score, 60.0);
        assert!(eval.strengths.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_backend_score_is_clamped() {
        let backend = Arc::new(ScriptedGenerator::new(vec![
            (IDEAL_KEY, "ideal"),
            (FEEDBACK_KEY, "SCORE: 150"),
        ]));
        let eval = engine(backend, 100.0).evaluate_answer("q", "a real answer").await;
        assert_eq!(eval.score, 100.0);
    }

    #[tokio::test]
    async fn test_backend_failure_uses_length_heuristic() {
        let backend = Arc::new(FailingGenerator::default());
        let engine = engine(backend.clone(), 80.0);

        let answer = "I led a team of five engineers to ship a billing rewrite";
        let eval = engine.evaluate_answer("Describe a project", answer).await;

        assert_eq!(eval.score, 24.0);
        assert_eq!(eval.strengths, vec!["Attempted to answer the question"]);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_feedback_failure_after_ideal_answer_uses_heuristic() {
        let backend = Arc::new(ScriptedGenerator::new(vec![(IDEAL_KEY, "ideal")]));
        let eval = engine(backend.clone(), 80.0).evaluate_answer("q", "two words").await;
        assert_eq!(eval.score, 4.0);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_backend_times_out_to_heuristic() {
        let engine = EvaluationEngine::new(
            Arc::new(StallingGenerator),
            Arc::new(TfIdfScorer),
            Language::En,
            EngineConfig {
                question_count: 10,
                backend_timeout: Duration::from_secs(2),
            },
        );
        let eval = engine.evaluate_answer("q", "a short answer").await;
        assert_eq!(eval.score, 6.0);
    }

    #[tokio::test]
    async fn test_scores_stay_in_range() {
        let backend = Arc::new(ScriptedGenerator::new(vec![
            (IDEAL_KEY, "Ownership, borrowing and lifetimes keep memory safe."),
            (FEEDBACK_KEY, "SCORE: -20"),
        ]));
        let engine = EvaluationEngine::new(
            backend,
            Arc::new(TfIdfScorer),
            Language::En,
            EngineConfig::default(),
        );
        let long = "word ".repeat(500);
        for answer in ["x", "ownership borrowing lifetimes", long.as_str()] {
            let eval = engine.evaluate_answer("q", answer).await;
            assert!((0.0..=100.0).contains(&eval.score), "score was {}", eval.score);
        }
    }

    #[tokio::test]
    async fn test_generate_questions_strips_numbering() {
        let backend = Arc::new(ScriptedGenerator::new(vec![(QUESTIONS_KEY, numbered(10).as_str())]));
        let questions = engine(backend, 50.0).generate_questions(&profile()).await;

        assert_eq!(questions.len(), 10);
        assert_eq!(questions[0], "Question number 1?");
        assert_eq!(questions[9], "Question number 10?");
    }

    #[tokio::test]
    async fn test_generate_questions_ignores_preamble_and_truncates() {
        let reply = format!("Here are your questions:\n\n{}", numbered(12));
        let backend = Arc::new(ScriptedGenerator::new(vec![(QUESTIONS_KEY, reply.as_str())]));
        let questions = engine(backend, 50.0).generate_questions(&profile()).await;

        assert_eq!(questions.len(), 10);
        assert_eq!(questions[0], "Question number 1?");
    }

    #[tokio::test]
    async fn test_generate_questions_too_few_lines_uses_defaults() {
        let backend = Arc::new(ScriptedGenerator::new(vec![(QUESTIONS_KEY, numbered(4).as_str())]));
        let questions = engine(backend, 50.0).generate_questions(&profile()).await;
        assert_eq!(questions, fallback::questions(Language::En, 10));
    }

    #[tokio::test]
    async fn test_generate_questions_is_repeatable_with_deterministic_backend() {
        let backend = Arc::new(ScriptedGenerator::new(vec![(QUESTIONS_KEY, numbered(10).as_str())]));
        let engine = engine(backend.clone(), 50.0);

        let first = engine.generate_questions(&profile()).await;
        let second = engine.generate_questions(&profile()).await;

        assert_eq!(backend.calls(), 2);
        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
        assert_ne!(first, fallback::questions(Language::En, 10));
    }

    #[tokio::test]
    async fn test_generate_questions_failure_is_deterministic() {
        let engine = engine(Arc::new(FailingGenerator::default()), 50.0);
        let first = engine.generate_questions(&profile()).await;
        let second = engine.generate_questions(&profile()).await;
        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_vietnamese_questions_use_vietnamese_prompt_and_defaults() {
        let backend = Arc::new(FailingGenerator::default());
        let engine = EvaluationEngine::new(
            backend,
            Arc::new(FixedSimilarity(50.0)),
            Language::Vi,
            EngineConfig::default(),
        );
        let questions = engine.generate_questions(&ResumeProfile::default()).await;
        assert_eq!(questions, fallback::questions(Language::Vi, 10));

        let prompt = engine.questions_prompt(&ResumeProfile::default(), 10);
        assert!(prompt.contains("tiếng Việt"));
        assert!(prompt.contains("Not specified"));
    }

    #[tokio::test]
    async fn test_question_prompt_lists_profile() {
        let prompt = engine(Arc::new(FailingGenerator::default()), 50.0)
            .questions_prompt(&profile(), 10);
        assert!(prompt.contains("Rust, Postgres"));
        assert!(prompt.contains("1. 3 Technical"));
        assert!(prompt.contains("numbered 1-10"));
    }

    #[tokio::test]
    async fn test_follow_up_success_and_fallback() {
        let backend = Arc::new(ScriptedGenerator::new(vec![(
            FOLLOW_UP_KEY,
            "What trade-offs did you consider?",
        )]));
        let follow_up = engine(backend, 50.0).generate_follow_up("q", "a").await;
        assert_eq!(follow_up, "What trade-offs did you consider?");

        let follow_up = engine(Arc::new(FailingGenerator::default()), 50.0)
            .generate_follow_up("q", "a")
            .await;
        assert_eq!(follow_up, fallback::FOLLOW_UP_FALLBACK);
    }

    #[tokio::test]
    async fn test_overall_evaluation_parses_synthesis() {
        let reply = "OVERALL_SCORE: 82\nTECHNICAL_SKILLS: 88\nCOMMUNICATION: 140\nPROBLEM_SOLVING: 75\n\
                     SUMMARY: Solid candidate.\nSTRENGTHS:\n- Depth\n- Clarity\n\
                     AREAS_FOR_IMPROVEMENT: Brevity\nRECOMMENDATIONS: Practice system design";
        let backend = Arc::new(ScriptedGenerator::new(vec![(OVERALL_KEY, reply)]));
        let history = vec![fallback::heuristic_evaluation("q", "one two three")];

        let overall = engine(backend, 50.0)
            .generate_overall_evaluation("Q: q\nA: one two three", &history)
            .await;

        assert_eq!(overall.overall_score, 82.0);
        assert_eq!(overall.technical_skills, 88.0);
        assert_eq!(overall.communication, 100.0);
        assert_eq!(overall.problem_solving, 75.0);
        assert_eq!(overall.summary, "Solid candidate.");
        assert_eq!(overall.strengths, vec!["Depth", "Clarity"]);
        assert_eq!(overall.recommendations, vec!["Practice system design"]);
    }

    #[tokio::test]
    async fn test_overall_evaluation_fallback_uses_mean() {
        let history = vec![
            fallback::heuristic_evaluation("q1", &"word ".repeat(40)),
            fallback::heuristic_evaluation("q2", &"word ".repeat(25)),
        ];
        let overall = engine(Arc::new(FailingGenerator::default()), 50.0)
            .generate_overall_evaluation("transcript", &history)
            .await;

        assert_eq!(overall.overall_score, 65.0);
        assert_eq!(overall.technical_skills, 65.0);
        assert_eq!(
            overall.summary,
            "Interview completed with an average score of 65.0/100."
        );
    }

    #[test]
    fn test_category_mix_sums_to_count() {
        assert_eq!(category_mix(10), [3, 2, 2, 2, 1]);
        assert_eq!(category_mix(5), [2, 1, 1, 1, 0]);
        for count in 1..30 {
            assert_eq!(category_mix(count).iter().sum::<usize>(), count);
        }
    }

    #[test]
    fn test_extract_questions_handles_markers() {
        let text = "Intro line\n1) First?\n- Second?\n• Third?\n  4 - Fourth?\n\n";
        assert_eq!(
            extract_questions(text),
            vec!["First?", "Second?", "Third?", "Fourth?"]
        );
    }
}
