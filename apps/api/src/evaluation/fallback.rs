//! Deterministic substitutes used when the generative backend is unavailable
//! or its output is unusable. Nothing here touches the network.

use chrono::Utc;

use crate::evaluation::{clamp_score, round_score};
use crate::models::language::Language;
use crate::models::session::{AnswerEvaluation, OverallEvaluation};

pub const NO_ANSWER_FEEDBACK: &str = "No answer provided.";
pub const FOLLOW_UP_FALLBACK: &str = "Can you provide a specific example to illustrate your point?";

const QUESTIONS_EN: [&str; 10] = [
    "Tell me about yourself and your background.",
    "What are your greatest strengths?",
    "Describe a challenging project you worked on.",
    "How do you handle tight deadlines?",
    "What interests you about this role?",
    "Tell me about a time you worked in a team.",
    "How do you stay updated with new technologies?",
    "What are your career goals?",
    "Describe a problem you solved creatively.",
    "Why should we hire you?",
];

const QUESTIONS_VI: [&str; 10] = [
    "Hãy kể về bản thân và nền tảng của bạn.",
    "Điểm mạnh lớn nhất của bạn là gì?",
    "Mô tả một dự án thử thách mà bạn đã làm.",
    "Bạn xử lý deadline gấp như thế nào?",
    "Điều gì khiến bạn quan tâm đến vị trí này?",
    "Kể về một lần bạn làm việc trong nhóm.",
    "Bạn cập nhật công nghệ mới như thế nào?",
    "Mục tiêu nghề nghiệp của bạn là gì?",
    "Mô tả một vấn đề bạn đã giải quyết một cách sáng tạo.",
    "Tại sao chúng tôi nên tuyển bạn?",
];

/// Canned questions in `language`, cycling through the list when `count` exceeds it.
pub fn questions(language: Language, count: usize) -> Vec<String> {
    let canned: &[&str] = match language {
        Language::En => &QUESTIONS_EN,
        Language::Vi => &QUESTIONS_VI,
    };
    canned
        .iter()
        .cycle()
        .take(count)
        .map(|q| q.to_string())
        .collect()
}

/// Zero-score evaluation for an empty or whitespace-only answer.
pub fn empty_answer(question: &str, answer: &str) -> AnswerEvaluation {
    AnswerEvaluation {
        question: question.to_string(),
        answer: answer.to_string(),
        score: 0.0,
        feedback: NO_ANSWER_FEEDBACK.to_string(),
        strengths: vec![],
        improvements: vec!["Provide a complete answer to the question.".to_string()],
        suggestions: vec!["Take time to think about your response before answering.".to_string()],
        ideal_answer: None,
        created_at: Utc::now(),
    }
}

/// Length heuristic: two points per word, capped at 100.
pub fn heuristic_score(answer: &str) -> f64 {
    let words = answer.split_whitespace().count();
    clamp_score((words * 2) as f64)
}

/// Evaluation used when the backend fails anywhere in the answer pipeline.
pub fn heuristic_evaluation(question: &str, answer: &str) -> AnswerEvaluation {
    AnswerEvaluation {
        question: question.to_string(),
        answer: answer.to_string(),
        score: heuristic_score(answer),
        feedback: "Answer evaluated. Provide more specific examples and details.".to_string(),
        strengths: vec!["Attempted to answer the question".to_string()],
        improvements: vec![
            "Provide more specific examples".to_string(),
            "Elaborate on key points".to_string(),
        ],
        suggestions: vec![
            "Use the STAR method for behavioral questions".to_string(),
            "Include concrete examples".to_string(),
        ],
        ideal_answer: Some(
            "A comprehensive answer with specific examples and clear explanations.".to_string(),
        ),
        created_at: Utc::now(),
    }
}

/// Overall evaluation where every sub-score is the mean answer score.
pub fn overall_evaluation(average_score: f64) -> OverallEvaluation {
    let score = round_score(clamp_score(average_score));
    OverallEvaluation {
        overall_score: score,
        technical_skills: score,
        communication: score,
        problem_solving: score,
        summary: format!("Interview completed with an average score of {score:.1}/100."),
        strengths: vec!["Completed the interview".to_string()],
        areas_for_improvement: vec!["Provide more detailed answers".to_string()],
        recommendations: vec!["Practice more interview questions".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_match_language() {
        let en = questions(Language::En, 10);
        let vi = questions(Language::Vi, 10);
        assert_eq!(en.len(), 10);
        assert_eq!(vi.len(), 10);
        assert_eq!(en[0], "Tell me about yourself and your background.");
        assert!(vi[0].contains("bạn"));
    }

    #[test]
    fn test_questions_truncate_and_cycle() {
        assert_eq!(questions(Language::En, 3).len(), 3);
        let many = questions(Language::En, 12);
        assert_eq!(many.len(), 12);
        assert_eq!(many[10], many[0]);
    }

    #[test]
    fn test_heuristic_score_caps_at_100() {
        assert_eq!(heuristic_score("one two three"), 6.0);
        assert_eq!(heuristic_score(&"word ".repeat(80)), 100.0);
        assert_eq!(heuristic_score("   "), 0.0);
    }

    #[test]
    fn test_overall_fallback_uses_mean_for_all_sub_scores() {
        let overall = overall_evaluation(67.25);
        assert_eq!(overall.overall_score, 67.3);
        assert_eq!(overall.technical_skills, 67.3);
        assert_eq!(overall.communication, 67.3);
        assert_eq!(overall.problem_solving, 67.3);
        assert!(overall.summary.contains("67.3/100"));
    }
}
