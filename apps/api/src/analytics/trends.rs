//! Cross-session performance summary. Pure functions of the input sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::evaluation::round_score;
use crate::models::session::{InterviewSession, OverallEvaluation};

/// How many scores from each end of the history feed the trend comparison.
const TREND_WINDOW: usize = 3;
/// Length of the recent-score series returned for charting.
const RECENT_SCORES: usize = 10;
/// Skill means below this get a practice recommendation.
const WEAK_SKILL_THRESHOLD: f64 = 70.0;
/// Rough practice time credited per completed interview.
const MINUTES_PER_INTERVIEW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    #[serde(rename = "Insufficient data")]
    InsufficientData,
    #[serde(rename = "No data available")]
    NoData,
}

impl Trend {
    /// Compares the mean of the earliest scores with the mean of the latest ones.
    /// `scores` must be oldest first.
    pub fn classify(scores: &[f64]) -> Trend {
        match scores.len() {
            0 => Trend::NoData,
            1 => Trend::InsufficientData,
            n => {
                let window = n.min(TREND_WINDOW);
                let early = mean(&scores[..window]);
                let recent = mean(&scores[n - window..]);
                if recent > early {
                    Trend::Improving
                } else if recent < early {
                    Trend::Declining
                } else {
                    Trend::Stable
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillScore {
    pub skill: &'static str,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformancePoint {
    pub interview_id: i64,
    pub date: DateTime<Utc>,
    pub overall_score: f64,
    pub technical_skills: f64,
    pub communication: f64,
    pub problem_solving: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub total_interviews: usize,
    pub average_score: f64,
    pub improvement_trend: Trend,
    pub highest_score: f64,
    pub lowest_score: f64,
    /// Up to the last ten overall scores, oldest first.
    pub score_trend: Vec<f64>,
    pub performance_over_time: Vec<PerformancePoint>,
    pub skills_breakdown: Vec<SkillScore>,
    pub strongest_skill: Option<&'static str>,
    pub weakest_skill: Option<&'static str>,
    pub recommendations: Vec<String>,
    pub total_practice_minutes: usize,
}

/// Summarizes a user's completed sessions, ordered oldest first.
/// Sessions without an overall evaluation are ignored.
pub fn summarize(sessions: &[InterviewSession]) -> TrendReport {
    let completed: Vec<(&InterviewSession, &OverallEvaluation)> = sessions
        .iter()
        .filter_map(|s| s.overall.as_ref().map(|o| (s, o)))
        .collect();

    let scores: Vec<f64> = completed.iter().map(|(_, o)| o.overall_score).collect();
    let skills = skills_breakdown(completed.iter().map(|(_, o)| *o));

    TrendReport {
        total_interviews: completed.len(),
        average_score: round_score(mean(&scores)),
        improvement_trend: Trend::classify(&scores),
        highest_score: scores.iter().copied().reduce(f64::max).unwrap_or(0.0),
        lowest_score: scores.iter().copied().reduce(f64::min).unwrap_or(0.0),
        score_trend: scores[scores.len().saturating_sub(RECENT_SCORES)..].to_vec(),
        performance_over_time: completed
            .iter()
            .map(|(s, o)| PerformancePoint {
                interview_id: s.id,
                date: s.started_at,
                overall_score: o.overall_score,
                technical_skills: o.technical_skills,
                communication: o.communication,
                problem_solving: o.problem_solving,
            })
            .collect(),
        strongest_skill: pick_skill(&skills, |candidate, best| candidate > best),
        weakest_skill: pick_skill(&skills, |candidate, best| candidate < best),
        recommendations: weak_area_recommendations(&skills),
        total_practice_minutes: completed.len() * MINUTES_PER_INTERVIEW,
        skills_breakdown: skills
            .into_iter()
            .map(|s| SkillScore {
                score: round_score(s.score),
                ..s
            })
            .collect(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unrounded mean of each sub-score across sessions; empty when there are none.
fn skills_breakdown<'a>(overalls: impl Iterator<Item = &'a OverallEvaluation>) -> Vec<SkillScore> {
    let mut totals: Vec<SkillScore> = Vec::new();
    let mut count = 0usize;

    for overall in overalls {
        count += 1;
        for (idx, (skill, score)) in overall.skill_breakdown().into_iter().enumerate() {
            match totals.get_mut(idx) {
                Some(total) => total.score += score,
                None => totals.push(SkillScore { skill, score }),
            }
        }
    }

    for total in &mut totals {
        total.score /= count as f64;
    }
    totals
}

/// First skill that wins against every later one; ties keep the earlier skill.
fn pick_skill(skills: &[SkillScore], better: impl Fn(f64, f64) -> bool) -> Option<&'static str> {
    skills
        .iter()
        .fold(None::<&SkillScore>, |best, s| match best {
            Some(b) if !better(s.score, b.score) => Some(b),
            _ => Some(s),
        })
        .map(|s| s.skill)
}

fn weak_area_recommendations(skills: &[SkillScore]) -> Vec<String> {
    skills
        .iter()
        .filter(|s| s.score < WEAK_SKILL_THRESHOLD)
        .filter_map(|s| match s.skill {
            "Technical Skills" => Some("Focus on technical skill development"),
            "Communication" => Some("Practice communication and presentation skills"),
            "Problem Solving" => Some("Work on problem-solving methodologies"),
            _ => None,
        })
        .map(str::to_string)
        .collect()
}
