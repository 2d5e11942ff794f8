//! Per-session report: the structured view served by the report endpoint and the
//! document rendered for storage once a session completes.

use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::SessionError;
use crate::evaluation::round_score;
use crate::models::language::Language;
use crate::models::session::{AnswerEvaluation, InterviewSession};

/// Transcripts at or above this many characters are left out of the document.
const TRANSCRIPT_INCLUDE_LIMIT: usize = 2000;
/// Included transcripts are cut to this many characters.
const TRANSCRIPT_TRUNCATE_AT: usize = 1500;
/// Items shown per strengths / areas / recommendations list.
const MAX_LIST_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceLevel {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => PerformanceLevel::Excellent,
            s if s >= 80.0 => PerformanceLevel::VeryGood,
            s if s >= 70.0 => PerformanceLevel::Good,
            s if s >= 60.0 => PerformanceLevel::Fair,
            _ => PerformanceLevel::NeedsImprovement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewInfo {
    pub interview_id: i64,
    pub language: Language,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `H:MM:SS`
    pub duration: String,
    pub duration_minutes: f64,
    pub total_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub overall_score: f64,
    pub average_score: f64,
    pub technical_skills: f64,
    pub communication: f64,
    pub problem_solving: f64,
    pub performance_level: PerformanceLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedAnalysis {
    pub summary: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatistics {
    pub highest_score: f64,
    pub lowest_score: f64,
    pub questions_above_70: usize,
    pub questions_below_50: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub interview_info: InterviewInfo,
    pub performance_summary: PerformanceSummary,
    pub detailed_analysis: DetailedAnalysis,
    pub question_by_question: Vec<AnswerEvaluation>,
    pub transcript: String,
    pub report_key: Option<String>,
    pub statistics: ReportStatistics,
}

impl SessionReport {
    /// Builds the report for a completed session.
    pub fn build(session: &InterviewSession) -> Result<Self, SessionError> {
        let (Some(overall), Some(end_time)) = (session.overall.as_ref(), session.ended_at) else {
            return Err(SessionError::NotCompleted(session.id));
        };

        let duration = end_time - session.started_at;
        let scores: Vec<f64> = session.history.iter().map(|a| a.score).collect();

        Ok(SessionReport {
            interview_info: InterviewInfo {
                interview_id: session.id,
                language: session.language,
                start_time: session.started_at,
                end_time,
                duration: format_duration(duration),
                duration_minutes: round_score(duration.num_milliseconds() as f64 / 60_000.0),
                total_questions: session.history.len(),
            },
            performance_summary: PerformanceSummary {
                overall_score: overall.overall_score,
                average_score: session.average_score(),
                technical_skills: overall.technical_skills,
                communication: overall.communication,
                problem_solving: overall.problem_solving,
                performance_level: PerformanceLevel::from_score(overall.overall_score),
            },
            detailed_analysis: DetailedAnalysis {
                summary: overall.summary.clone(),
                strengths: overall.strengths.clone(),
                areas_for_improvement: overall.areas_for_improvement.clone(),
                recommendations: overall.recommendations.clone(),
            },
            question_by_question: session.history.clone(),
            transcript: session.transcript.clone(),
            report_key: session.report_key.clone(),
            statistics: ReportStatistics {
                highest_score: scores.iter().copied().reduce(f64::max).unwrap_or(0.0),
                lowest_score: scores.iter().copied().reduce(f64::min).unwrap_or(0.0),
                questions_above_70: scores.iter().filter(|&&s| s >= 70.0).count(),
                questions_below_50: scores.iter().filter(|&&s| s < 50.0).count(),
            },
        })
    }
}

/// Formats a non-negative duration as `H:MM:SS`.
fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Turns a report into a stored document. Failures are the caller's to absorb:
/// a session completes whether or not its document could be produced.
pub trait ReportRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn extension(&self) -> &'static str;
    fn render(&self, report: &SessionReport) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReportRenderer;

impl ReportRenderer for MarkdownReportRenderer {
    fn content_type(&self) -> &'static str {
        "text/markdown"
    }

    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, report: &SessionReport) -> Result<Vec<u8>> {
        Ok(render_report_to_md(report, Utc::now()).into_bytes())
    }
}

/// Assessment band used in the rendered document.
fn assessment(score: f64) -> &'static str {
    match score {
        s if s >= 85.0 => "Excellent performance",
        s if s >= 70.0 => "Good performance",
        s if s >= 50.0 => "Average performance",
        _ => "Needs improvement",
    }
}

/// Ten-cell text bar, one cell per ten points.
fn progress_bar(score: f64) -> String {
    let filled = ((score / 10.0).floor().max(0.0) as usize).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn push_numbered(md: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("## {title}\n\n"));
    for (i, item) in items.iter().take(MAX_LIST_ITEMS).enumerate() {
        md.push_str(&format!("{}. {}\n", i + 1, item));
    }
    md.push('\n');
}

pub fn render_report_to_md(report: &SessionReport, generated_at: DateTime<Utc>) -> String {
    let info = &report.interview_info;
    let perf = &report.performance_summary;
    let analysis = &report.detailed_analysis;

    let mut md = String::from("# AI Interview Assessment Report\n\n");

    md.push_str("## Interview Information\n\n");
    md.push_str(&format!("- **Interview:** #{}\n", info.interview_id));
    md.push_str(&format!("- **Language:** {}\n", info.language.name()));
    md.push_str(&format!(
        "- **Date:** {}\n",
        generated_at.format("%B %d, %Y at %H:%M")
    ));
    md.push_str(&format!("- **Interview Duration:** {}\n", info.duration));
    md.push_str(&format!("- **Questions Answered:** {}\n\n", info.total_questions));

    md.push_str(&format!("## Overall Score: {}/100\n\n", perf.overall_score));
    md.push_str(&format!("Assessment: {}\n\n", assessment(perf.overall_score)));

    md.push_str("## Skills Assessment\n\n");
    for (skill, score) in [
        ("Technical Skills", perf.technical_skills),
        ("Communication", perf.communication),
        ("Problem Solving", perf.problem_solving),
    ] {
        md.push_str(&format!("- **{skill}:** {score}/100\n"));
        md.push_str(&format!("  `{} {score}%`\n", progress_bar(score)));
    }
    md.push('\n');

    md.push_str("## Performance Summary\n\n");
    if analysis.summary.trim().is_empty() {
        md.push_str("Performance summary not available.\n\n");
    } else {
        md.push_str(&format!("{}\n\n", analysis.summary));
    }

    push_numbered(&mut md, "Key Strengths", &analysis.strengths);
    push_numbered(&mut md, "Areas for Improvement", &analysis.areas_for_improvement);
    push_numbered(&mut md, "Recommendations", &analysis.recommendations);

    let transcript_len = report.transcript.chars().count();
    if transcript_len > 0 && transcript_len < TRANSCRIPT_INCLUDE_LIMIT {
        md.push_str("## Interview Transcript\n\n```text\n");
        if transcript_len > TRANSCRIPT_TRUNCATE_AT {
            let cut: String = report.transcript.chars().take(TRANSCRIPT_TRUNCATE_AT).collect();
            md.push_str(&cut);
            md.push_str("...");
        } else {
            md.push_str(&report.transcript);
        }
        md.push_str("\n```\n\n");
    }

    md.push_str("---\n\n_Generated by AI Interview CRM Platform_\n");
    md
}

/// Renders the report and stores it under `reports/<user>/<session>-<uuid>.<ext>`.
/// Returns the object key.
pub async fn upload_report(
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    renderer: &dyn ReportRenderer,
    user_id: i64,
    report: &SessionReport,
) -> Result<String> {
    let body = renderer.render(report)?;
    let s3_key = format!(
        "reports/{}/{}-{}.{}",
        user_id,
        report.interview_info.interview_id,
        Uuid::new_v4(),
        renderer.extension()
    );

    s3.put_object()
        .bucket(s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(body))
        .content_type(renderer.content_type())
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

    info!("Uploaded interview report to s3://{}/{}", s3_bucket, s3_key);
    Ok(s3_key)
}
