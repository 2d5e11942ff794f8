//! Read-side views over completed sessions: per-session reports and
//! cross-session trend summaries.

pub mod handlers;
pub mod report;
pub mod trends;

pub use report::{MarkdownReportRenderer, ReportRenderer};
