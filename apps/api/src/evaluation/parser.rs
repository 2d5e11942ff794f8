//! Labeled-field extraction from loosely formatted generated text.
//!
//! A `Schema` is an ordered list of `(label, kind, default)` rules. Parsing finds
//! every `LABEL:` occurrence of the schema's labels (case-insensitive); a field's
//! content runs until the next recognized label or the end of the text. Missing
//! labels and unparseable content fall back to the rule's default. Parsing never
//! fails.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

pub mod labels {
    pub const SCORE: &str = "SCORE";
    pub const STRENGTHS: &str = "STRENGTHS";
    pub const IMPROVEMENTS: &str = "IMPROVEMENTS";
    pub const SUGGESTIONS: &str = "SUGGESTIONS";

    pub const OVERALL_SCORE: &str = "OVERALL_SCORE";
    pub const TECHNICAL_SKILLS: &str = "TECHNICAL_SKILLS";
    pub const COMMUNICATION: &str = "COMMUNICATION";
    pub const PROBLEM_SOLVING: &str = "PROBLEM_SOLVING";
    pub const SUMMARY: &str = "SUMMARY";
    pub const AREAS_FOR_IMPROVEMENT: &str = "AREAS_FOR_IMPROVEMENT";
    pub const RECOMMENDATIONS: &str = "RECOMMENDATIONS";
}

/// Default for unmatched numeric fields in both schemas.
pub const DEFAULT_SCORE: i64 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::List(_) => FieldKind::List,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub label: &'static str,
    pub default: FieldValue,
}

impl FieldRule {
    pub fn integer(label: &'static str, default: i64) -> Self {
        Self {
            label,
            default: FieldValue::Integer(default),
        }
    }

    pub fn text(label: &'static str, default: &str) -> Self {
        Self {
            label,
            default: FieldValue::Text(default.to_string()),
        }
    }

    pub fn list(label: &'static str, default: &[&str]) -> Self {
        Self {
            label,
            default: FieldValue::List(default.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.default.kind()
    }
}

#[derive(Debug)]
pub struct Schema {
    rules: Vec<FieldRule>,
    /// Labels opening a line (after optional bullets or bold markers).
    line_label_pattern: Regex,
    /// Labels anywhere; only used for labels never seen at a line start.
    label_pattern: Regex,
}

impl Schema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        let mut alternatives: Vec<&str> = rules.iter().map(|r| r.label).collect();
        // Longest first so a label never shadows a longer one sharing its prefix.
        alternatives.sort_by_key(|l| std::cmp::Reverse(l.len()));
        let alternation = alternatives
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|");
        let line_label_pattern =
            Regex::new(&format!(r"(?im)^[ \t*#>-]*\b({alternation})\b[*\s]*:"))
                .expect("escaped label alternation is a valid regex");
        let label_pattern = Regex::new(&format!(r"(?i)\b({alternation})\b[*\s]*:"))
            .expect("escaped label alternation is a valid regex");

        Self {
            rules,
            line_label_pattern,
            label_pattern,
        }
    }

    /// `(label as written, start of the label, start of its content)` for every
    /// recognized label, in text order. A label found at a line start is trusted
    /// over inline mentions of it, so `communication:` inside a summary does not
    /// end the summary when a `COMMUNICATION:` line exists.
    fn marks<'t>(&self, raw: &'t str) -> Vec<(&'t str, usize, usize)> {
        let mut marks = find_labels(&self.line_label_pattern, raw);
        let inline: Vec<_> = find_labels(&self.label_pattern, raw)
            .into_iter()
            .filter(|(label, _, _)| !marks.iter().any(|(l, _, _)| l.eq_ignore_ascii_case(label)))
            .collect();
        marks.extend(inline);
        marks.sort_by_key(|&(_, start, _)| start);
        marks
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

/// Per-answer feedback: SCORE / STRENGTHS / IMPROVEMENTS / SUGGESTIONS.
pub fn feedback_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![
            FieldRule::integer(labels::SCORE, DEFAULT_SCORE),
            FieldRule::list(labels::STRENGTHS, &[]),
            FieldRule::list(labels::IMPROVEMENTS, &[]),
            FieldRule::list(labels::SUGGESTIONS, &[]),
        ])
    })
}

/// End-of-interview synthesis.
pub fn overall_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![
            FieldRule::integer(labels::OVERALL_SCORE, DEFAULT_SCORE),
            FieldRule::integer(labels::TECHNICAL_SKILLS, DEFAULT_SCORE),
            FieldRule::integer(labels::COMMUNICATION, DEFAULT_SCORE),
            FieldRule::integer(labels::PROBLEM_SOLVING, DEFAULT_SCORE),
            FieldRule::text(labels::SUMMARY, "No summary provided."),
            FieldRule::list(labels::STRENGTHS, &["No strengths provided."]),
            FieldRule::list(
                labels::AREAS_FOR_IMPROVEMENT,
                &["No areas for improvement provided."],
            ),
            FieldRule::list(labels::RECOMMENDATIONS, &["No recommendations provided."]),
        ])
    })
}

/// Parsed values, one per schema rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFields {
    values: HashMap<&'static str, FieldValue>,
}

impl ParsedFields {
    pub fn integer(&self, label: &str) -> Option<i64> {
        match self.values.get(label) {
            Some(FieldValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, label: &str) -> Option<&str> {
        match self.values.get(label) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn list(&self, label: &str) -> Option<&[String]> {
        match self.values.get(label) {
            Some(FieldValue::List(items)) => Some(items),
            _ => None,
        }
    }

    /// Owned copy of a list field; empty when the label is not in the schema.
    pub fn list_owned(&self, label: &str) -> Vec<String> {
        self.list(label).map(<[String]>::to_vec).unwrap_or_default()
    }
}

fn find_labels<'t>(pattern: &Regex, raw: &'t str) -> Vec<(&'t str, usize, usize)> {
    pattern
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(1)?;
            Some((label.as_str(), whole.start(), whole.end()))
        })
        .collect()
}

/// Extracts every schema field from `raw`, using defaults for anything missing.
pub fn parse(raw: &str, schema: &Schema) -> ParsedFields {
    let marks = schema.marks(raw);

    let values = schema
        .rules
        .iter()
        .map(|rule| {
            let content = marks
                .iter()
                .position(|(label, _, _)| label.eq_ignore_ascii_case(rule.label))
                .map(|i| {
                    let start = marks[i].2;
                    let end = marks.get(i + 1).map_or(raw.len(), |next| next.1);
                    &raw[start..end]
                });

            let value = content
                .and_then(|c| parse_value(c, rule.kind()))
                .unwrap_or_else(|| rule.default.clone());
            (rule.label, value)
        })
        .collect();

    ParsedFields { values }
}

fn parse_value(content: &str, kind: FieldKind) -> Option<FieldValue> {
    let content = content.trim_start_matches(|c: char| c == '*' || c.is_whitespace());
    match kind {
        FieldKind::Integer => {
            let digits: String = content.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok().map(FieldValue::Integer)
        }
        FieldKind::Text => {
            let text = content.trim();
            (!text.is_empty()).then(|| FieldValue::Text(text.to_string()))
        }
        FieldKind::List => {
            let items = split_items(content);
            (!items.is_empty()).then_some(FieldValue::List(items))
        }
    }
}

/// Splits list content on newlines and bullet markers into trimmed, non-empty items.
fn split_items(content: &str) -> Vec<String> {
    content
        .lines()
        .flat_map(|line| line.split('•'))
        .flat_map(|piece| piece.split(" - "))
        .flat_map(|piece| piece.split(" * "))
        .map(strip_marker)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes a leading bullet (`-`, `*`, `•`) or `1.` / `1)` numbering, plus bold markers.
fn strip_marker(item: &str) -> &str {
    let item = item
        .trim()
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•'))
        .trim_start();

    let digits = item.chars().take_while(char::is_ascii_digit).count();
    let item = match item[digits..].chars().next() {
        Some('.') | Some(')') if digits > 0 => item[digits + 1..].trim_start(),
        _ => item,
    };

    item.trim_matches('*').trim()
}
