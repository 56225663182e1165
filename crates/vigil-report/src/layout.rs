//! Pure layout pass: inputs → ordered document blocks.
//!
//! Everything here is deterministic for identical inputs; the painting
//! pass never makes layout decisions beyond page breaks.

use chrono::{DateTime, Utc};

use crate::{ReportMeta, SessionSummary};

/// Fixed disclaimer appended to every report.
pub const DISCLAIMER: &str = "Disclaimer: This report is generated by an AI assistant \
    for research and educational purposes only. It is NOT a medical diagnosis. \
    If you feel unwell, please consult a licensed healthcare professional.";

pub(crate) const REPORT_TITLE: &str = "Vigil  -  Wellness Report";

/// Column budget for wrapped body text at the body font size.
const BODY_COLS: usize = 88;
/// Column budget inside the narrower disclaimer box.
const DISCLAIMER_COLS: usize = 96;

/// One visual block of the report, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Dark banner with the report title and a metadata line.
    HeaderBar { title: String, subtitle: String },
    /// Accent-colored section heading with an underline rule.
    SectionTitle(String),
    /// Wrapped body text, one entry per line.
    Paragraph(Vec<String>),
    /// Bold label + plain value on one line.
    MetricRow { label: String, value: String },
    /// One condition bullet; `flagged` selects the alert color.
    Condition { text: String, flagged: bool },
    /// Vertical gap in millimeters.
    Spacer(f32),
    /// Tinted box holding the wrapped disclaimer lines.
    DisclaimerBox(Vec<String>),
}

/// An ordered sequence of [`Block`]s ready for painting.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub blocks: Vec<Block>,
}

/// Layout for the assessment-text report.
pub fn assessment_layout(text: &str, meta: &ReportMeta) -> ReportLayout {
    let started = meta
        .session_started_at
        .map(format_clock)
        .unwrap_or_else(|| "--".to_string());
    let subtitle = format!(
        "Generated: {}   |   Session started: {}",
        format_stamp(meta.generated_at),
        started
    );

    let mut blocks = vec![
        Block::HeaderBar {
            title: REPORT_TITLE.to_string(),
            subtitle,
        },
        Block::SectionTitle("AI Wellness Assessment".to_string()),
        Block::Paragraph(wrap(&sanitize(text), BODY_COLS)),
        Block::Spacer(8.0),
    ];
    blocks.push(disclaimer_block());
    ReportLayout { blocks }
}

/// Layout for the structured-summary report.
pub fn summary_layout(summary: &SessionSummary, meta: &ReportMeta) -> ReportLayout {
    let subtitle = format!(
        "Generated: {}   |   Duration: {}",
        format_stamp(meta.generated_at),
        sanitize(&summary.session_duration)
    );

    let mut blocks = vec![
        Block::HeaderBar {
            title: REPORT_TITLE.to_string(),
            subtitle,
        },
        Block::SectionTitle("Vital Metrics".to_string()),
        Block::MetricRow {
            label: "Average Heart Rate:".to_string(),
            value: rate_value(summary.avg_hr),
        },
        Block::MetricRow {
            label: "Average Respiratory Rate:".to_string(),
            value: rate_value(summary.avg_rr),
        },
        Block::MetricRow {
            label: "Maximum Tremor Index:".to_string(),
            value: if summary.max_tremor > 0.0 {
                format!("{:.3}", summary.max_tremor)
            } else {
                "N/A".to_string()
            },
        },
        Block::MetricRow {
            label: "Dominant Mood:".to_string(),
            value: sanitize(&summary.dominant_mood),
        },
        Block::Spacer(6.0),
        Block::SectionTitle("Detected Conditions / Symptoms".to_string()),
    ];

    if is_all_clear(&summary.conditions) {
        blocks.push(Block::Condition {
            text: "No significant conditions detected.".to_string(),
            flagged: false,
        });
    } else {
        for condition in &summary.conditions {
            blocks.push(Block::Condition {
                text: sanitize(condition),
                flagged: true,
            });
        }
    }

    blocks.push(Block::Spacer(8.0));
    blocks.push(disclaimer_block());
    ReportLayout { blocks }
}

fn disclaimer_block() -> Block {
    Block::DisclaimerBox(wrap(DISCLAIMER, DISCLAIMER_COLS))
}

fn rate_value(value: f64) -> String {
    if value > 0.0 {
        format!("{} BPM", value.round() as i64)
    } else {
        "N/A".to_string()
    }
}

/// An empty list, or a single negative finding, counts as all clear.
fn is_all_clear(conditions: &[String]) -> bool {
    conditions.is_empty() || (conditions.len() == 1 && conditions[0].contains("No"))
}

fn format_stamp(ts: DateTime<Utc>) -> String {
    ts.format("%B %d, %Y  %I:%M %p").to_string()
}

fn format_clock(ts: DateTime<Utc>) -> String {
    ts.format("%I:%M %p").to_string()
}

/// Lossy replacement of characters outside the builtin font encoding.
///
/// The builtin faces cover Latin-1; anything beyond that becomes `?`,
/// matching how the dashboard's fields are already constrained.
pub(crate) fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' => '\n',
            c if (c as u32) < 0x20 => ' ',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

/// Greedy word wrap honoring embedded newlines; overlong words are split.
pub(crate) fn wrap(text: &str, cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let raw_line = raw_line.trim_end();
        if raw_line.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut line = String::new();
        for word in raw_line.split_whitespace() {
            let mut word = word;
            // Hard-split words that cannot fit on any line.
            while word.chars().count() > cols {
                let split: String = word.chars().take(cols).collect();
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(split.clone());
                word = &word[split.len()..];
            }
            let needed = word.chars().count() + if line.is_empty() { 0 } else { 1 };
            if line.chars().count() + needed > cols && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
