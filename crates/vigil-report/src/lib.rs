//! Report rendering for Vigil wellness sessions.
//!
//! Rendering is split into two passes. The layout pass
//! ([`layout::assessment_layout`] / [`layout::summary_layout`]) is a pure
//! function of its inputs and produces a [`layout::ReportLayout`] — the
//! ordered blocks of the document. The painting pass ([`pdf`]) turns a
//! layout into PDF bytes with the builtin Helvetica faces. Characters the
//! builtin encoding cannot represent are replaced during layout, never an
//! error, and every report ends with the fixed disclaimer section.

pub mod layout;
mod pdf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use layout::{ReportLayout, DISCLAIMER};

/// Rendering failures. Isolated by callers: a session keeps its assessment
/// even when the report cannot be produced.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Header metadata for a rendered report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportMeta {
    /// Stamped into the "Generated:" header line.
    pub generated_at: DateTime<Utc>,
    /// Start of the session the report describes, when known.
    pub session_started_at: Option<DateTime<Utc>>,
}

impl ReportMeta {
    pub fn now() -> Self {
        Self {
            generated_at: Utc::now(),
            session_started_at: None,
        }
    }
}

/// Structured vitals summary for the report variant not tied to a live
/// session. Field defaults mirror an empty dashboard session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSummary {
    pub avg_hr: f64,
    pub avg_rr: f64,
    pub max_tremor: f64,
    pub dominant_mood: String,
    pub session_duration: String,
    pub conditions: Vec<String>,
}

impl Default for SessionSummary {
    fn default() -> Self {
        Self {
            avg_hr: 0.0,
            avg_rr: 0.0,
            max_tremor: 0.0,
            dominant_mood: "Neutral".to_string(),
            session_duration: "0m 0s".to_string(),
            conditions: Vec::new(),
        }
    }
}

/// Render an assessment-text report.
pub fn render_assessment(text: &str, meta: &ReportMeta) -> Result<Vec<u8>, ReportError> {
    pdf::paint(&layout::assessment_layout(text, meta))
}

/// Render a structured-summary report.
pub fn render_summary(summary: &SessionSummary, meta: &ReportMeta) -> Result<Vec<u8>, ReportError> {
    pdf::paint(&layout::summary_layout(summary, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_meta() -> ReportMeta {
        ReportMeta {
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap(),
            session_started_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 14, 25, 0).unwrap()),
        }
    }

    #[test]
    fn assessment_report_is_a_pdf() {
        let bytes = render_assessment("Posture: good. Breathing: normal.", &fixed_meta()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn summary_report_is_a_pdf() {
        let summary = SessionSummary {
            avg_hr: 72.4,
            avg_rr: 15.1,
            max_tremor: 0.021,
            dominant_mood: "Calm".into(),
            session_duration: "4m 12s".into(),
            conditions: vec!["Slightly elevated heart rate noted.".into()],
        };
        let bytes = render_summary(&summary, &fixed_meta()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn unencodable_characters_do_not_fail_rendering() {
        let text = "Observations: 患者 is fine — no concerns 🙂";
        let bytes = render_assessment(text, &fixed_meta()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn summary_deserializes_with_defaults() {
        let summary: SessionSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(summary.dominant_mood, "Neutral");
        assert_eq!(summary.session_duration, "0m 0s");
        assert!(summary.conditions.is_empty());
        assert_eq!(summary.avg_hr, 0.0);
    }
}
