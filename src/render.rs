//! Report rendering
//!
//! Text and JSON views over a finished report. Renderers take the report by
//! shared reference: presentation can reword, it can never re-score or
//! re-order.

use clap::ValueEnum;

use crate::error::Result;
use crate::schema::AnalysisReport;

/// Output format selector for the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Optional rewording hook applied to rendered text, e.g. for a second
/// language. Operates on finished text only.
pub trait Translator {
    fn translate(&self, text: &str) -> Result<String>;
}

/// Render the full report as JSON
pub fn render_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| crate::error::FaultlineError::Internal {
            message: format!("report serialization failed: {}", e),
        })
}

/// Render the report as human-readable text
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{}: {}\n",
        report.incident.kind, report.incident.message
    ));
    if let Some(frame) = report.incident.innermost_frame() {
        out.push_str(&format!(
            "  at {} in {}\n",
            frame.location, frame.raw_function
        ));
    }
    if let Some(rev) = &report.revision {
        out.push_str(&format!("  revision {}\n", rev));
    }
    if report.partial {
        out.push_str("  (partial result: analysis hit its time budget)\n");
    }

    if report.causes.is_empty() {
        out.push_str("\nNo probable cause identified.\n");
    }

    for (i, ranked) in report.causes.iter().enumerate() {
        let cause = &ranked.cause;
        out.push_str(&format!(
            "\n{}. [{:>3.0}%] {}\n",
            i + 1,
            cause.confidence * 100.0,
            cause.description
        ));
        for evidence in &cause.evidence {
            out.push_str(&format!(
                "     evidence: {} ({})\n",
                evidence.explanation, evidence.location
            ));
        }
        for (j, solution) in ranked.solutions.iter().enumerate() {
            out.push_str(&format!(
                "     fix {}: {} [risk: {:?}, effort: {}]\n",
                j + 1,
                solution.title,
                solution.risk,
                solution.effort.describe()
            ));
        }
    }

    if !report.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &report.warnings {
            out.push_str(&format!("  - {}\n", warning.describe()));
        }
    }

    out.push_str(&format!("\nAnalyzed in {}ms\n", report.duration_ms));
    out
}

/// Render as text, then pass the result through a translator
pub fn render_text_with(report: &AnalysisReport, translator: &dyn Translator) -> Result<String> {
    translator.translate(&render_text(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        AnalysisReport, ComplexityLevel, EffortLevel, ErrorCategory, Incident, RankedCause,
        RiskLevel, RootCause, Solution, StrategyKind, SCHEMA_VERSION,
    };

    fn report() -> AnalysisReport {
        AnalysisReport {
            schema_version: SCHEMA_VERSION.to_string(),
            incident: Incident {
                kind: "KeyError".to_string(),
                category: ErrorCategory::Key,
                severity: ErrorCategory::Key.severity(),
                message: "'user_id'".to_string(),
                frames: Vec::new(),
                locals: None,
                fingerprint: Incident::compute_fingerprint("KeyError", "'user_id'", &[]),
            },
            causes: vec![RankedCause {
                cause: RootCause {
                    description: "lookup without a presence check".to_string(),
                    confidence: 0.7,
                    evidence: Vec::new(),
                    strategy: StrategyKind::SymptomStructure,
                    anchor_symbol: None,
                },
                solutions: vec![Solution {
                    title: "Add an input validation guard".to_string(),
                    approach: "check presence first".to_string(),
                    risk: RiskLevel::Low,
                    complexity: ComplexityLevel::Low,
                    effort: EffortLevel::Minutes,
                    score: 0.75,
                    pros: Vec::new(),
                    cons: Vec::new(),
                }],
            }],
            warnings: Vec::new(),
            partial: false,
            revision: Some("a1b2c3d".to_string()),
            duration_ms: 8,
        }
    }

    #[test]
    fn test_text_names_cause_and_fix() {
        let text = render_text(&report());
        assert!(text.contains("KeyError: 'user_id'"));
        assert!(text.contains("lookup without a presence check"));
        assert!(text.contains("Add an input validation guard"));
        assert!(text.contains("revision a1b2c3d"));
    }

    #[test]
    fn test_json_round_trips() {
        let json = render_json(&report()).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report());
    }

    #[test]
    fn test_empty_causes_say_so() {
        let mut r = report();
        r.causes.clear();
        assert!(render_text(&r).contains("No probable cause identified"));
    }

    #[test]
    fn test_translator_receives_rendered_text() {
        struct Upper;
        impl Translator for Upper {
            fn translate(&self, text: &str) -> Result<String> {
                Ok(text.to_uppercase())
            }
        }
        let out = render_text_with(&report(), &Upper).unwrap();
        assert!(out.contains("KEYERROR"));
    }
}
