//! Explanation context for an external text generator
//!
//! Analysis results can be handed to a text-generation collaborator for a
//! narrative explanation. This module only assembles the context; it never
//! generates text itself, and generation is strictly downstream of the
//! ranked report, which it cannot alter.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::AnalysisReport;

/// How much detail the generated explanation should carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationDepth {
    /// Plain-language summary for a reader unfamiliar with the codebase
    Simple,

    /// Causes with evidence and the recommended fix
    #[default]
    Detailed,

    /// Everything, including confidence figures and rejected alternatives
    Technical,
}

impl ExplanationDepth {
    fn audience_line(&self) -> &'static str {
        match self {
            Self::Simple => {
                "Explain in plain language for a reader who does not know this codebase. Avoid jargon."
            }
            Self::Detailed => {
                "Explain each probable cause with its evidence and recommend the top-ranked fix."
            }
            Self::Technical => {
                "Include confidence figures, every evidence item, and why lower-ranked fixes lost."
            }
        }
    }

    /// Causes included in the context at this depth
    fn cause_limit(&self) -> usize {
        match self {
            Self::Simple => 1,
            Self::Detailed => 3,
            Self::Technical => usize::MAX,
        }
    }
}

/// Structured context for one explanation request
#[derive(Debug, Clone, Serialize)]
pub struct ExplanationPrompt {
    pub depth: ExplanationDepth,
    pub instruction: String,
    pub context: String,
}

impl ExplanationPrompt {
    /// Assemble the context from a finished report. Read-only over the
    /// report; the ranked order is reproduced verbatim.
    pub fn build(report: &AnalysisReport, depth: ExplanationDepth) -> Self {
        let mut context = String::new();
        context.push_str(&format!(
            "Failure: {}: {}\n",
            report.incident.kind, report.incident.message
        ));

        if let Some(frame) = report.incident.innermost_frame() {
            context.push_str(&format!(
                "Failing location: {} in {}\n",
                frame.location, frame.raw_function
            ));
        }

        if let Some(locals) = &report.incident.locals {
            context.push_str("Local variables at the failure:\n");
            for (name, value) in locals {
                context.push_str(&format!("  {} = {}\n", name, value));
            }
        }

        for (i, ranked) in report.causes.iter().take(depth.cause_limit()).enumerate() {
            let cause = &ranked.cause;
            context.push_str(&format!(
                "\nCause {} ({:.0}% confidence): {}\n",
                i + 1,
                cause.confidence * 100.0,
                cause.description
            ));
            for evidence in &cause.evidence {
                context.push_str(&format!(
                    "  - {}: {}\n",
                    evidence.location, evidence.explanation
                ));
            }
            if let Some(best) = ranked.solutions.first() {
                context.push_str(&format!(
                    "  Recommended fix: {} ({})\n",
                    best.title,
                    best.effort.describe()
                ));
            }
        }

        if !report.warnings.is_empty() {
            context.push_str("\nCaveats:\n");
            for warning in &report.warnings {
                context.push_str(&format!("  - {}\n", warning.describe()));
            }
        }

        Self {
            depth,
            instruction: depth.audience_line().to_string(),
            context,
        }
    }
}

/// External text-generation backend. Implementations live outside this
/// crate; analysis never depends on one being present.
pub trait TextGenerator {
    fn generate(&self, prompt: &ExplanationPrompt) -> Result<String>;
}
