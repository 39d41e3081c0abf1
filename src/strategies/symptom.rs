//! Symptom-vs-structure strategy
//!
//! A guard violation (index/key/type/value error) at the innermost frame is
//! usually the symptom: some caller produced the value that failed the
//! guard. This strategy emits the innermost frame as the symptom and each
//! caller frame as a candidate structural cause, weighting confidence
//! toward frames that resolved against the index and sit in fragile files.

use super::StrategyContext;
use crate::error::Result;
use crate::schema::{CallFrame, Evidence, RootCause, StrategyKind};

const SYMPTOM_BASE: f64 = 0.40;
const STRUCTURAL_BASE: f64 = 0.50;
const RESOLVED_BONUS: f64 = 0.20;
const FRAGILITY_WEIGHT: f64 = 0.15;
const DISTANCE_DECAY: f64 = 0.85;

pub fn analyze(ctx: &StrategyContext) -> Result<Vec<RootCause>> {
    let incident = ctx.incident;
    let Some(innermost) = incident.innermost_frame() else {
        return Ok(Vec::new());
    };

    let mut causes = Vec::new();

    if incident.category.is_guard_violation() && incident.frames.len() > 1 {
        // innermost frame: the symptom, reported at reduced confidence
        causes.push(frame_cause(
            ctx,
            innermost,
            SYMPTOM_BASE,
            format!(
                "{} at {} is the failing guard, likely a symptom of bad input from a caller",
                incident.kind, innermost.location
            ),
        ));

        // caller frames: structural candidates, decaying with distance
        let callers = &incident.frames[..incident.frames.len() - 1];
        for (distance, frame) in callers.iter().rev().enumerate() {
            let base = STRUCTURAL_BASE * DISTANCE_DECAY.powi(distance as i32);
            let what = frame
                .symbol
                .as_ref()
                .map(|s| s.qualified_name.clone())
                .unwrap_or_else(|| frame.raw_function.clone());
            causes.push(frame_cause(
                ctx,
                frame,
                base,
                format!(
                    "{} passes a value that fails the {} guard below it",
                    what, incident.kind
                ),
            ));
        }
    } else {
        // non-guard failures point at the innermost frame directly
        let what = innermost
            .symbol
            .as_ref()
            .map(|s| s.qualified_name.clone())
            .unwrap_or_else(|| innermost.raw_function.clone());
        causes.push(frame_cause(
            ctx,
            innermost,
            STRUCTURAL_BASE,
            format!("{} raised {} directly", what, incident.kind),
        ));
    }

    Ok(causes)
}

fn frame_cause(
    ctx: &StrategyContext,
    frame: &CallFrame,
    base: f64,
    description: String,
) -> RootCause {
    let mut confidence = base;
    let mut evidence = vec![Evidence {
        location: frame.location.clone(),
        explanation: format!("frame `{}` in the failing call chain", frame.raw_function),
    }];

    if let Some(symbol) = &frame.symbol {
        confidence += RESOLVED_BONUS;
        evidence.push(Evidence {
            location: symbol.location.clone(),
            explanation: format!(
                "resolved to {} {}",
                symbol.kind.as_str(),
                symbol.qualified_name
            ),
        });
    }

    let churn = ctx
        .ledger
        .churn(&frame.location.file, ctx.config.history.window_days);
    let fragility = ctx.scorer.score(&churn);
    if fragility > 0.0 {
        confidence += FRAGILITY_WEIGHT * fragility;
        evidence.push(Evidence {
            location: frame.location.clone(),
            explanation: format!(
                "{} changed {} times by {} author(s) in the last {} days (fragility {:.2})",
                frame.location.file,
                churn.change_count,
                churn.author_count,
                ctx.config.history.window_days,
                fragility
            ),
        });
    }

    RootCause {
        description,
        confidence,
        evidence,
        strategy: StrategyKind::SymptomStructure,
        anchor_symbol: frame.symbol.as_ref().map(|s| s.qualified_name.clone()),
    }
}
