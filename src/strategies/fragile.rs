//! Fragile-region strategy
//!
//! Flags known hot spots: files whose fragility score exceeds the
//! configured threshold, independent of trace proximity. Hot spots that
//! also appear in the failing call chain get a confidence bump.

use super::StrategyContext;
use crate::error::Result;
use crate::schema::{Evidence, RootCause, SourceLocation, StrategyKind};

/// Hot spots reported per incident
const MAX_HOT_SPOTS: usize = 5;

/// How much of the score carries into confidence for files outside the trace
const OFF_TRACE_SCALE: f64 = 0.8;

/// Bump for hot spots that appear in the failing call chain
const ON_TRACE_BONUS: f64 = 0.1;

pub fn analyze(ctx: &StrategyContext) -> Result<Vec<RootCause>> {
    let window = ctx.config.history.window_days;
    let mut stats = ctx.ledger.repo_churn(window);

    // deterministic: strongest hot spots first, file name as tiebreak
    stats.sort_by(|a, b| {
        let sa = ctx.scorer.score(a);
        let sb = ctx.scorer.score(b);
        sb.partial_cmp(&sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.file.cmp(&b.file))
    });

    let mut causes = Vec::new();
    for stat in &stats {
        if causes.len() >= MAX_HOT_SPOTS {
            break;
        }
        let score = ctx.scorer.score(stat);
        if !ctx.scorer.is_hot_spot(score) {
            continue;
        }

        let on_trace = ctx
            .incident
            .frames
            .iter()
            .any(|f| f.location.file == stat.file);

        let confidence = if on_trace {
            score * OFF_TRACE_SCALE + ON_TRACE_BONUS
        } else {
            score * OFF_TRACE_SCALE
        };

        // anchor to the first symbol of the file so distinct hot spots
        // survive aggregation; fall back to the path itself
        let anchor = ctx
            .index
            .symbols_defined_in(&stat.file)
            .first()
            .map(|s| s.qualified_name.clone())
            .unwrap_or_else(|| stat.file.clone());

        let mut evidence = vec![Evidence {
            location: SourceLocation::new(stat.file.clone(), 1),
            explanation: format!(
                "{} change(s) by {} author(s) in the last {} days, fragility {:.2} (threshold {:.2})",
                stat.change_count,
                stat.author_count,
                window,
                score,
                ctx.scorer.threshold()
            ),
        }];
        if stat.bug_fix_count > 0 {
            evidence.push(Evidence {
                location: SourceLocation::new(stat.file.clone(), 1),
                explanation: format!(
                    "{} of those commits look like bug fixes",
                    stat.bug_fix_count
                ),
            });
        }

        causes.push(RootCause {
            description: format!(
                "{} is a known hot spot ({})",
                stat.file,
                if on_trace {
                    "and appears in this trace"
                } else {
                    "not in this trace, but historically unstable"
                }
            ),
            confidence,
            evidence,
            strategy: StrategyKind::FragileRegion,
            anchor_symbol: Some(anchor),
        });
    }

    Ok(causes)
}
