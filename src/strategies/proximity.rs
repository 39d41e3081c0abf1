//! Change-proximity strategy
//!
//! A line that failed shortly after being changed is a strong root-cause
//! signal. Blame on each frame's failing line finds the last modifying
//! revision; a revision inside the recency window raises confidence, which
//! decays linearly with age down to a configured floor.

use chrono::{DateTime, Utc};

use super::StrategyContext;
use crate::error::Result;
use crate::schema::{Evidence, RevisionRecord, RootCause, StrategyKind};

/// Confidence discount when only the file (not the exact line) changed
/// inside the window
const FILE_LEVEL_DISCOUNT: f64 = 0.75;

pub fn analyze(ctx: &StrategyContext) -> Result<Vec<RootCause>> {
    let window_days = ctx.config.proximity.window_days;
    let floor = ctx.config.proximity.floor;
    let now = ctx.ledger.now();

    let mut causes = Vec::new();

    for frame in ctx.incident.frames.iter().rev() {
        let file = &frame.location.file;
        let anchor = frame.symbol.as_ref().map(|s| s.qualified_name.clone());

        // exact-line attribution first
        if let Some(revision) = ctx.ledger.blame_line(file, frame.location.line) {
            if let Some(age) = age_days(&revision, now) {
                if age <= f64::from(window_days) {
                    let confidence = decay(age, window_days, floor);
                    causes.push(RootCause {
                        description: format!(
                            "{} was last modified {} day(s) before this failure ({} by {})",
                            frame.location, age.round() as i64, revision.short_id, revision.author
                        ),
                        confidence,
                        evidence: vec![
                            Evidence {
                                location: frame.location.clone(),
                                explanation: format!(
                                    "failing line attributed to {} \"{}\" ({})",
                                    revision.short_id, revision.subject, revision.timestamp
                                ),
                            },
                        ],
                        strategy: StrategyKind::ChangeProximity,
                        anchor_symbol: anchor.clone(),
                    });
                    continue;
                }
            }
        }

        // fall back to file-level proximity
        let recent = ctx.ledger.commits_touching(file, Some(window_days));
        if let Some(latest) = recent.first() {
            if let Some(age) = age_days(latest, now) {
                if age <= f64::from(window_days) {
                    let confidence = decay(age, window_days, floor) * FILE_LEVEL_DISCOUNT;
                    causes.push(RootCause {
                        description: format!(
                            "{} changed {} day(s) before this failure ({} commit(s) in the window)",
                            file, age.round() as i64, recent.len()
                        ),
                        confidence,
                        evidence: vec![Evidence {
                            location: frame.location.clone(),
                            explanation: format!(
                                "most recent commit {} \"{}\" by {}",
                                latest.short_id, latest.subject, latest.author
                            ),
                        }],
                        strategy: StrategyKind::ChangeProximity,
                        anchor_symbol: anchor,
                    });
                }
            }
        }
    }

    Ok(causes)
}

/// Linear decay from 1.0 at age zero to `floor` at the window edge
fn decay(age_days: f64, window_days: u32, floor: f64) -> f64 {
    let window = f64::from(window_days.max(1));
    let fraction = (age_days / window).clamp(0.0, 1.0);
    floor + (1.0 - floor) * (1.0 - fraction)
}

fn age_days(revision: &RevisionRecord, now: DateTime<Utc>) -> Option<f64> {
    let ts = DateTime::parse_from_rfc3339(&revision.timestamp).ok()?;
    let seconds = now.signed_duration_since(ts.with_timezone(&Utc)).num_seconds();
    Some((seconds.max(0) as f64) / 86_400.0)
}
