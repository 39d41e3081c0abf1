//! Dependency-impact strategy
//!
//! Walks the call-edge graph outward from the innermost resolved symbol up
//! to a bounded depth. A neighbor that changed recently is surfaced as an
//! indirect cause; when history is unavailable the walk still emits
//! lower-confidence structural suspects from the graph shape alone.

use std::collections::{HashMap, VecDeque};

use chrono::DateTime;

use super::StrategyContext;
use crate::error::Result;
use crate::schema::{Evidence, RootCause, StrategyKind};

const NEIGHBOR_BASE: f64 = 0.45;
const DEPTH_DECAY: f64 = 0.75;
const RECENT_CHANGE_BONUS: f64 = 0.30;

/// Confidence scale when no history backs the graph signal
const GRAPH_ONLY_SCALE: f64 = 0.7;

pub fn analyze(ctx: &StrategyContext) -> Result<Vec<RootCause>> {
    let Some(start_frame) = ctx.incident.innermost_resolved() else {
        return Ok(Vec::new());
    };
    // innermost_resolved guarantees the symbol
    let start = start_frame.symbol.as_ref().unwrap().qualified_name.clone();

    // breadth-first over both edge directions, shortest distance wins
    let mut distance: HashMap<String, usize> = HashMap::new();
    distance.insert(start.clone(), 0);
    let mut queue = VecDeque::from([start.clone()]);

    while let Some(current) = queue.pop_front() {
        let d = distance[&current];
        if d >= ctx.config.dependency.max_depth {
            continue;
        }
        let neighbors = ctx
            .index
            .callees_of(&current)
            .into_iter()
            .chain(ctx.index.callers_of(&current));
        for neighbor in neighbors {
            if !distance.contains_key(neighbor) {
                distance.insert(neighbor.to_string(), d + 1);
                queue.push_back(neighbor.to_string());
            }
        }
    }

    let history_available = ctx.ledger.is_available();
    let window = ctx.config.proximity.window_days;

    let mut entries: Vec<(String, usize)> = distance
        .into_iter()
        .filter(|(name, d)| *d > 0 && *name != start)
        .collect();
    entries.sort();

    let mut causes = Vec::new();
    for (name, depth) in entries {
        let Some(symbol) = ctx.index.get(&name) else {
            continue;
        };
        let base = NEIGHBOR_BASE * DEPTH_DECAY.powi(depth as i32 - 1);

        let relation = if ctx.index.callees_of(&start).contains(&name.as_str()) {
            "callee"
        } else {
            "caller"
        };

        if history_available {
            let commits = ctx.ledger.commits_touching(&symbol.location.file, Some(window));
            let Some(latest) = commits.first() else {
                continue; // quiet neighbor, no indirect-change signal
            };
            let recency = recency_factor(&latest.timestamp, ctx, window);
            causes.push(RootCause {
                description: format!(
                    "{} ({} of {}) changed recently and may no longer match its contract",
                    name, relation, start
                ),
                confidence: base + RECENT_CHANGE_BONUS * recency,
                evidence: vec![
                    Evidence {
                        location: symbol.location.clone(),
                        explanation: format!(
                            "{} is {} call edge(s) from the failure site",
                            name, depth
                        ),
                    },
                    Evidence {
                        location: symbol.location.clone(),
                        explanation: format!(
                            "last commit {} \"{}\" by {} ({})",
                            latest.short_id, latest.subject, latest.author, latest.timestamp
                        ),
                    },
                ],
                strategy: StrategyKind::DependencyImpact,
                anchor_symbol: Some(name),
            });
        } else {
            causes.push(RootCause {
                description: format!(
                    "{} ({} of {}) sits on the failing path and is a structural suspect",
                    name, relation, start
                ),
                confidence: base * GRAPH_ONLY_SCALE,
                evidence: vec![Evidence {
                    location: symbol.location.clone(),
                    explanation: format!(
                        "{} is {} call edge(s) from the failure site (no history to confirm)",
                        name, depth
                    ),
                }],
                strategy: StrategyKind::DependencyImpact,
                anchor_symbol: Some(name),
            });
        }
    }

    Ok(causes)
}

/// 1.0 for a change right now, 0.0 at or beyond the window edge
fn recency_factor(timestamp: &str, ctx: &StrategyContext, window_days: u32) -> f64 {
    let Ok(ts) = DateTime::parse_from_rfc3339(timestamp) else {
        return 0.0;
    };
    let age_days = ctx
        .ledger
        .now()
        .signed_duration_since(ts.with_timezone(&chrono::Utc))
        .num_seconds()
        .max(0) as f64
        / 86_400.0;
    (1.0 - age_days / f64::from(window_days.max(1))).clamp(0.0, 1.0)
}
