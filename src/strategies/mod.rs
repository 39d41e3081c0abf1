//! Root-cause analysis strategies
//!
//! The strategy catalog is a closed sum type ([`StrategyKind`]) dispatched
//! through one `analyze` method, keeping the set exhaustiveness-checked.
//! Strategies run independently over read-only inputs; a failure in one is
//! isolated by the engine and never blocks the others.

mod dependency;
mod fragile;
mod proximity;
mod symptom;

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::fragility::FragilityScorer;
use crate::history::HistoryLedger;
use crate::index::SymbolIndex;
use crate::schema::{Incident, RootCause, StrategyKind};

/// Read-only inputs shared by every strategy for one analysis session
pub struct StrategyContext<'a> {
    pub incident: &'a Incident,
    pub index: &'a SymbolIndex,
    pub ledger: &'a HistoryLedger,
    pub scorer: &'a FragilityScorer,
    pub config: &'a AnalysisConfig,
}

impl StrategyKind {
    /// Run one strategy against the incident. Emits zero or more candidate
    /// causes; empty output is a normal result, not a failure.
    pub fn analyze(&self, ctx: &StrategyContext) -> Result<Vec<RootCause>> {
        match self {
            Self::SymptomStructure => symptom::analyze(ctx),
            Self::ChangeProximity => proximity::analyze(ctx),
            Self::FragileRegion => fragile::analyze(ctx),
            Self::DependencyImpact => dependency::analyze(ctx),
        }
    }
}

/// Merge, deduplicate, and order candidate causes from all strategies.
///
/// Dedup key is (anchor, strategy category): the highest-confidence
/// instance survives with the union of evidence. Causes whose frames never
/// resolved have no anchor symbol; their evidence location anchors them
/// instead, so candidates at unrelated locations stay distinct. Ordering is
/// confidence descending, then evidence count descending, then description
/// ascending, fully deterministic across runs.
pub fn aggregate(candidates: Vec<RootCause>) -> Vec<RootCause> {
    let mut merged: HashMap<(String, StrategyKind), RootCause> = HashMap::new();

    for mut cause in candidates {
        cause.confidence = cause.confidence.clamp(0.0, 1.0);
        let anchor = cause
            .anchor_symbol
            .clone()
            .or_else(|| cause.evidence.first().map(|e| e.location.to_string()))
            .unwrap_or_else(|| cause.description.clone());
        let key = (anchor, cause.strategy);

        match merged.get_mut(&key) {
            Some(existing) => {
                for ev in cause.evidence {
                    if !existing.evidence.contains(&ev) {
                        existing.evidence.push(ev);
                    }
                }
                if cause.confidence > existing.confidence {
                    existing.confidence = cause.confidence;
                    existing.description = cause.description;
                }
            }
            None => {
                merged.insert(key, cause);
            }
        }
    }

    let mut causes: Vec<RootCause> = merged.into_values().collect();
    causes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.evidence.len().cmp(&a.evidence.len()))
            .then_with(|| a.description.cmp(&b.description))
    });
    causes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Evidence, SourceLocation};

    fn cause(
        desc: &str,
        confidence: f64,
        strategy: StrategyKind,
        anchor: Option<&str>,
        evidence: usize,
    ) -> RootCause {
        RootCause {
            description: desc.to_string(),
            confidence,
            evidence: (0..evidence)
                .map(|i| Evidence {
                    location: SourceLocation::new("f.py", i + 1),
                    explanation: format!("evidence {}", i),
                })
                .collect(),
            strategy,
            anchor_symbol: anchor.map(String::from),
        }
    }

    #[test]
    fn test_aggregate_sorted_by_confidence() {
        let causes = aggregate(vec![
            cause("low", 0.3, StrategyKind::FragileRegion, Some("a"), 1),
            cause("high", 0.9, StrategyKind::ChangeProximity, Some("b"), 1),
            cause("mid", 0.6, StrategyKind::SymptomStructure, Some("c"), 1),
        ]);

        let confidences: Vec<f64> = causes.iter().map(|c| c.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.6, 0.3]);
    }

    #[test]
    fn test_aggregate_dedup_keeps_max_and_unions_evidence() {
        let a = cause("weak take", 0.4, StrategyKind::ChangeProximity, Some("lib.get"), 1);
        let mut b = cause("strong take", 0.8, StrategyKind::ChangeProximity, Some("lib.get"), 0);
        b.evidence.push(Evidence {
            location: SourceLocation::new("other.py", 9),
            explanation: "different evidence".to_string(),
        });

        let merged = aggregate(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].confidence, 0.8);
        assert_eq!(merged[0].description, "strong take");
        assert_eq!(merged[0].evidence.len(), 2);
    }

    #[test]
    fn test_aggregate_distinct_strategies_not_merged() {
        let merged = aggregate(vec![
            cause("a", 0.5, StrategyKind::ChangeProximity, Some("lib.get"), 1),
            cause("b", 0.5, StrategyKind::FragileRegion, Some("lib.get"), 1),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_tie_break_evidence_then_description() {
        let merged = aggregate(vec![
            cause("zeta", 0.5, StrategyKind::ChangeProximity, Some("a"), 1),
            cause("alpha", 0.5, StrategyKind::FragileRegion, Some("b"), 1),
            cause("more evidence", 0.5, StrategyKind::SymptomStructure, Some("c"), 3),
        ]);

        assert_eq!(merged[0].description, "more evidence");
        assert_eq!(merged[1].description, "alpha");
        assert_eq!(merged[2].description, "zeta");
    }

    #[test]
    fn test_unanchored_causes_at_distinct_locations_stay_distinct() {
        let mut outer = cause("outer caller", 0.5, StrategyKind::SymptomStructure, None, 0);
        outer.evidence.push(Evidence {
            location: SourceLocation::new("app.py", 42),
            explanation: "frame `outer` in the failing call chain".to_string(),
        });
        let mut inner = cause("inner guard", 0.4, StrategyKind::SymptomStructure, None, 0);
        inner.evidence.push(Evidence {
            location: SourceLocation::new("lib.py", 7),
            explanation: "frame `inner` in the failing call chain".to_string(),
        });

        let merged = aggregate(vec![outer, inner]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_unanchored_causes_at_same_location_still_merge() {
        let mut a = cause("first take", 0.5, StrategyKind::SymptomStructure, None, 0);
        a.evidence.push(Evidence {
            location: SourceLocation::new("lib.py", 7),
            explanation: "one".to_string(),
        });
        let mut b = cause("second take", 0.6, StrategyKind::SymptomStructure, None, 0);
        b.evidence.push(Evidence {
            location: SourceLocation::new("lib.py", 7),
            explanation: "two".to_string(),
        });

        let merged = aggregate(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].confidence, 0.6);
    }

    #[test]
    fn test_confidence_clamped() {
        let merged = aggregate(vec![cause("hot", 1.7, StrategyKind::FragileRegion, None, 1)]);
        assert_eq!(merged[0].confidence, 1.0);
    }

    #[test]
    fn test_aggregate_deterministic_across_input_order() {
        let a = vec![
            cause("x", 0.5, StrategyKind::ChangeProximity, Some("a"), 1),
            cause("y", 0.5, StrategyKind::FragileRegion, Some("b"), 1),
            cause("z", 0.7, StrategyKind::SymptomStructure, Some("c"), 1),
        ];
        let mut b = a.clone();
        b.reverse();

        let da: Vec<String> = aggregate(a).into_iter().map(|c| c.description).collect();
        let db: Vec<String> = aggregate(b).into_iter().map(|c| c.description).collect();
        assert_eq!(da, db);
    }
}
