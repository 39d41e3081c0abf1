//! Solution catalog and trade-off ranking
//!
//! Remediations come from a fixed catalog of archetypes filtered by
//! applicability against the root cause's originating strategy and error
//! category, then ordered by a weighted trade-off score. The ranker orders
//! by trade-off only, never by cause confidence: when scores are close, the
//! safer incremental fix wins over the aggressive one by design.

use crate::config::TradeoffConfig;
use crate::schema::{
    ComplexityLevel, EffortLevel, ErrorCategory, RiskLevel, RootCause, Solution, StrategyKind,
};

/// One remediation archetype in the catalog
struct Archetype {
    title: &'static str,
    approach: &'static str,
    risk: RiskLevel,
    complexity: ComplexityLevel,
    effort: EffortLevel,
    pros: &'static [&'static str],
    cons: &'static [&'static str],
    applies: fn(StrategyKind, ErrorCategory) -> bool,
}

/// The catalog, in declaration order. Order matters: exact trade-off ties
/// resolve to the earlier entry.
const CATALOG: &[Archetype] = &[
    Archetype {
        title: "Add an input validation guard",
        approach: "Validate the offending value (bounds, presence, shape) where it enters the failing function and return a domain error instead of letting the guard trip",
        risk: RiskLevel::Low,
        complexity: ComplexityLevel::Low,
        effort: EffortLevel::Minutes,
        pros: &["small localized diff", "prevents the whole error class at this site"],
        cons: &["treats this call site only; other paths stay exposed"],
        applies: |strategy, category| {
            category.is_guard_violation()
                && matches!(
                    strategy,
                    StrategyKind::SymptomStructure | StrategyKind::ChangeProximity
                )
        },
    },
    Archetype {
        title: "Wrap the call defensively",
        approach: "Wrap the failing call in explicit error handling at the caller identified by the analysis and supply a safe fallback value",
        risk: RiskLevel::Low,
        complexity: ComplexityLevel::Low,
        effort: EffortLevel::Minutes,
        pros: &["no change to the callee's contract"],
        cons: &["can mask the underlying defect if the fallback is too forgiving"],
        applies: |strategy, _| {
            matches!(
                strategy,
                StrategyKind::SymptomStructure | StrategyKind::DependencyImpact
            )
        },
    },
    Archetype {
        title: "Refactor the fragile region",
        approach: "Split the hot spot into smaller units with explicit contracts, adding tests for the seams the incident crossed",
        risk: RiskLevel::High,
        complexity: ComplexityLevel::High,
        effort: EffortLevel::Days,
        pros: &["addresses the structural cause, not the symptom", "pays down the churn that keeps breaking this file"],
        cons: &["large diff", "needs review from the file's frequent authors"],
        applies: |strategy, _| {
            matches!(
                strategy,
                StrategyKind::FragileRegion | StrategyKind::SymptomStructure
            )
        },
    },
    Archetype {
        title: "Fix environment or configuration",
        approach: "Verify the path, permission, or configuration value the failure points at and correct it at the deployment boundary",
        risk: RiskLevel::Low,
        complexity: ComplexityLevel::Low,
        effort: EffortLevel::Minutes,
        pros: &["no code change"],
        cons: &["only helps when the defect really is environmental"],
        applies: |_, category| {
            matches!(
                category,
                ErrorCategory::Io | ErrorCategory::Permission | ErrorCategory::Import
            )
        },
    },
    Archetype {
        title: "Align with the changed dependency",
        approach: "Review the recent change in the neighboring symbol the analysis flagged and update this call site to its current contract",
        risk: RiskLevel::Medium,
        complexity: ComplexityLevel::Medium,
        effort: EffortLevel::Hours,
        pros: &["fixes the actual contract drift"],
        cons: &["requires understanding the neighbor's change history"],
        applies: |strategy, category| {
            strategy == StrategyKind::DependencyImpact
                || (strategy == StrategyKind::ChangeProximity
                    && category == ErrorCategory::Import)
        },
    },
];

/// Trade-off score:
/// `w1*(1-risk) + w2*(1-complexity) - w3*effort`, all axes normalized.
fn tradeoff_score(archetype: &Archetype, weights: &TradeoffConfig) -> f64 {
    weights.risk_weight * (1.0 - archetype.risk.normalized())
        + weights.complexity_weight * (1.0 - archetype.complexity.normalized())
        - weights.effort_weight * archetype.effort.normalized()
}

/// Generate and rank remediation options for one root cause.
///
/// Output is ordered by descending trade-off score; exact ties keep the
/// catalog's declaration order (the sort is stable over a catalog-ordered
/// input).
pub fn rank(cause: &RootCause, category: ErrorCategory, weights: &TradeoffConfig) -> Vec<Solution> {
    let mut solutions: Vec<Solution> = CATALOG
        .iter()
        .filter(|a| (a.applies)(cause.strategy, category))
        .map(|a| Solution {
            title: a.title.to_string(),
            approach: a.approach.to_string(),
            risk: a.risk,
            complexity: a.complexity,
            effort: a.effort,
            score: tradeoff_score(a, weights),
            pros: a.pros.iter().map(|s| s.to_string()).collect(),
            cons: a.cons.iter().map(|s| s.to_string()).collect(),
        })
        .collect();

    solutions.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    solutions
}
