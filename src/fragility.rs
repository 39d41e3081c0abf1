//! Fragility scoring from change history
//!
//! A fragility score estimates how failure-prone a file is from its churn,
//! author diversity, and recency of change. Each axis is min-max normalized
//! against the observed distribution so scores are comparable across files
//! with very different absolute churn.

use chrono::{DateTime, Utc};

use crate::config::FragilityConfig;
use crate::schema::ChurnStat;

/// One normalization axis over an observed distribution
#[derive(Debug, Clone, Copy, Default)]
struct Axis {
    min: f64,
    max: f64,
}

impl Axis {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            min = min.min(v);
            max = max.max(v);
        }
        if min.is_infinite() {
            return Self::default();
        }
        Self { min, max }
    }

    /// Normalize to [0, 1], clamped. A degenerate axis (all values equal)
    /// maps any positive value to 1 so a lone churning file still scores.
    fn normalize(&self, value: f64) -> f64 {
        if self.max <= self.min {
            return if value > 0.0 { 1.0 } else { 0.0 };
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Min-max normalizer built from the churn distribution of one codebase.
///
/// Swappable by construction: a percentile-based variant only needs to
/// produce the same three axes.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    churn: Axis,
    authors: Axis,
    age_days: Axis,
}

impl Normalizer {
    pub fn from_stats(stats: &[ChurnStat], now: DateTime<Utc>) -> Self {
        Self {
            churn: Axis::from_values(stats.iter().map(|s| s.change_count as f64)),
            authors: Axis::from_values(stats.iter().map(|s| s.author_count as f64)),
            age_days: Axis::from_values(stats.iter().filter_map(|s| age_in_days(s, now))),
        }
    }
}

fn age_in_days(stat: &ChurnStat, now: DateTime<Utc>) -> Option<f64> {
    let ts = stat.last_change.as_deref()?;
    let parsed = DateTime::parse_from_rfc3339(ts).ok()?;
    let age = now.signed_duration_since(parsed.with_timezone(&Utc));
    Some((age.num_seconds().max(0) as f64) / 86_400.0)
}

/// Pure scorer over churn statistics. Deterministic for identical inputs.
#[derive(Debug, Clone)]
pub struct FragilityScorer {
    weights: FragilityConfig,
    normalizer: Normalizer,
    now: DateTime<Utc>,
}

impl FragilityScorer {
    pub fn new(weights: FragilityConfig, normalizer: Normalizer, now: DateTime<Utc>) -> Self {
        Self {
            weights,
            normalizer,
            now,
        }
    }

    /// Score in [0, 1]. Monotone non-decreasing in change count and author
    /// count with the other axes held fixed.
    pub fn score(&self, stat: &ChurnStat) -> f64 {
        let w = &self.weights;
        let total = w.churn_weight + w.diversity_weight + w.recency_weight;

        let churn = self.normalizer.churn.normalize(stat.change_count as f64);
        let diversity = self.normalizer.authors.normalize(stat.author_count as f64);

        // More recent change = higher fragility, so invert normalized age.
        // No recorded change contributes zero recency.
        let recency = match age_in_days(stat, self.now) {
            Some(age) => 1.0 - self.normalizer.age_days.normalize(age),
            None => 0.0,
        };

        (w.churn_weight * churn + w.diversity_weight * diversity + w.recency_weight * recency)
            / total
    }

    /// Whether a score marks a known hot spot
    pub fn is_hot_spot(&self, score: f64) -> bool {
        score > self.weights.hot_spot_threshold
    }

    pub fn threshold(&self) -> f64 {
        self.weights.hot_spot_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stat(file: &str, changes: usize, authors: usize, last: Option<&str>) -> ChurnStat {
        ChurnStat {
            file: file.to_string(),
            change_count: changes,
            author_count: authors,
            last_change: last.map(String::from),
            bug_fix_count: 0,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn scorer(stats: &[ChurnStat]) -> FragilityScorer {
        FragilityScorer::new(
            FragilityConfig::default(),
            Normalizer::from_stats(stats, now()),
            now(),
        )
    }

    #[test]
    fn test_score_in_unit_interval() {
        let stats = vec![
            stat("a.py", 30, 5, Some("2025-05-30T00:00:00+00:00")),
            stat("b.py", 1, 1, Some("2024-01-01T00:00:00+00:00")),
        ];
        let s = scorer(&stats);
        for st in &stats {
            let score = s.score(st);
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn test_monotone_in_churn_count() {
        let stats = vec![
            stat("a.py", 0, 2, None),
            stat("b.py", 50, 2, None),
        ];
        let s = scorer(&stats);

        let mut prev = -1.0;
        for changes in [0, 5, 10, 25, 50] {
            let score = s.score(&stat("x.py", changes, 2, None));
            assert!(score >= prev, "score decreased at churn {}", changes);
            prev = score;
        }
    }

    #[test]
    fn test_monotone_in_author_count() {
        let stats = vec![stat("a.py", 10, 1, None), stat("b.py", 10, 8, None)];
        let s = scorer(&stats);

        let mut prev = -1.0;
        for authors in [1, 2, 4, 8] {
            let score = s.score(&stat("x.py", 10, authors, None));
            assert!(score >= prev, "score decreased at {} authors", authors);
            prev = score;
        }
    }

    #[test]
    fn test_recent_change_scores_higher() {
        let stats = vec![
            stat("fresh.py", 10, 2, Some("2025-05-31T00:00:00+00:00")),
            stat("stale.py", 10, 2, Some("2023-01-01T00:00:00+00:00")),
        ];
        let s = scorer(&stats);
        assert!(s.score(&stats[0]) > s.score(&stats[1]));
    }

    #[test]
    fn test_deterministic() {
        let stats = vec![stat("a.py", 7, 3, Some("2025-05-01T00:00:00+00:00"))];
        let s = scorer(&stats);
        assert_eq!(s.score(&stats[0]), s.score(&stats[0]));
    }

    #[test]
    fn test_degenerate_distribution() {
        // single file: axes collapse, positive churn still registers
        let stats = vec![stat("only.py", 4, 2, None)];
        let s = scorer(&stats);
        assert!(s.score(&stats[0]) > 0.0);

        let quiet = stat("quiet.py", 0, 0, None);
        assert_eq!(s.score(&quiet), 0.0);
    }
}
