//! Analysis configuration with TOML overlay
//!
//! All knobs default to usable values; a config file only needs the keys it
//! wants to change.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FaultlineError, Result};
use crate::schema::StrategyKind;

/// Top-level configuration for one analysis session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Whole-pipeline timeout budget in milliseconds
    pub timeout_ms: u64,

    /// Strategies to run. Empty means all.
    pub strategies: Vec<StrategyKind>,

    pub scan: ScanConfig,
    pub history: HistoryConfig,
    pub fragility: FragilityConfig,
    pub proximity: ProximityConfig,
    pub dependency: DependencyConfig,
    pub tradeoff: TradeoffConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            strategies: Vec::new(),
            scan: ScanConfig::default(),
            history: HistoryConfig::default(),
            fragility: FragilityConfig::default(),
            proximity: ProximityConfig::default(),
            dependency: DependencyConfig::default(),
            tradeoff: TradeoffConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file, overlaying the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|_| FaultlineError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| FaultlineError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject weight values a scorer cannot normalize
    pub fn validate(&self) -> Result<()> {
        let f = &self.fragility;
        if f.churn_weight < 0.0 || f.diversity_weight < 0.0 || f.recency_weight < 0.0 {
            return Err(FaultlineError::ConfigError {
                message: "fragility weights must be non-negative".to_string(),
            });
        }
        if f.churn_weight + f.diversity_weight + f.recency_weight == 0.0 {
            return Err(FaultlineError::ConfigError {
                message: "at least one fragility weight must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&f.hot_spot_threshold) {
            return Err(FaultlineError::ConfigError {
                message: "fragility.hot_spot_threshold must be in [0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.proximity.floor) {
            return Err(FaultlineError::ConfigError {
                message: "proximity.floor must be in [0, 1]".to_string(),
            });
        }
        Ok(())
    }

    /// The effective strategy set: the configured subset, or all of them
    pub fn enabled_strategies(&self) -> Vec<StrategyKind> {
        if self.strategies.is_empty() {
            StrategyKind::ALL.to_vec()
        } else {
            self.strategies.clone()
        }
    }
}

/// Codebase scan limits for the symbol index rebuild
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum directory depth
    pub max_depth: usize,

    /// Directory names skipped outright, in addition to .gitignore
    pub excluded_dirs: Vec<String>,

    /// Files larger than this are skipped (bytes)
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            excluded_dirs: vec![
                "node_modules".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
                "target".to_string(),
                "dist".to_string(),
            ],
            max_file_size: 1_000_000,
        }
    }
}

/// History ledger limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Churn window in days
    pub window_days: u32,

    /// Maximum commits read per log query
    pub commit_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_days: 90,
            commit_limit: 500,
        }
    }
}

/// Weights for the fragility score axes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FragilityConfig {
    pub churn_weight: f64,
    pub diversity_weight: f64,
    pub recency_weight: f64,

    /// Fragility above this marks a file as a known hot spot
    pub hot_spot_threshold: f64,
}

impl Default for FragilityConfig {
    fn default() -> Self {
        Self {
            churn_weight: 0.4,
            diversity_weight: 0.3,
            recency_weight: 0.3,
            hot_spot_threshold: 0.6,
        }
    }
}

/// Change-proximity strategy tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Recency window in days for "changed close to the failure"
    pub window_days: u32,

    /// Confidence floor the linear decay never drops below
    pub floor: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            floor: 0.25,
        }
    }
}

/// Dependency-impact strategy tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Maximum call-edge distance walked from the innermost resolved symbol
    pub max_depth: usize,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self { max_depth: 2 }
    }
}

/// Weights for the solution trade-off function:
/// `score = risk_weight*(1-risk) + complexity_weight*(1-complexity) - effort_weight*effort`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeoffConfig {
    pub risk_weight: f64,
    pub complexity_weight: f64,
    pub effort_weight: f64,

    /// Scores within this distance are treated as ties
    pub tie_threshold: f64,
}

impl Default for TradeoffConfig {
    fn default() -> Self {
        Self {
            risk_weight: 0.4,
            complexity_weight: 0.35,
            effort_weight: 0.25,
            tie_threshold: 0.05,
        }
    }
}
