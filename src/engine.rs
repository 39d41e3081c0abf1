//! Analysis pipeline
//!
//! One engine owns the history ledger and the result cache for a codebase
//! root. Each analysis rebuilds the symbol index, normalizes the trace,
//! runs the enabled strategies in parallel, aggregates their candidates,
//! and ranks remediations per cause. The whole pipeline runs under a
//! cooperative deadline checked at stage boundaries and before each
//! strategy.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::config::AnalysisConfig;
use crate::error::{FaultlineError, Result, Warning};
use crate::fragility::{FragilityScorer, Normalizer};
use crate::history::{self, HistoryLedger, HistorySource};
use crate::index::SymbolIndex;
use crate::schema::{AnalysisReport, RankedCause, RootCause, StrategyKind, SCHEMA_VERSION};
use crate::solutions;
use crate::strategies::{aggregate, StrategyContext};
use crate::trace::IncidentBuilder;

/// One raw failure to analyze
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    /// Raw trace text as captured from the failing process
    pub raw_trace: String,

    /// Optional local-variable snapshot from the innermost frame
    pub locals: Option<BTreeMap<String, String>>,
}

impl AnalysisRequest {
    pub fn new(raw_trace: impl Into<String>) -> Self {
        Self {
            raw_trace: raw_trace.into(),
            locals: None,
        }
    }
}

/// Analysis engine for one codebase root
pub struct Engine {
    root: PathBuf,
    config: AnalysisConfig,
    ledger: HistoryLedger,
    cache: ResultCache,
}

impl Engine {
    /// Create an engine backed by the version-control CLI at `root`
    pub fn new(root: impl Into<PathBuf>, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let root = root.into();
        let source = Box::new(history::source_for(&root));
        Ok(Self::with_source(root, config, source))
    }

    /// Create an engine with an explicit history backend
    pub fn with_source(
        root: PathBuf,
        config: AnalysisConfig,
        source: Box<dyn HistorySource>,
    ) -> Self {
        let ledger = HistoryLedger::new(source, config.history.clone());
        Self {
            root,
            config,
            ledger,
            cache: ResultCache::new(),
        }
    }

    /// Analyze one failure against the current codebase snapshot.
    ///
    /// Results are cached by (fingerprint, revision); concurrent calls for
    /// the same key share a single computation, and a deadline-truncated
    /// report is returned without being cached. A malformed trace fails
    /// before the cache is consulted.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<Arc<AnalysisReport>> {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.config.timeout_ms);

        // Pre-parse against an empty index only to validate the trace and
        // obtain the fingerprint; symbol resolution does not participate in
        // fingerprinting, so the key matches the full parse below.
        let probe = IncidentBuilder::new()
            .with_root(&self.root)
            .build(&request.raw_trace, &SymbolIndex::default())?;

        let revision = self.ledger.head_revision();
        let key = (probe.fingerprint.clone(), revision.clone());

        self.cache
            .get_or_compute(key, || self.run(request, revision, started, deadline))
    }

    /// Analyze without consulting or populating the result cache
    pub fn analyze_uncached(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.config.timeout_ms);
        let revision = self.ledger.head_revision();
        self.run(request, revision, started, deadline)
    }

    fn run(
        &self,
        request: &AnalysisRequest,
        revision: Option<String>,
        started: Instant,
        deadline: Instant,
    ) -> Result<AnalysisReport> {
        let mut warnings: Vec<Warning> = Vec::new();

        let history_available = self.ledger.is_available();
        if !history_available {
            warn!(root = %self.root.display(), "history unavailable, forensic strategies skipped");
            warnings.push(Warning::HistoryUnavailable {
                detail: format!("no readable history at {}", self.root.display()),
            });
        }

        let (index, index_warnings) = SymbolIndex::rebuild(&self.root, &self.config.scan);
        warnings.extend(index_warnings);
        debug!(
            symbols = index.symbol_count(),
            files = index.file_count(),
            "symbol index ready"
        );

        let incident = IncidentBuilder::new().with_root(&self.root).build_with_locals(
            &request.raw_trace,
            &index,
            request.locals.clone(),
        )?;

        let scorer = self.build_scorer();

        let enabled: Vec<StrategyKind> = self
            .config
            .enabled_strategies()
            .into_iter()
            .filter(|s| history_available || !s.needs_history())
            .collect();
        let total = enabled.len();

        if Instant::now() >= deadline {
            return Err(FaultlineError::Timeout {
                budget_ms: self.config.timeout_ms,
            });
        }

        let ctx = StrategyContext {
            incident: &incident,
            index: &index,
            ledger: &self.ledger,
            scorer: &scorer,
            config: &self.config,
        };

        // None marks a strategy the deadline preempted before it started
        let outcomes: Vec<(StrategyKind, Option<Result<Vec<RootCause>>>)> = enabled
            .par_iter()
            .map(|strategy| {
                if Instant::now() >= deadline {
                    return (*strategy, None);
                }
                (*strategy, Some(strategy.analyze(&ctx)))
            })
            .collect();

        let mut candidates: Vec<RootCause> = Vec::new();
        let mut completed = 0usize;
        for (strategy, outcome) in outcomes {
            match outcome {
                Some(Ok(causes)) => {
                    completed += 1;
                    candidates.extend(causes);
                }
                Some(Err(err)) => {
                    // one failed strategy never blocks the others
                    warn!(strategy = %strategy, error = %err, "strategy failed");
                    warnings.push(Warning::StrategyFailure {
                        strategy: strategy.as_str().to_string(),
                        detail: err.to_string(),
                    });
                    completed += 1;
                }
                None => {}
            }
        }

        let partial = completed < total;
        if partial {
            warnings.push(Warning::TimeoutPartial { completed, total });
        }

        let causes = aggregate(candidates);
        if partial && causes.is_empty() {
            return Err(FaultlineError::Timeout {
                budget_ms: self.config.timeout_ms,
            });
        }

        let ranked: Vec<RankedCause> = causes
            .into_iter()
            .map(|cause| {
                let solutions = solutions::rank(&cause, incident.category, &self.config.tradeoff);
                RankedCause { cause, solutions }
            })
            .collect();

        let report = AnalysisReport {
            schema_version: SCHEMA_VERSION.to_string(),
            incident,
            causes: ranked,
            warnings,
            partial,
            revision,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        debug_assert!(report.is_sorted());
        info!(
            causes = report.causes.len(),
            partial = report.partial,
            duration_ms = report.duration_ms,
            "analysis complete"
        );
        Ok(report)
    }

    /// Fragility scorer normalized against the repo's recent churn
    fn build_scorer(&self) -> FragilityScorer {
        let stats = self.ledger.repo_churn(self.config.history.window_days);
        let normalizer = Normalizer::from_stats(&stats, self.ledger.now());
        FragilityScorer::new(self.config.fragility.clone(), normalizer, self.ledger.now())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}
