//! Faultline: diagnostic correlation engine for runtime failures
//!
//! Faultline takes a raw runtime error (exception kind, stack trace,
//! optional local variables), correlates it against the structure of the
//! codebase and its version-control history, and produces ranked probable
//! root causes, each with remediation options ordered by a risk / complexity
//! / effort trade-off.
//!
//! # Example
//!
//! ```ignore
//! use faultline::{AnalysisConfig, AnalysisRequest, Engine};
//!
//! let engine = Engine::new("/path/to/repo", AnalysisConfig::default())?;
//! let report = engine.analyze(&AnalysisRequest::new(raw_trace))?;
//! for ranked in &report.causes {
//!     println!("{:.0}% {}", ranked.cause.confidence * 100.0, ranked.cause.description);
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fragility;
pub mod history;
pub mod index;
pub mod lang;
pub mod prompt;
pub mod render;
pub mod schema;
pub mod solutions;
pub mod strategies;
pub mod trace;

// Re-export commonly used types
pub use cache::ResultCache;
pub use cli::Cli;
pub use config::AnalysisConfig;
pub use engine::{AnalysisRequest, Engine};
pub use error::{FaultlineError, Result, Warning};
pub use fragility::{FragilityScorer, Normalizer};
pub use history::{GitCli, HistoryLedger, HistorySource};
pub use index::SymbolIndex;
pub use lang::{Lang, LangFamily};
pub use prompt::{ExplanationDepth, ExplanationPrompt, TextGenerator};
pub use render::{render_json, render_text, OutputFormat, Translator};
pub use schema::{
    AnalysisReport, CallFrame, ChurnStat, ErrorCategory, Evidence, Incident, RankedCause,
    RevisionRecord, RootCause, Severity, Solution, SourceLocation, StrategyKind, Symbol,
    SymbolKind,
};
pub use trace::IncidentBuilder;
