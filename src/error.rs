//! Error types and exit codes for faultline

use std::process::ExitCode;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for faultline operations
#[derive(Error, Debug)]
pub enum FaultlineError {
    #[error("Malformed trace: {message}")]
    MalformedTrace { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },

    #[error("Analysis timed out after {budget_ms}ms with no partial result")]
    Timeout { budget_ms: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FaultlineError {
    /// Convert error to process exit code:
    /// - 0: Success
    /// - 1: File not found / IO error
    /// - 2: Malformed trace input
    /// - 3: Unsupported language
    /// - 4: Configuration error
    /// - 5: Timeout without any partial result
    /// - 6: Internal failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } => ExitCode::from(1),
            Self::Io(_) => ExitCode::from(1),
            Self::MalformedTrace { .. } => ExitCode::from(2),
            Self::UnsupportedLanguage { .. } => ExitCode::from(3),
            Self::ConfigError { .. } => ExitCode::from(4),
            Self::Timeout { .. } => ExitCode::from(5),
            Self::Internal { .. } => ExitCode::from(6),
        }
    }
}

/// Result type alias for faultline operations
pub type Result<T> = std::result::Result<T, FaultlineError>;

/// Soft conditions surfaced alongside a best-effort result.
///
/// None of these abort an analysis. They degrade confidence or completeness
/// and travel inside the report so callers can show them next to the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A file could not be fully parsed; its symbols are partial or absent.
    SymbolIndexPartial { file: String, detail: String },

    /// Version-control history could not be queried; forensic strategies
    /// were skipped.
    HistoryUnavailable { detail: String },

    /// One analysis strategy failed; its candidates are missing from the
    /// result but all other strategies ran.
    StrategyFailure { strategy: String, detail: String },

    /// The timeout budget expired before every strategy finished.
    TimeoutPartial { completed: usize, total: usize },
}

impl Warning {
    /// Short human-readable rendering for text output
    pub fn describe(&self) -> String {
        match self {
            Self::SymbolIndexPartial { file, detail } => {
                format!("partial symbols for {}: {}", file, detail)
            }
            Self::HistoryUnavailable { detail } => {
                format!("history unavailable: {}", detail)
            }
            Self::StrategyFailure { strategy, detail } => {
                format!("strategy {} failed: {}", strategy, detail)
            }
            Self::TimeoutPartial { completed, total } => {
                format!("timeout: {}/{} strategies completed", completed, total)
            }
        }
    }
}
