//! CLI argument definitions using clap with subcommand architecture

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::prompt::ExplanationDepth;
use crate::render::OutputFormat;
use crate::schema::StrategyKind;

/// Diagnostic correlation engine for runtime failures
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(about = "Correlates runtime errors with code structure and change history")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH", env = "FAULTLINE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands for faultline
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a runtime failure trace against a codebase
    #[command(visible_alias = "a")]
    Analyze(AnalyzeArgs),

    /// Rebuild the symbol index and dump its statistics
    Index(IndexArgs),

    /// Rank the codebase's fragility hot spots
    Hotspots(HotspotsArgs),

    /// Show the last commit that touched one line
    Blame(BlameArgs),
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Trace file to analyze, or `-` for stdin
    #[arg(value_name = "TRACE")]
    pub trace: String,

    /// Codebase root the trace came from
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Depth of the explanation context emitted with the report
    #[arg(long, value_enum, default_value = "detailed")]
    pub depth: ExplanationDepth,

    /// Target language for the rendered report (e.g. `es`, `fr`)
    #[arg(long, value_name = "CODE")]
    pub lang: Option<String>,

    /// Skip the result cache for this analysis
    #[arg(long)]
    pub no_cache: bool,

    /// Override the analysis timeout budget
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Override the churn window
    #[arg(long, value_name = "DAYS")]
    pub window_days: Option<u32>,

    /// Run only these strategies (repeatable)
    #[arg(long = "strategy", value_name = "NAME")]
    pub strategies: Vec<StrategyKind>,
}

/// Arguments for the index command
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Codebase root to index
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,
}

/// Arguments for the hotspots command
#[derive(Args, Debug)]
pub struct HotspotsArgs {
    /// Codebase root to examine
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Override the churn window
    #[arg(long, value_name = "DAYS")]
    pub window_days: Option<u32>,

    /// Maximum number of files reported
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

/// Arguments for the blame command
#[derive(Args, Debug)]
pub struct BlameArgs {
    /// File path relative to the codebase root
    #[arg(value_name = "FILE")]
    pub file: String,

    /// 1-indexed line number
    #[arg(value_name = "LINE")]
    pub line: usize,

    /// Codebase root
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,
}
