//! Core data model for incidents, root causes, and solutions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current schema version for output stability
pub const SCHEMA_VERSION: &str = "1.2";

/// Number of innermost frames hashed into an incident fingerprint.
///
/// Bounding the depth keeps fingerprints stable when outer harness frames
/// differ between runs of the same failing code path.
pub const FINGERPRINT_FRAME_DEPTH: usize = 5;

// FNV-1a constants for 64-bit hash
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Compute a stable FNV-1a hash (deterministic across runs and platforms)
///
/// Used for incident fingerprints and cache keys.
pub fn fnv1a_hash(data: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in data.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A position in a source file. Compared by structural equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path relative to the codebase root
    pub file: String,

    /// 1-indexed line number
    pub line: usize,

    /// 1-indexed column, when the source format provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(col) => write!(f, "{}:{}:{}", self.file, self.line, col),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// Kind of indexed symbol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    #[default]
    Function,
    Method,
    Class,
    Module,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Module => "module",
            Self::Variable => "variable",
        }
    }
}

/// An indexed symbol definition.
///
/// `enclosing` is a weak back-reference by qualified name. Symbols never own
/// each other; enclosing and call relations live in key-based adjacency
/// tables on the index so the ownership graph stays acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Qualified name, e.g. `lib.get_item` or `orders.Cart.total`
    pub qualified_name: String,

    pub kind: SymbolKind,

    /// Defining location (line of the definition header)
    pub location: SourceLocation,

    /// Last line of the definition body, for location→symbol resolution
    pub end_line: usize,

    /// Qualified name of the enclosing symbol, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
}

impl Symbol {
    /// Short name without the namespace prefix
    pub fn short_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// Whether a line of the defining file falls inside this definition
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.location.line && line <= self.end_line
    }
}

/// One frame of a normalized stack trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    pub location: SourceLocation,

    /// Symbol the frame resolved to, when the index knows the location.
    /// `None` means the frame stays in the incident as lower-confidence
    /// evidence; it is never substituted with a placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,

    /// Function name as printed in the raw trace
    pub raw_function: String,
}

/// Coarse classification of the exception kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Index,
    Key,
    Type,
    Value,
    Name,
    Attribute,
    Import,
    Io,
    Memory,
    Permission,
    Assertion,
    #[default]
    Other,
}

impl ErrorCategory {
    /// Classify an exception kind string, e.g. "IndexError"
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "IndexError" => Self::Index,
            "KeyError" => Self::Key,
            "TypeError" => Self::Type,
            "ValueError" => Self::Value,
            "NameError" => Self::Name,
            "AttributeError" => Self::Attribute,
            "ImportError" | "ModuleNotFoundError" => Self::Import,
            "FileNotFoundError" | "IOError" | "OSError" => Self::Io,
            "MemoryError" => Self::Memory,
            "PermissionError" => Self::Permission,
            "AssertionError" => Self::Assertion,
            _ => Self::Other,
        }
    }

    /// Whether this category names a guard violation (an operation applied
    /// to a value that failed a bounds/shape precondition). Guard
    /// violations point at symptoms; the structural cause is usually a
    /// caller that produced the bad value.
    pub fn is_guard_violation(&self) -> bool {
        matches!(self, Self::Index | Self::Key | Self::Type | Self::Value)
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Memory | Self::Permission => Severity::Critical,
            Self::Import => Severity::High,
            _ => Severity::Medium,
        }
    }
}

/// Error severity derived from its category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
}

/// A normalized runtime failure. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Exception kind, e.g. "IndexError"
    pub kind: String,

    pub category: ErrorCategory,

    pub severity: Severity,

    pub message: String,

    /// Frames ordered outermost to innermost
    pub frames: Vec<CallFrame>,

    /// Optional local-variable snapshot (name → textual representation).
    /// BTreeMap keeps serialization order deterministic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locals: Option<BTreeMap<String, String>>,

    /// Deterministic hash of kind + message + innermost frames
    pub fingerprint: String,
}

impl Incident {
    /// Compute the fingerprint for a (kind, message, frames) triple.
    ///
    /// Stable for identical inputs regardless of how the incident was
    /// constructed; only the innermost [`FINGERPRINT_FRAME_DEPTH`] frames
    /// participate.
    pub fn compute_fingerprint(kind: &str, message: &str, frames: &[CallFrame]) -> String {
        let mut input = format!("{}\x1f{}", kind, message);
        let innermost = frames.len().saturating_sub(FINGERPRINT_FRAME_DEPTH);
        for frame in &frames[innermost..] {
            input.push('\x1f');
            input.push_str(&frame.location.file);
            input.push(':');
            input.push_str(&frame.location.line.to_string());
            input.push(':');
            input.push_str(&frame.raw_function);
        }
        format!("{:016x}", fnv1a_hash(&input))
    }

    /// Innermost frame, if any
    pub fn innermost_frame(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Innermost frame that resolved against the symbol index
    pub fn innermost_resolved(&self) -> Option<&CallFrame> {
        self.frames.iter().rev().find(|f| f.symbol.is_some())
    }
}

/// Metadata for one commit, with per-file attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    /// Full commit id
    pub id: String,

    /// Abbreviated commit id (7 chars)
    pub short_id: String,

    pub author: String,

    /// Author date, RFC3339
    pub timestamp: String,

    /// Commit message (first line)
    pub subject: String,

    /// Files touched by this commit, relative to the repo root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_files: Vec<String>,
}

/// Change statistics for one file over a time window. Derived, cached per
/// (file, window) by the history ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnStat {
    pub file: String,

    /// Commits touching the file inside the window
    pub change_count: usize,

    /// Distinct authors inside the window
    pub author_count: usize,

    /// Most recent change timestamp (RFC3339), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change: Option<String>,

    /// Bug-fix commits inside the window (message pattern match)
    pub bug_fix_count: usize,
}

/// The closed set of root-cause analysis strategies.
///
/// A fixed sum type rather than open inheritance: the catalog is finite,
/// dispatch stays exhaustiveness-checked, and each variant is independently
/// failable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Distinguish the guard-violation symptom at the innermost frame from
    /// a structural cause higher in the call chain
    SymptomStructure,

    /// Raise confidence for causes in files changed close to the failure
    ChangeProximity,

    /// Flag known hot spots whose fragility exceeds the threshold
    FragileRegion,

    /// Walk call edges outward looking for recently changed neighbors
    DependencyImpact,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        Self::SymptomStructure,
        Self::ChangeProximity,
        Self::FragileRegion,
        Self::DependencyImpact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SymptomStructure => "symptom_structure",
            Self::ChangeProximity => "change_proximity",
            Self::FragileRegion => "fragile_region",
            Self::DependencyImpact => "dependency_impact",
        }
    }

    /// Whether the strategy needs version-control history to produce
    /// anything useful
    pub fn needs_history(&self) -> bool {
        matches!(self, Self::ChangeProximity | Self::FragileRegion)
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "symptom_structure" => Ok(Self::SymptomStructure),
            "change_proximity" => Ok(Self::ChangeProximity),
            "fragile_region" => Ok(Self::FragileRegion),
            "dependency_impact" => Ok(Self::DependencyImpact),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// One piece of supporting evidence for a root cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub location: SourceLocation,
    pub explanation: String,
}

/// A candidate structural explanation for an incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub description: String,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Ordered supporting evidence
    pub evidence: Vec<Evidence>,

    /// Strategy that emitted this cause
    pub strategy: StrategyKind,

    /// Qualified name of the innermost resolved symbol this cause is
    /// anchored to; part of the dedup key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_symbol: Option<String>,
}

impl RootCause {
    /// Dedup key: same anchor symbol and same strategy category collapse
    /// into the highest-confidence instance with merged evidence
    pub fn similarity_key(&self) -> (Option<&str>, StrategyKind) {
        (self.anchor_symbol.as_deref(), self.strategy)
    }
}

/// Risk level for a remediation option
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Normalized position in [0, 1] for the trade-off function
    pub fn normalized(&self) -> f64 {
        match self {
            Self::Low => 0.0,
            Self::Medium => 0.5,
            Self::High => 1.0,
        }
    }
}

/// Implementation complexity for a remediation option
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

impl ComplexityLevel {
    pub fn normalized(&self) -> f64 {
        match self {
            Self::Low => 0.0,
            Self::Medium => 0.5,
            Self::High => 1.0,
        }
    }
}

/// Ordinal effort estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Minutes,
    Hours,
    Days,
}

impl EffortLevel {
    pub fn normalized(&self) -> f64 {
        match self {
            Self::Minutes => 0.0,
            Self::Hours => 0.5,
            Self::Days => 1.0,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Minutes => "under an hour",
            Self::Hours => "a few hours",
            Self::Days => "a day or more",
        }
    }
}

/// A remediation option attached to exactly one root cause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub title: String,

    pub approach: String,

    pub risk: RiskLevel,

    pub complexity: ComplexityLevel,

    pub effort: EffortLevel,

    /// Trade-off score this solution was ranked by
    pub score: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pros: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cons: Vec<String>,
}

/// A ranked cause together with its remediation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCause {
    pub cause: RootCause,
    pub solutions: Vec<Solution>,
}

/// The complete result of one analysis. Read-only for all downstream
/// consumers (rendering, translation, text generation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub schema_version: String,

    pub incident: Incident,

    /// Causes sorted by non-increasing confidence
    pub causes: Vec<RankedCause>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<crate::error::Warning>,

    /// True when the timeout budget cut the analysis short
    pub partial: bool,

    /// Codebase revision the analysis ran against, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    pub duration_ms: u64,
}

impl AnalysisReport {
    /// Verify the ranked-order invariant. Used by tests and debug assertions.
    pub fn is_sorted(&self) -> bool {
        self.causes
            .windows(2)
            .all(|w| w[0].cause.confidence >= w[1].cause.confidence)
    }
}
