//! Trace context builder
//!
//! Normalizes raw failure text into an [`Incident`]: exception kind and
//! message, ordered frames, and one-time resolution of each frame against
//! the symbol index. Construction is deterministic for identical input.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use crate::error::{FaultlineError, Result};
use crate::index::SymbolIndex;
use crate::schema::{CallFrame, ErrorCategory, Incident, SourceLocation};

/// Parses raw trace text into incidents.
///
/// Accepts Python-style tracebacks (`File "x", line N, in f` frames with a
/// terminal `KindError: message` line) as well as bare `Kind: message`
/// errors with no frames.
pub struct IncidentBuilder {
    frame_pattern: Regex,
    exception_pattern: Regex,
    root: Option<String>,
}

impl IncidentBuilder {
    pub fn new() -> Self {
        Self {
            // unwrap: patterns are compile-time constants
            frame_pattern: Regex::new(r#"File "([^"]+)", line (\d+), in (\S+)"#).unwrap(),
            exception_pattern: Regex::new(r"(?m)^\s*([A-Za-z_]\w*(?:Error|Exception)):\s*(.+)$")
                .unwrap(),
            root: None,
        }
    }

    /// Strip this codebase root prefix from frame paths so they match the
    /// index's relative paths
    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = Some(root.to_string_lossy().to_string());
        self
    }

    /// Build an incident from raw trace text.
    ///
    /// Fails with [`FaultlineError::MalformedTrace`] when no exception kind
    /// and message can be recovered. Frames are resolved against the index
    /// exactly once, here; later stages reuse the cached resolution.
    pub fn build(&self, raw: &str, index: &SymbolIndex) -> Result<Incident> {
        self.build_with_locals(raw, index, None)
    }

    /// Build an incident with an optional local-variable snapshot
    pub fn build_with_locals(
        &self,
        raw: &str,
        index: &SymbolIndex,
        locals: Option<BTreeMap<String, String>>,
    ) -> Result<Incident> {
        let (kind, message) = self.parse_exception(raw)?;

        let mut frames = Vec::new();
        for capture in self.frame_pattern.captures_iter(raw) {
            let file = self.relativize(&capture[1]);
            // the pattern only matches digit runs, but an absurd run can
            // still overflow
            let line: usize =
                capture[2]
                    .parse()
                    .map_err(|_| FaultlineError::MalformedTrace {
                        message: format!("frame line number out of range: {}", &capture[2]),
                    })?;

            let location = SourceLocation::new(file, line);
            let symbol = index.resolve(&location).cloned();
            frames.push(CallFrame {
                location,
                symbol,
                raw_function: capture[3].to_string(),
            });
        }

        let fingerprint = Incident::compute_fingerprint(&kind, &message, &frames);
        let category = ErrorCategory::from_kind(&kind);

        Ok(Incident {
            kind,
            category,
            severity: category.severity(),
            message,
            frames,
            locals,
            fingerprint,
        })
    }

    fn parse_exception(&self, raw: &str) -> Result<(String, String)> {
        // the last match wins: chained tracebacks report the outermost
        // exception at the bottom
        let capture = self
            .exception_pattern
            .captures_iter(raw)
            .last()
            .ok_or_else(|| FaultlineError::MalformedTrace {
                message: "no `Kind: message` exception line found".to_string(),
            })?;

        Ok((capture[1].to_string(), capture[2].trim().to_string()))
    }

    fn relativize(&self, path: &str) -> String {
        let normalized = path.replace('\\', "/");
        if let Some(root) = &self.root {
            if let Some(rest) = normalized.strip_prefix(root.as_str()) {
                return rest.trim_start_matches('/').to_string();
            }
        }
        normalized
    }
}

impl Default for IncidentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
