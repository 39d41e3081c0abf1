//! Fault-tolerant symbol index over a codebase
//!
//! The index is a whole-snapshot structure: one parallel rebuild per
//! analysis session, then read-only sharing. Symbols live in a flat table
//! keyed by qualified name; enclosing and call relations are key-based
//! adjacency tables, so the ownership graph stays acyclic even though the
//! relation graph is not.

mod extract;

pub use extract::{extract_file, namespace_of, FileSymbols};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::error::Warning;
use crate::lang::Lang;
use crate::schema::{SourceLocation, Symbol};

/// Immutable snapshot of a codebase's symbols and call edges
#[derive(Debug, Default)]
pub struct SymbolIndex {
    /// Flat table keyed by qualified name
    symbols: HashMap<String, Symbol>,

    /// Qualified names defined per file, in definition order
    by_file: HashMap<String, Vec<String>>,

    /// caller qualified name → callee qualified names
    callees: HashMap<String, BTreeSet<String>>,

    /// callee qualified name → caller qualified names
    callers: HashMap<String, BTreeSet<String>>,

    /// Files scanned during the rebuild
    file_count: usize,
}

impl SymbolIndex {
    /// Rebuild the index for a codebase root.
    ///
    /// Per-file parsing is isolated: a malformed or unreadable file yields
    /// a partial/empty symbol set for that file and a soft warning, never a
    /// rebuild-wide failure.
    pub fn rebuild(root: &Path, config: &ScanConfig) -> (Self, Vec<Warning>) {
        let files = collect_files(root, config);
        debug!(files = files.len(), "rebuilding symbol index");

        let mut extracted: Vec<FileSymbols> = files
            .par_iter()
            .filter_map(|(rel, lang)| {
                let full = root.join(rel);
                match fs::read_to_string(&full) {
                    Ok(source) => Some(extract_file(rel, &source, *lang)),
                    Err(e) => Some(FileSymbols {
                        file: rel.clone(),
                        parse_warning: Some(format!("unreadable: {}", e)),
                        ..Default::default()
                    }),
                }
            })
            .collect();

        // Deterministic merge order regardless of worker scheduling
        extracted.sort_by(|a, b| a.file.cmp(&b.file));

        let mut index = Self {
            file_count: extracted.len(),
            ..Default::default()
        };
        let mut warnings = Vec::new();

        // short name → qualified names, for call-edge resolution
        let mut short_names: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for file in &extracted {
            if let Some(detail) = &file.parse_warning {
                warn!(file = %file.file, detail = %detail, "partial symbol extraction");
                warnings.push(Warning::SymbolIndexPartial {
                    file: file.file.clone(),
                    detail: detail.clone(),
                });
            }

            for symbol in &file.symbols {
                // Identical qualified name + defining location never appears
                // twice; a name collision across files keeps the first
                // (merge order is sorted, so this is deterministic).
                if index.symbols.contains_key(&symbol.qualified_name) {
                    continue;
                }
                index
                    .by_file
                    .entry(file.file.clone())
                    .or_default()
                    .push(symbol.qualified_name.clone());
                short_names
                    .entry(symbol.short_name().to_string())
                    .or_default()
                    .insert(symbol.qualified_name.clone());
                index
                    .symbols
                    .insert(symbol.qualified_name.clone(), symbol.clone());
            }
        }

        // Resolve call edges by callee short name. Ambiguous names edge to
        // every candidate; unknown names (stdlib, dynamic) drop out.
        for file in &extracted {
            for (caller, callee, _line) in &file.calls {
                let Some(targets) = short_names.get(callee) else {
                    continue;
                };
                for target in targets {
                    if target == caller {
                        continue;
                    }
                    index
                        .callees
                        .entry(caller.clone())
                        .or_default()
                        .insert(target.clone());
                    index
                        .callers
                        .entry(target.clone())
                        .or_default()
                        .insert(caller.clone());
                }
            }
        }

        (index, warnings)
    }

    /// Resolve a source location to the symbol whose definition encloses it.
    ///
    /// Returns the innermost enclosing definition, or None — never a
    /// placeholder.
    pub fn resolve(&self, location: &SourceLocation) -> Option<&Symbol> {
        let names = self.by_file.get(&location.file)?;
        names
            .iter()
            .filter_map(|name| self.symbols.get(name))
            .filter(|s| s.contains_line(location.line))
            .max_by_key(|s| s.location.line)
    }

    /// Symbols defined in one file, in definition order
    pub fn symbols_defined_in(&self, file: &str) -> Vec<&Symbol> {
        self.by_file
            .get(file)
            .map(|names| names.iter().filter_map(|n| self.symbols.get(n)).collect())
            .unwrap_or_default()
    }

    /// Look up a symbol by qualified name
    pub fn get(&self, qualified_name: &str) -> Option<&Symbol> {
        self.symbols.get(qualified_name)
    }

    /// Qualified names this symbol calls, sorted
    pub fn callees_of(&self, qualified_name: &str) -> Vec<&str> {
        self.callees
            .get(qualified_name)
            .map(|s| s.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Qualified names that call this symbol, sorted
    pub fn callers_of(&self, qualified_name: &str) -> Vec<&str> {
        self.callers
            .get(qualified_name)
            .map(|s| s.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// All indexed files, sorted
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.by_file.keys().map(String::as_str).collect();
        files.sort();
        files
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }
}

/// Walk the codebase and collect (relative path, language) pairs
fn collect_files(root: &Path, config: &ScanConfig) -> Vec<(String, Lang)> {
    let excluded = config.excluded_dirs.clone();
    let max_file_size = config.max_file_size;

    let walker = WalkBuilder::new(root)
        .max_depth(Some(config.max_depth))
        .hidden(true)
        .filter_entry(move |entry| {
            let name = entry.file_name().to_string_lossy();
            !excluded.iter().any(|d| d == name.as_ref())
        })
        .build();

    let mut files = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(lang) = Lang::from_path(path) else {
            continue;
        };
        if let Ok(meta) = path.metadata() {
            if meta.len() > max_file_size {
                continue;
            }
        }
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        files.push((rel, lang));
    }

    files.sort();
    files
}
