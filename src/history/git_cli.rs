//! Git-backed history source
//!
//! Shells out to git for maximum compatibility. Every query swallows git
//! failures into absent/empty values; the ledger reports availability once
//! instead of erroring per call.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{TimeZone, Utc};
use tracing::debug;

use super::HistorySource;
use crate::schema::RevisionRecord;

/// Log format: id|short|author|iso-date|subject. Subject goes last so an
/// embedded pipe cannot shift earlier fields.
const LOG_FORMAT: &str = "%H|%h|%an|%aI|%s";

/// History source backed by the `git` binary
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Run a git command in the repo root, returning stdout on success
    fn git(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .ok()?;

        if !output.status.success() {
            debug!(
                args = args.join(" "),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git command failed"
            );
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    fn parse_log_line(line: &str) -> Option<RevisionRecord> {
        let parts: Vec<&str> = line.splitn(5, '|').collect();
        if parts.len() < 5 {
            return None;
        }
        Some(RevisionRecord {
            id: parts[0].to_string(),
            short_id: parts[1].to_string(),
            author: parts[2].to_string(),
            timestamp: parts[3].to_string(),
            subject: parts[4].to_string(),
            changed_files: Vec::new(),
        })
    }
}

impl HistorySource for GitCli {
    fn is_available(&self) -> bool {
        self.git(&["rev-parse", "--is-inside-work-tree"])
            .map(|out| out == "true")
            .unwrap_or(false)
    }

    fn head_revision(&self) -> Option<String> {
        self.git(&["rev-parse", "HEAD"])
    }

    fn blame_line(&self, file: &str, line: usize) -> Option<RevisionRecord> {
        let range = format!("{},{}", line, line);
        let output = self.git(&["blame", "--porcelain", "-L", &range, "--", file])?;

        // Porcelain: first line is `<sha> <orig> <final> <count>`, followed
        // by `author`, `author-time`, `summary` header lines.
        let mut lines = output.lines();
        let id = lines.next()?.split_whitespace().next()?.to_string();
        if id.chars().all(|c| c == '0') {
            // uncommitted line
            return None;
        }

        let mut author = String::new();
        let mut timestamp = String::new();
        let mut subject = String::new();
        for header in lines {
            if let Some(rest) = header.strip_prefix("author ") {
                author = rest.to_string();
            } else if let Some(rest) = header.strip_prefix("author-time ") {
                if let Ok(unix) = rest.parse::<i64>() {
                    if let Some(ts) = Utc.timestamp_opt(unix, 0).single() {
                        timestamp = ts.to_rfc3339();
                    }
                }
            } else if let Some(rest) = header.strip_prefix("summary ") {
                subject = rest.to_string();
            }
        }

        Some(RevisionRecord {
            short_id: id.chars().take(7).collect(),
            id,
            author,
            timestamp,
            subject,
            changed_files: Vec::new(),
        })
    }

    fn commits_touching(
        &self,
        file: &str,
        since_days: Option<u32>,
        limit: usize,
    ) -> Vec<RevisionRecord> {
        let format = format!("--format={}", LOG_FORMAT);
        let count = format!("-n{}", limit);
        let mut args = vec!["log", format.as_str(), count.as_str(), "--follow"];

        let since;
        if let Some(days) = since_days {
            since = format!("--since={}.days.ago", days);
            args.push(&since);
        }
        args.push("--");
        args.push(file);

        let Some(output) = self.git(&args) else {
            return Vec::new();
        };

        output.lines().filter_map(Self::parse_log_line).collect()
    }

    fn recent_commits(&self, limit: usize) -> Vec<RevisionRecord> {
        let format = format!("--format={}", LOG_FORMAT);
        let count = format!("-n{}", limit);
        let Some(output) = self.git(&["log", &format, &count, "--name-only"]) else {
            return Vec::new();
        };

        // --name-only output: a log line, then the changed paths, separated
        // by blank lines between commits.
        let mut commits = Vec::new();
        let mut current: Option<RevisionRecord> = None;

        for line in output.lines() {
            if line.is_empty() {
                continue;
            }
            if let Some(record) = Self::parse_log_line(line) {
                if let Some(done) = current.take() {
                    commits.push(done);
                }
                current = Some(record);
            } else if let Some(ref mut record) = current {
                record.changed_files.push(line.to_string());
            }
        }
        if let Some(done) = current {
            commits.push(done);
        }

        commits
    }
}

/// Convenience used by the engine: a git source for a codebase root, which
/// may be a subdirectory of the actual repository
pub fn source_for(root: &Path) -> GitCli {
    GitCli::new(root)
}
