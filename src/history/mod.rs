//! Queryable view over version-control history
//!
//! The ledger shapes an external read-only history source into blame, churn,
//! and commit queries. It never implements version control itself, and it
//! never fails an analysis: an unavailable history degrades every query to
//! empty/absent values plus one warning.

mod git_cli;

pub use git_cli::{source_for, GitCli};

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use regex::Regex;

use crate::config::HistoryConfig;
use crate::schema::{ChurnStat, RevisionRecord};

/// Read-only history provider. Implementations must be side-effect free and
/// repeatable; every method degrades to empty/absent on failure.
pub trait HistorySource: Send + Sync {
    /// Whether any history is reachable at all
    fn is_available(&self) -> bool;

    /// Current codebase revision, if known
    fn head_revision(&self) -> Option<String>;

    /// Last revision that modified the given line
    fn blame_line(&self, file: &str, line: usize) -> Option<RevisionRecord>;

    /// Commits touching a file, most recent first
    fn commits_touching(&self, file: &str, since_days: Option<u32>, limit: usize)
        -> Vec<RevisionRecord>;

    /// Repo-wide recent commits with their changed file sets, most recent first
    fn recent_commits(&self, limit: usize) -> Vec<RevisionRecord>;
}

/// Ledger over a [`HistorySource`] with per-(file, window) churn memoization
pub struct HistoryLedger {
    source: Box<dyn HistorySource>,
    config: HistoryConfig,
    churn_cache: Mutex<HashMap<(String, u32), ChurnStat>>,
    bug_fix_pattern: Regex,
    now: DateTime<Utc>,
}

impl HistoryLedger {
    pub fn new(source: Box<dyn HistorySource>, config: HistoryConfig) -> Self {
        Self::with_now(source, config, Utc::now())
    }

    /// Construct with a fixed reference time, for deterministic tests
    pub fn with_now(
        source: Box<dyn HistorySource>,
        config: HistoryConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            config,
            churn_cache: Mutex::new(HashMap::new()),
            // unwrap: pattern is a compile-time constant
            bug_fix_pattern: Regex::new(r"(?i)\b(fix(es|ed)?|bug|resolve[ds]?|patch)\b").unwrap(),
            now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.source.is_available()
    }

    pub fn head_revision(&self) -> Option<String> {
        self.source.head_revision()
    }

    /// Last revision that modified `file:line`, or None when history is
    /// unavailable or the line was never committed
    pub fn blame_line(&self, file: &str, line: usize) -> Option<RevisionRecord> {
        self.source.blame_line(file, line)
    }

    /// Commits touching a file within `since_days`, most recent first
    pub fn commits_touching(&self, file: &str, since_days: Option<u32>) -> Vec<RevisionRecord> {
        self.source
            .commits_touching(file, since_days, self.config.commit_limit)
    }

    /// Churn statistics for one file over a window, memoized
    pub fn churn(&self, file: &str, window_days: u32) -> ChurnStat {
        let key = (file.to_string(), window_days);
        if let Some(cached) = self.churn_cache.lock().get(&key) {
            return cached.clone();
        }

        let commits = self
            .source
            .commits_touching(file, Some(window_days), self.config.commit_limit);
        let stat = self.stat_from_commits(file, &commits);

        self.churn_cache.lock().insert(key, stat.clone());
        stat
    }

    /// Churn statistics for every file touched in the recent repo-wide
    /// history, used to build the fragility normalizer
    pub fn repo_churn(&self, window_days: u32) -> Vec<ChurnStat> {
        let cutoff = self.now - Duration::days(i64::from(window_days));
        let commits = self.source.recent_commits(self.config.commit_limit);

        let mut per_file: HashMap<String, Vec<&RevisionRecord>> = HashMap::new();
        for commit in &commits {
            if let Ok(ts) = DateTime::parse_from_rfc3339(&commit.timestamp) {
                if ts.with_timezone(&Utc) < cutoff {
                    continue;
                }
            }
            for file in &commit.changed_files {
                per_file.entry(file.clone()).or_default().push(commit);
            }
        }

        let mut stats: Vec<ChurnStat> = per_file
            .into_iter()
            .map(|(file, commits)| {
                let authors: HashSet<&str> =
                    commits.iter().map(|c| c.author.as_str()).collect();
                let last_change = commits
                    .iter()
                    .map(|c| c.timestamp.as_str())
                    .max()
                    .map(String::from);
                let bug_fix_count = commits
                    .iter()
                    .filter(|c| self.is_bug_fix(c))
                    .count();
                ChurnStat {
                    file,
                    change_count: commits.len(),
                    author_count: authors.len(),
                    last_change,
                    bug_fix_count,
                }
            })
            .collect();

        stats.sort_by(|a, b| a.file.cmp(&b.file));
        stats
    }

    /// Whether a commit message looks like a bug fix
    pub fn is_bug_fix(&self, commit: &RevisionRecord) -> bool {
        self.bug_fix_pattern.is_match(&commit.subject)
    }

    /// Reference time churn windows are measured against
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn stat_from_commits(&self, file: &str, commits: &[RevisionRecord]) -> ChurnStat {
        let authors: HashSet<&str> = commits.iter().map(|c| c.author.as_str()).collect();
        ChurnStat {
            file: file.to_string(),
            change_count: commits.len(),
            author_count: if commits.is_empty() { 0 } else { authors.len() },
            last_change: commits
                .iter()
                .map(|c| c.timestamp.as_str())
                .max()
                .map(String::from),
            bug_fix_count: commits.iter().filter(|c| self.is_bug_fix(c)).count(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{commit, FakeHistory};
    use super::*;
    use chrono::TimeZone;

    fn ledger(fake: FakeHistory) -> HistoryLedger {
        HistoryLedger::with_now(
            Box::new(fake),
            HistoryConfig::default(),
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_unavailable_history_degrades_to_empty() {
        let l = ledger(FakeHistory::unavailable());
        assert!(!l.is_available());
        assert!(l.blame_line("app.py", 42).is_none());
        assert!(l.commits_touching("app.py", None).is_empty());
        assert_eq!(l.churn("app.py", 90).change_count, 0);
        assert!(l.repo_churn(90).is_empty());
    }

    #[test]
    fn test_churn_aggregation() {
        let mut fake = FakeHistory::available();
        fake.file_commits.insert(
            "lib.py".to_string(),
            vec![
                commit("a1", "ada", "2025-05-30T00:00:00+00:00", "fix index bound", &[]),
                commit("b2", "bob", "2025-05-20T00:00:00+00:00", "add getter", &[]),
                commit("c3", "ada", "2025-05-10T00:00:00+00:00", "refactor", &[]),
            ],
        );

        let l = ledger(fake);
        let stat = l.churn("lib.py", 90);
        assert_eq!(stat.change_count, 3);
        assert_eq!(stat.author_count, 2);
        assert_eq!(stat.bug_fix_count, 1);
        assert_eq!(stat.last_change.as_deref(), Some("2025-05-30T00:00:00+00:00"));
    }

    #[test]
    fn test_churn_is_memoized() {
        let mut fake = FakeHistory::available();
        fake.file_commits.insert(
            "lib.py".to_string(),
            vec![commit("a1", "ada", "2025-05-30T00:00:00+00:00", "tweak", &[])],
        );
        let l = ledger(fake);

        let first = l.churn("lib.py", 90);
        let second = l.churn("lib.py", 90);
        assert_eq!(first, second);
        assert_eq!(l.churn_cache.lock().len(), 1);
    }

    #[test]
    fn test_repo_churn_respects_window() {
        let mut fake = FakeHistory::available();
        fake.commits = vec![
            commit("a1", "ada", "2025-05-30T00:00:00+00:00", "recent", &["hot.py"]),
            commit("b2", "bob", "2020-01-01T00:00:00+00:00", "ancient", &["cold.py"]),
        ];
        let l = ledger(fake);

        let stats = l.repo_churn(90);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].file, "hot.py");
    }

    #[test]
    fn test_bug_fix_patterns() {
        let l = ledger(FakeHistory::available());
        let fix = commit("a", "x", "2025-01-01T00:00:00+00:00", "Fixed crash on empty list", &[]);
        let feat = commit("b", "x", "2025-01-01T00:00:00+00:00", "add pagination", &[]);
        assert!(l.is_bug_fix(&fix));
        assert!(!l.is_bug_fix(&feat));
    }
}
