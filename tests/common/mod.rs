//! Shared test fixtures
//!
//! Tests build temporary repositories with tempfile instead of checked-in
//! fixture trees. Git-backed fixtures shell out to the real git binary so
//! history queries exercise the same code path as production.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    pub fn init_git(&self) -> &Self {
        self.git(&["init", "-q"]);
        self.git(&["config", "user.email", "test@test.com"]);
        self.git(&["config", "user.name", "Test User"]);
        self
    }

    /// Commit all pending changes with the current timestamp
    pub fn commit(&self, message: &str) -> &Self {
        self.commit_dated(message, 0)
    }

    /// Commit all pending changes backdated by `days_ago`
    pub fn commit_dated(&self, message: &str, days_ago: i64) -> &Self {
        self.commit_as("Test User", message, days_ago)
    }

    /// Commit with an explicit author, backdated by `days_ago`
    pub fn commit_as(&self, author: &str, message: &str, days_ago: i64) -> &Self {
        let date = (chrono::Utc::now() - chrono::Duration::days(days_ago)).to_rfc3339();
        self.git(&["add", "-A"]);
        let output = Command::new("git")
            .current_dir(self.path())
            .env("GIT_AUTHOR_NAME", author)
            .env("GIT_AUTHOR_EMAIL", "test@test.com")
            .env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date)
            .args(["commit", "-q", "-m", message])
            .output()
            .expect("Failed to git commit");
        assert!(
            output.status.success(),
            "git commit failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        self
    }

    fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .current_dir(self.path())
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Whether the git binary is usable in this environment. Tests that depend
/// on real history return early when it is not.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// The two-file Python fixture most end-to-end tests use: an app entry
/// point calling a library accessor that indexes without a bounds check.
pub fn python_fixture(repo: &TestRepo) {
    repo.add_file(
        "app.py",
        "from lib import get_item\n\ndef process_items(items):\n    return get_item(items, 99)\n",
    );
    repo.add_file(
        "lib.py",
        "def get_item(items, i):\n    return items[i]\n",
    );
}

/// Traceback matching [`python_fixture`]
pub const FIXTURE_TRACE: &str = r#"Traceback (most recent call last):
  File "app.py", line 4, in process_items
    return get_item(items, 99)
  File "lib.py", line 2, in get_item
    return items[i]
IndexError: list index out of range
"#;
