//! Integration tests for faultline
//!
//! These tests verify end-to-end behavior across modules: trace parsing,
//! symbol indexing, real git history, strategy aggregation, and the result
//! cache. Git-backed tests return early when no git binary is usable.

mod common;

use std::sync::Arc;

use common::{git_available, python_fixture, TestRepo, FIXTURE_TRACE};

use faultline::config::ScanConfig;
use faultline::history::{GitCli, HistoryLedger, HistorySource};
use faultline::{
    AnalysisConfig, AnalysisRequest, Engine, ErrorCategory, FaultlineError, StrategyKind,
    SymbolIndex, Warning,
};

// ---------------------------------------------------------------------------
// Symbol index
// ---------------------------------------------------------------------------

#[test]
fn index_survives_malformed_files() {
    let repo = TestRepo::new();
    repo.add_file("good.py", "def fine():\n    return 1\n");
    repo.add_file("broken.py", "def broken(:::\n    ~~~ not python at all\n\x00\x01");

    let (index, _warnings) = SymbolIndex::rebuild(repo.path(), &ScanConfig::default());

    // the good file is fully indexed regardless of the broken neighbor
    assert!(index.get("good.fine").is_some());
    assert!(index.file_count() >= 2);
}

#[test]
fn index_resolves_call_edges_across_files() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let (index, _) = SymbolIndex::rebuild(repo.path(), &ScanConfig::default());

    assert!(index.get("lib.get_item").is_some());
    assert!(index.get("app.process_items").is_some());
    assert!(index
        .callees_of("app.process_items")
        .contains(&"lib.get_item"));
    assert!(index
        .callers_of("lib.get_item")
        .contains(&"app.process_items"));
}

#[test]
fn index_skips_excluded_directories() {
    let repo = TestRepo::new();
    repo.add_file("src.py", "def real(): pass\n");
    repo.add_file("node_modules/vendored.py", "def vendored(): pass\n");
    repo.add_file("__pycache__/stale.py", "def stale(): pass\n");

    let (index, _) = SymbolIndex::rebuild(repo.path(), &ScanConfig::default());
    assert!(index.get("src.real").is_some());
    assert!(index.get("vendored.vendored").is_none());
    assert!(index.get("stale.stale").is_none());
}

// ---------------------------------------------------------------------------
// Git-backed history
// ---------------------------------------------------------------------------

#[test]
fn git_cli_blame_and_log() {
    if !git_available() {
        return;
    }
    let repo = TestRepo::new();
    repo.init_git();
    repo.add_file("lib.py", "def get_item(items, i):\n    return items[i]\n");
    repo.commit_as("Ada", "add accessor", 10);

    let git = GitCli::new(repo.path());
    assert!(git.is_available());
    assert!(git.head_revision().is_some());

    let blame = git.blame_line("lib.py", 2).expect("blame should resolve");
    assert_eq!(blame.author, "Ada");
    assert_eq!(blame.subject, "add accessor");

    let commits = git.commits_touching("lib.py", None, 10);
    assert_eq!(commits.len(), 1);
}

#[test]
fn ledger_churn_over_real_commits() {
    if !git_available() {
        return;
    }
    let repo = TestRepo::new();
    repo.init_git();
    repo.add_file("hot.py", "def a(): pass\n");
    repo.commit_as("Ada", "initial", 20);
    repo.add_file("hot.py", "def a(): pass\ndef b(): pass\n");
    repo.commit_as("Bob", "fix crash in a", 5);
    repo.add_file("cold.py", "def c(): pass\n");
    repo.commit_as("Ada", "add c", 15);

    let ledger = HistoryLedger::new(Box::new(GitCli::new(repo.path())), Default::default());
    let stat = ledger.churn("hot.py", 90);
    assert_eq!(stat.change_count, 2);
    assert_eq!(stat.author_count, 2);
    assert_eq!(stat.bug_fix_count, 1);

    let repo_wide = ledger.repo_churn(90);
    let files: Vec<&str> = repo_wide.iter().map(|s| s.file.as_str()).collect();
    assert!(files.contains(&"hot.py"));
    assert!(files.contains(&"cold.py"));
}

#[test]
fn non_repo_directory_degrades_quietly() {
    let repo = TestRepo::new();
    repo.add_file("a.py", "def f(): pass\n");

    let git = GitCli::new(repo.path());
    assert!(!git.is_available());
    assert!(git.head_revision().is_none());
    assert!(git.blame_line("a.py", 1).is_none());
    assert!(git.recent_commits(10).is_empty());
}

// ---------------------------------------------------------------------------
// End-to-end analysis
// ---------------------------------------------------------------------------

#[test]
fn e2e_recent_change_outranks_the_untouched_caller() {
    if !git_available() {
        return;
    }
    let repo = TestRepo::new();
    repo.init_git();
    repo.add_file(
        "app.py",
        "from lib import get_item\n\ndef process_items(items):\n    return get_item(items, 99)\n",
    );
    repo.add_file("lib.py", "def get_item(items, i):\n    return items[int(i)]\n");
    repo.commit_as("Ada", "initial layout", 30);
    // the failing line itself changes two days before the incident
    python_fixture(&repo);
    repo.commit_as("Bob", "fix boundary handling in get_item", 2);

    let engine = Engine::new(repo.path(), AnalysisConfig::default()).unwrap();
    let report = engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap();

    assert!(report.is_sorted());
    assert!(!report.causes.is_empty());
    assert_eq!(report.incident.category, ErrorCategory::Index);
    assert!(report.revision.is_some());

    // the two-day-old change to lib.py is a high-confidence proximity cause
    let proximity = report
        .causes
        .iter()
        .find(|c| c.cause.strategy == StrategyKind::ChangeProximity)
        .expect("change proximity should fire");
    assert_eq!(proximity.cause.anchor_symbol.as_deref(), Some("lib.get_item"));
    assert!(
        proximity.cause.confidence > 0.7,
        "confidence {} too low for a 2-day-old change in a 7-day window",
        proximity.cause.confidence
    );

    // whatever wins overall, it points at lib, not at the untouched caller
    let top = &report.causes[0];
    let names_lib = top.cause.anchor_symbol.as_deref() == Some("lib.get_item")
        || top.cause.description.contains("lib.py");
    assert!(names_lib, "top cause was {:?}", top.cause.description);
    for ranked in &report.causes {
        if ranked.cause.anchor_symbol.as_deref() == Some("app.process_items") {
            assert!(ranked.cause.confidence < proximity.cause.confidence);
        }
    }
}

#[test]
fn e2e_history_unavailable_still_produces_causes() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let engine = Engine::new(repo.path(), AnalysisConfig::default()).unwrap();
    let report = engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap();

    assert!(!report.causes.is_empty());
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::HistoryUnavailable { .. })));

    // structural strategies answer; forensic strategies stay silent
    let strategies: Vec<StrategyKind> =
        report.causes.iter().map(|c| c.cause.strategy).collect();
    assert!(strategies.contains(&StrategyKind::SymptomStructure));
    assert!(strategies.contains(&StrategyKind::DependencyImpact));
    assert!(!strategies.iter().any(|s| s.needs_history()));
}

#[test]
fn e2e_every_cause_carries_ranked_solutions() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let engine = Engine::new(repo.path(), AnalysisConfig::default()).unwrap();
    let report = engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap();

    for ranked in &report.causes {
        assert!(
            !ranked.solutions.is_empty(),
            "cause {:?} has no remediation",
            ranked.cause.description
        );
        assert!(ranked
            .solutions
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn e2e_fingerprint_stable_across_engines() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let first = Engine::new(repo.path(), AnalysisConfig::default())
        .unwrap()
        .analyze(&AnalysisRequest::new(FIXTURE_TRACE))
        .unwrap();
    let second = Engine::new(repo.path(), AnalysisConfig::default())
        .unwrap()
        .analyze(&AnalysisRequest::new(FIXTURE_TRACE))
        .unwrap();

    assert_eq!(first.incident.fingerprint, second.incident.fingerprint);
    // identical inputs, identical ranked output
    assert_eq!(first.causes, second.causes);

    let other = Engine::new(repo.path(), AnalysisConfig::default())
        .unwrap()
        .analyze(&AnalysisRequest::new(
            "  File \"lib.py\", line 2, in get_item\nKeyError: 'other'\n",
        ))
        .unwrap();
    assert_ne!(first.incident.fingerprint, other.incident.fingerprint);
}

#[test]
fn e2e_repeat_analysis_shares_the_cached_report() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let engine = Engine::new(repo.path(), AnalysisConfig::default()).unwrap();
    let first = engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap();
    let second = engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn e2e_concurrent_analyses_compute_once() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let engine = Arc::new(Engine::new(repo.path(), AnalysisConfig::default()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap()
            })
        })
        .collect();

    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(reports.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn e2e_strategy_subset_respected() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let config = AnalysisConfig {
        strategies: vec![StrategyKind::SymptomStructure],
        ..Default::default()
    };
    let engine = Engine::new(repo.path(), config).unwrap();
    let report = engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap();

    assert!(!report.causes.is_empty());
    assert!(report
        .causes
        .iter()
        .all(|c| c.cause.strategy == StrategyKind::SymptomStructure));
}

#[test]
fn e2e_malformed_trace_is_rejected() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let engine = Engine::new(repo.path(), AnalysisConfig::default()).unwrap();
    let err = engine
        .analyze(&AnalysisRequest::new("sorry, the service is down"))
        .unwrap_err();
    assert!(matches!(err, FaultlineError::MalformedTrace { .. }));
}

#[test]
fn e2e_json_report_round_trips() {
    let repo = TestRepo::new();
    python_fixture(&repo);

    let engine = Engine::new(repo.path(), AnalysisConfig::default()).unwrap();
    let report = engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap();

    let json = faultline::render_json(&report).unwrap();
    let back: faultline::AnalysisReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, *report);
}

#[test]
fn e2e_config_file_drives_the_engine() {
    let repo = TestRepo::new();
    python_fixture(&repo);
    repo.add_file(
        "faultline.toml",
        "timeout_ms = 10000\nstrategies = [\"symptom_structure\", \"dependency_impact\"]\n",
    );

    let config = AnalysisConfig::from_file(&repo.path().join("faultline.toml")).unwrap();
    assert_eq!(config.timeout_ms, 10000);
    assert_eq!(
        config.enabled_strategies(),
        vec![StrategyKind::SymptomStructure, StrategyKind::DependencyImpact]
    );

    let engine = Engine::new(repo.path(), config).unwrap();
    let report = engine.analyze(&AnalysisRequest::new(FIXTURE_TRACE)).unwrap();
    assert!(report
        .causes
        .iter()
        .all(|c| !c.cause.strategy.needs_history()));
}

// ---------------------------------------------------------------------------
// Scan limits
// ---------------------------------------------------------------------------

#[test]
fn oversized_files_are_skipped() {
    let repo = TestRepo::new();
    repo.add_file("small.py", "def tiny(): pass\n");
    let big = format!("def huge():\n    x = \"{}\"\n", "a".repeat(2000));
    repo.add_file("big.py", &big);

    let config = ScanConfig {
        max_file_size: 100,
        ..Default::default()
    };
    let (index, _) = SymbolIndex::rebuild(repo.path(), &config);
    assert!(index.get("small.tiny").is_some());
    assert!(index.get("big.huge").is_none());
}

#[test]
fn max_depth_limits_the_walk() {
    let repo = TestRepo::new();
    repo.add_file("top.py", "def shallow(): pass\n");
    repo.add_file("a/b/c/d/deep.py", "def buried(): pass\n");

    let config = ScanConfig {
        max_depth: 2,
        ..Default::default()
    };
    let (index, _) = SymbolIndex::rebuild(repo.path(), &config);
    assert!(index.get("top.shallow").is_some());
    assert!(index.get("deep.buried").is_none());
}
