//! Single-flight result cache
//!
//! Reports are cached by (incident fingerprint, repository revision). When
//! several threads ask for the same key at once, exactly one computes and
//! the rest block until the result lands, then share the same `Arc`. A
//! failed computation releases the in-flight slot so the next caller can
//! retry. Entries computed at other revisions are dropped lazily when a
//! lookup arrives for the current one, and a partial report is returned
//! without being stored, so a later caller with a fresh budget recomputes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::Result;
use crate::schema::AnalysisReport;

/// Cache key: incident fingerprint plus the revision it was computed at.
/// A `None` revision (history unavailable) still caches, keyed separately
/// from any concrete revision.
pub type CacheKey = (String, Option<String>);

#[derive(Default)]
struct State {
    done: HashMap<CacheKey, Arc<AnalysisReport>>,
    in_flight: HashSet<CacheKey>,
}

pub struct ResultCache {
    state: Mutex<State>,
    ready: Condvar,
}

impl ResultCache {
    pub fn new() -> Self {
        ResultCache {
            state: Mutex::new(State::default()),
            ready: Condvar::new(),
        }
    }

    /// Look up `key`, or run `compute` exactly once across concurrent
    /// callers and share the result.
    ///
    /// The key's revision is the current one: entries kept from other
    /// revisions are stale and evicted here. Partial reports pass through
    /// without being stored.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<Arc<AnalysisReport>>
    where
        F: FnOnce() -> Result<AnalysisReport>,
    {
        {
            let mut state = self.state.lock();
            state.done.retain(|(_, revision), _| *revision == key.1);
            loop {
                if let Some(report) = state.done.get(&key) {
                    return Ok(Arc::clone(report));
                }
                if state.in_flight.insert(key.clone()) {
                    break; // we are the computing thread
                }
                self.ready.wait(&mut state);
            }
        }

        let outcome = compute();

        let mut state = self.state.lock();
        state.in_flight.remove(&key);
        let result = match outcome {
            Ok(report) => {
                let report = Arc::new(report);
                if report.partial {
                    // a deadline-truncated answer must not shadow a full one
                    Ok(report)
                } else {
                    // first writer wins; identical keys carry identical content
                    let stored = state
                        .done
                        .entry(key)
                        .or_insert_with(|| Arc::clone(&report));
                    Ok(Arc::clone(stored))
                }
            }
            Err(err) => Err(err),
        };
        self.ready.notify_all();
        result
    }

    /// Cached report for `key`, if one exists.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<AnalysisReport>> {
        self.state.lock().done.get(key).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.state.lock().done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().done.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultlineError;
    use crate::schema::{AnalysisReport, ErrorCategory, Incident, SCHEMA_VERSION};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn report() -> AnalysisReport {
        AnalysisReport {
            schema_version: SCHEMA_VERSION.to_string(),
            incident: Incident {
                kind: "ValueError".to_string(),
                category: ErrorCategory::Value,
                severity: ErrorCategory::Value.severity(),
                message: "boom".to_string(),
                frames: Vec::new(),
                locals: None,
                fingerprint: "000000000000002a".to_string(),
            },
            causes: Vec::new(),
            warnings: Vec::new(),
            partial: false,
            revision: None,
            duration_ms: 1,
        }
    }

    #[test]
    fn test_second_lookup_hits_cache() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let key: CacheKey = ("fp42".to_string(), Some("abc".to_string()));

        let first = cache
            .get_or_compute(key.clone(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(report())
            })
            .unwrap();
        let second = cache
            .get_or_compute(key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(report())
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_distinct_revisions_compute_separately() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        for rev in ["aaa", "bbb"] {
            cache
                .get_or_compute(("fp42".to_string(), Some(rev.to_string())), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(report())
                })
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stale_revision_evicted_on_lookup() {
        let cache = ResultCache::new();
        cache
            .get_or_compute(("fp1".to_string(), Some("old".to_string())), || Ok(report()))
            .unwrap();
        cache
            .get_or_compute(("fp2".to_string(), Some("new".to_string())), || Ok(report()))
            .unwrap();

        assert!(cache
            .get(&("fp1".to_string(), Some("old".to_string())))
            .is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_partial_report_not_stored() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let key: CacheKey = ("fp13".to_string(), Some("head".to_string()));

        let truncated = cache
            .get_or_compute(key.clone(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(AnalysisReport {
                    partial: true,
                    ..report()
                })
            })
            .unwrap();
        assert!(truncated.partial);
        assert!(cache.get(&key).is_none());

        // a later caller with a full budget computes afresh
        let full = cache
            .get_or_compute(key.clone(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(report())
            })
            .unwrap();
        assert!(!full.partial);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn test_failure_releases_the_slot() {
        let cache = ResultCache::new();
        let key: CacheKey = ("fp7".to_string(), None);

        let first = cache.get_or_compute(key.clone(), || {
            Err(FaultlineError::Internal {
                message: "transient".to_string(),
            })
        });
        assert!(first.is_err());
        assert!(cache.get(&key).is_none());

        let second = cache.get_or_compute(key.clone(), || Ok(report()));
        assert!(second.is_ok());
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn test_concurrent_callers_share_one_computation() {
        let cache = Arc::new(ResultCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let key: CacheKey = ("fp99".to_string(), Some("head".to_string()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let key = key.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_compute(key, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(20));
                            Ok(report())
                        })
                        .unwrap()
                })
            })
            .collect();

        let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(reports.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
