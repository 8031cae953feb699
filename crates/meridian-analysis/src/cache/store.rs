use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::document::Revision;

use super::{AnalysisKey, AnalysisSnapshot};

/// Outcome of a `put`: stored, or discarded because a newer revision of some
/// covered file is already known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Stored,
    StaleDiscarded,
}

/// Key -> snapshot store with single-entry-per-file invalidation
///
/// Invariants:
/// - at most one live entry covers any given file identity; a newer result
///   for a file supersedes (never merges with) the older entry;
/// - a put whose key carries an older revision than the recorded high-water
///   mark for any covered file is discarded, so a late-arriving result can
///   never overwrite a newer one.
pub struct ResultCache {
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: FxHashMap<AnalysisKey, Arc<AnalysisSnapshot>>,
    /// file identity -> the one live key covering it
    by_file: FxHashMap<PathBuf, AnalysisKey>,
    /// high-water revision per file, fed by puts and invalidations
    newest: FxHashMap<PathBuf, Revision>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Pure lookup; never blocks on analysis
    pub fn get(&self, key: &AnalysisKey) -> Option<Arc<AnalysisSnapshot>> {
        self.inner.lock().unwrap().entries.get(key).cloned()
    }

    /// Publish a snapshot; newest revision wins per file identity
    pub fn put(&self, snapshot: Arc<AnalysisSnapshot>) -> PutOutcome {
        let key = snapshot.key.clone();
        let mut inner = self.inner.lock().unwrap();

        for (path, revision) in key.entries() {
            if let Some(&newest) = inner.newest.get(path) {
                if revision < newest {
                    debug!(
                        file = %path.display(),
                        revision,
                        newest,
                        "discarding stale analysis result"
                    );
                    return PutOutcome::StaleDiscarded;
                }
            }
        }

        // Supersede any older entry sharing a file with this key
        let mut superseded: FxHashSet<AnalysisKey> = FxHashSet::default();
        for (path, _) in key.entries() {
            if let Some(old) = inner.by_file.get(path) {
                if *old != key {
                    superseded.insert(old.clone());
                }
            }
        }
        for old in &superseded {
            inner.entries.remove(old);
            let covered: Vec<PathBuf> = old.files().map(Path::to_path_buf).collect();
            for path in covered {
                if inner.by_file.get(&path) == Some(old) {
                    inner.by_file.remove(&path);
                }
            }
        }

        for (path, revision) in key.entries() {
            inner.by_file.insert(path.to_path_buf(), key.clone());
            let high = inner.newest.entry(path.to_path_buf()).or_insert(revision);
            if revision > *high {
                *high = revision;
            }
        }
        inner.entries.insert(key, snapshot);
        PutOutcome::Stored
    }

    /// Drop any entry covering the file at a revision older than `revision`
    ///
    /// Does not cancel an in-flight computation already using the stale
    /// content; its eventual publish is rejected by the high-water check.
    pub fn invalidate(&self, file: &Path, revision: Revision) {
        let mut inner = self.inner.lock().unwrap();

        let high = inner.newest.entry(file.to_path_buf()).or_insert(revision);
        if revision > *high {
            *high = revision;
        }

        let Some(key) = inner.by_file.get(file).cloned() else {
            return;
        };
        if key.revision_of(file).is_some_and(|r| r >= revision) {
            return;
        }

        inner.entries.remove(&key);
        let covered: Vec<PathBuf> = key.files().map(Path::to_path_buf).collect();
        for path in covered {
            if inner.by_file.get(&path) == Some(&key) {
                inner.by_file.remove(&path);
            }
        }
        debug!(file = %file.display(), revision, "invalidated cached analysis");
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().entries.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.by_file.clear();
        // High-water marks survive a clear; revisions only move forward.
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
