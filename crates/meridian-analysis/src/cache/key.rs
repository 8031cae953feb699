use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::{Revision, SourceFile};

/// Identity of one analysis request: the exact set of files being analyzed
/// together, each at a specific content revision
///
/// Set semantics: entries are sorted by path internally, so construction
/// order never matters. Two requests with equal keys are the same analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisKey {
    entries: Vec<(PathBuf, Revision)>,
}

impl AnalysisKey {
    pub fn new(files: impl IntoIterator<Item = (PathBuf, Revision)>) -> Self {
        let mut entries: Vec<_> = files.into_iter().collect();
        entries.sort();
        entries.dedup_by(|a, b| a.0 == b.0);
        Self { entries }
    }

    pub fn of(files: &[Arc<SourceFile>]) -> Self {
        Self::new(files.iter().map(|f| (f.path.clone(), f.revision)))
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Path, Revision)> {
        self.entries.iter().map(|(p, r)| (p.as_path(), *r))
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(p, _)| p.as_path())
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.entries
            .binary_search_by(|(p, _)| p.as_path().cmp(file))
            .is_ok()
    }

    pub fn revision_of(&self, file: &Path) -> Option<Revision> {
        self.entries
            .binary_search_by(|(p, _)| p.as_path().cmp(file))
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
