use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Monotonic content revision, bumped on every observed edit.
///
/// Analysis keys carry revisions so that results computed against stale
/// content can be ordered against (and discarded in favor of) newer ones.
pub type Revision = u64;

/// A single source file with its current content and revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub revision: Revision,
    fingerprint: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self::with_revision(path, text, 1)
    }

    pub fn with_revision(
        path: impl Into<PathBuf>,
        text: impl Into<String>,
        revision: Revision,
    ) -> Self {
        let text = text.into();
        let fingerprint = blake3::hash(text.as_bytes()).to_hex().to_string();
        Self {
            path: path.into(),
            text,
            revision,
            fingerprint,
        }
    }

    /// Blake3 hash of the current content
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Manages open documents and their content revisions
///
/// Revisions survive close/reopen so that a result computed against a closed
/// document can never masquerade as current after the file is reopened.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: FxHashMap<PathBuf, Arc<SourceFile>>,
    revisions: FxHashMap<PathBuf, Revision>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, resuming from the last known revision if it was
    /// previously open
    pub fn open(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Arc<SourceFile> {
        let path = path.into();
        let revision = self
            .revisions
            .get(&path)
            .map(|r| r + 1)
            .unwrap_or(1);
        let file = Arc::new(SourceFile::with_revision(path.clone(), text, revision));
        self.revisions.insert(path.clone(), revision);
        self.documents.insert(path, file.clone());
        file
    }

    /// Replace a document's content, bumping its revision
    ///
    /// Returns `None` if the document is not open.
    pub fn update(&mut self, path: &Path, text: impl Into<String>) -> Option<Arc<SourceFile>> {
        let current = self.documents.get(path)?;
        let revision = current.revision + 1;
        let file = Arc::new(SourceFile::with_revision(
            path.to_path_buf(),
            text,
            revision,
        ));
        self.revisions.insert(path.to_path_buf(), revision);
        self.documents.insert(path.to_path_buf(), file.clone());
        Some(file)
    }

    /// Close a document, keeping its revision high-water mark
    pub fn close(&mut self, path: &Path) {
        self.documents.remove(path);
    }

    pub fn get(&self, path: &Path) -> Option<Arc<SourceFile>> {
        self.documents.get(path).cloned()
    }

    pub fn revision(&self, path: &Path) -> Option<Revision> {
        self.documents.get(path).map(|f| f.revision)
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.documents.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
