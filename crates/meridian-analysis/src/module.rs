use rustc_hash::FxHashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{AnalysisError, Result};

/// Name of a compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source module: a set of files analyzed together plus its direct
/// dependencies on other source modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: ModuleName,
    pub files: Vec<PathBuf>,
    pub depends_on: Vec<ModuleName>,
}

impl ModuleDescriptor {
    pub fn new(
        name: ModuleName,
        files: Vec<PathBuf>,
        depends_on: Vec<ModuleName>,
    ) -> Self {
        Self {
            name,
            files,
            depends_on,
        }
    }

    /// Module for files with no owning project (ad hoc script analysis)
    pub fn singleton(files: Vec<PathBuf>) -> Self {
        let label = files
            .first()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<empty>".to_string());
        Self {
            name: ModuleName::new(format!("<script:{label}>")),
            files,
            depends_on: Vec::new(),
        }
    }
}

/// Snapshot of the binary/library index a dependency module is built from
///
/// The revision bumps whenever the library set changes on the embedder's side;
/// the fingerprint keys the dependency-module cache.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibraryIndexSnapshot {
    pub entries: Vec<PathBuf>,
    pub revision: u64,
}

impl LibraryIndexSnapshot {
    pub fn new(entries: Vec<PathBuf>, revision: u64) -> Self {
        Self { entries, revision }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Blake3 fingerprint over the entry list and revision
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.revision.to_le_bytes());
        for entry in &self.entries {
            hasher.update(entry.to_string_lossy().as_bytes());
            hasher.update(b"\0");
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Opaque read-only module representing compiled library dependencies
///
/// Built once per library-index snapshot and shared across analyses; never
/// invalidated by source edits.
#[derive(Debug)]
pub struct DependencyModule {
    pub name: ModuleName,
    pub fingerprint: String,
}

impl DependencyModule {
    pub fn new(name: ModuleName, fingerprint: String) -> Self {
        Self { name, fingerprint }
    }
}

/// Project/module resolution seam
///
/// Implemented by the embedder's project model; `WorkspaceIndex` is the
/// built-in in-memory implementation.
pub trait ModuleResolver: Send + Sync {
    /// Resolve the module that owns a file
    fn owning_module(&self, file: &Path) -> Result<ModuleDescriptor>;

    /// Look up a module by name
    fn module(&self, name: &ModuleName) -> Option<ModuleDescriptor>;

    /// Current snapshot of the binary/library index
    fn library_index(&self) -> LibraryIndexSnapshot;
}

/// In-memory module graph, used by embedders without a real project model
/// and by the test suite
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    modules: FxHashMap<ModuleName, ModuleDescriptor>,
    owners: FxHashMap<PathBuf, ModuleName>,
    libraries: LibraryIndexSnapshot,
}

impl WorkspaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module; its files become owned by it
    pub fn add_module(&mut self, descriptor: ModuleDescriptor) {
        for file in &descriptor.files {
            self.owners.insert(file.clone(), descriptor.name.clone());
        }
        self.modules.insert(descriptor.name.clone(), descriptor);
    }

    pub fn set_library_index(&mut self, snapshot: LibraryIndexSnapshot) {
        self.libraries = snapshot;
    }
}

impl ModuleResolver for WorkspaceIndex {
    fn owning_module(&self, file: &Path) -> Result<ModuleDescriptor> {
        let name = self
            .owners
            .get(file)
            .ok_or_else(|| AnalysisError::NoProjectContext {
                path: file.to_path_buf(),
            })?;
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| AnalysisError::NoProjectContext {
                path: file.to_path_buf(),
            })
    }

    fn module(&self, name: &ModuleName) -> Option<ModuleDescriptor> {
        self.modules.get(name).cloned()
    }

    fn library_index(&self) -> LibraryIndexSnapshot {
        self.libraries.clone()
    }
}
