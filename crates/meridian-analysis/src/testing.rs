//! Test doubles for embedders and for this crate's own test suite
//!
//! Stub implementations of the engine-facing seams that don't require a real
//! semantic analyzer or library indexer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crate::analyzer::{AnalysisOutput, Analyzer, DependencyModuleBuilder, ModuleContext};
use crate::document::SourceFile;
use crate::errors::{AnalysisError, Result};
use crate::module::{
    DependencyModule, LibraryIndexSnapshot, ModuleDescriptor, ModuleName, WorkspaceIndex,
};

/// Analyzer that records how many times it ran and binds one symbol per file
///
/// Can be gated so a test controls exactly when the run finishes, which is
/// how the single-flight and cancellation tests hold an analysis in flight.
pub struct RecordingAnalyzer {
    calls: AtomicUsize,
    gate: Option<Gate>,
}

struct Gate {
    open: Mutex<bool>,
    released: Condvar,
}

impl RecordingAnalyzer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Analyzer that blocks inside `analyze` until `release` is called
    pub fn gated() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Some(Gate {
                open: Mutex::new(false),
                released: Condvar::new(),
            }),
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            *gate.open.lock().unwrap() = true;
            gate.released.notify_all();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for RecordingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for RecordingAnalyzer {
    fn analyze(
        &self,
        _context: &ModuleContext,
        files: &[Arc<SourceFile>],
    ) -> Result<AnalysisOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let mut open = gate.open.lock().unwrap();
            while !*open {
                open = gate.released.wait(open).unwrap();
            }
        }

        let mut output = AnalysisOutput::empty();
        for file in files {
            output
                .bindings
                .insert(format!("sym:{}", file.path.display()), file.path.clone());
        }
        Ok(output)
    }
}

/// Analyzer that always aborts with a fatal front-end error
pub struct FailingAnalyzer;

impl Analyzer for FailingAnalyzer {
    fn analyze(
        &self,
        _context: &ModuleContext,
        _files: &[Arc<SourceFile>],
    ) -> Result<AnalysisOutput> {
        Err(AnalysisError::AnalyzerFatal(
            "stub front-end failure".to_string(),
        ))
    }
}

/// Dependency-module builder that counts builds
pub struct StubLibraryBuilder {
    builds: AtomicUsize,
}

impl StubLibraryBuilder {
    pub fn new() -> Self {
        Self {
            builds: AtomicUsize::new(0),
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl Default for StubLibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyModuleBuilder for StubLibraryBuilder {
    fn build(&self, snapshot: &LibraryIndexSnapshot) -> DependencyModule {
        self.builds.fetch_add(1, Ordering::SeqCst);
        DependencyModule::new(ModuleName::new("<dependencies>"), snapshot.fingerprint())
    }
}

/// Workspace with one module owning the given files
pub fn single_module_workspace(name: &str, files: &[&str]) -> WorkspaceIndex {
    let mut index = WorkspaceIndex::new();
    index.add_module(ModuleDescriptor::new(
        ModuleName::new(name),
        files.iter().map(PathBuf::from).collect(),
        vec![],
    ));
    index
}
