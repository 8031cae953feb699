use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::analyzer::{Analyzer, DependencyModuleBuilder};
use crate::cache::{AnalysisSnapshot, ResultCache};
use crate::collector::DependencyCollector;
use crate::config::{hash_options, AnalysisOptions};
use crate::coordinator::AnalysisCoordinator;
use crate::diagnostics::{DiagnosticHandler, Span, TracingDiagnosticHandler};
use crate::document::DocumentStore;
use crate::module::ModuleResolver;
use crate::runner::{AnalysisHandle, AnalysisRunner};

/// Explicit wiring of the whole analysis subsystem
///
/// Owns the document store, result cache, coordinator, and worker pool.
/// Constructed explicitly by the embedding application; multiple isolated
/// sessions can coexist (per project, per test) with no global state.
pub struct AnalysisSession {
    documents: Arc<Mutex<DocumentStore>>,
    coordinator: Arc<AnalysisCoordinator>,
    runner: AnalysisRunner,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
}

impl AnalysisSession {
    /// Create a session with production dependencies
    pub fn new(
        options: AnalysisOptions,
        resolver: Arc<dyn ModuleResolver>,
        analyzer: Arc<dyn Analyzer>,
        libraries: Arc<dyn DependencyModuleBuilder>,
    ) -> Self {
        Self::with_handler(
            options,
            resolver,
            analyzer,
            libraries,
            Arc::new(TracingDiagnosticHandler::new()),
        )
    }

    /// Create a session with a custom diagnostic handler (for testing)
    pub fn with_handler(
        options: AnalysisOptions,
        resolver: Arc<dyn ModuleResolver>,
        analyzer: Arc<dyn Analyzer>,
        libraries: Arc<dyn DependencyModuleBuilder>,
        diagnostic_handler: Arc<dyn DiagnosticHandler>,
    ) -> Self {
        let documents = Arc::new(Mutex::new(DocumentStore::new()));
        let cache = Arc::new(ResultCache::new());
        let collector = DependencyCollector::new(resolver, libraries, hash_options(&options));
        let coordinator = Arc::new(AnalysisCoordinator::new(
            cache,
            collector,
            analyzer,
            documents.clone(),
            options.fallback_to_singleton,
        ));
        let runner = AnalysisRunner::new(coordinator.clone(), options.worker_threads);

        Self {
            documents,
            coordinator,
            runner,
            diagnostic_handler,
        }
    }

    /// Open a document in the session
    pub fn open(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let path = path.into();
        let file = self.documents.lock().unwrap().open(path.clone(), text);
        self.coordinator.cache().invalidate(&path, file.revision);
    }

    /// Apply an edit: bump the document revision and invalidate cached
    /// results that used the old content
    pub fn edit(&self, path: &Path, text: impl Into<String>) {
        let updated = self.documents.lock().unwrap().update(path, text);
        match updated {
            Some(file) => self.coordinator.cache().invalidate(path, file.revision),
            None => warn!(file = %path.display(), "edit for document that is not open"),
        }
    }

    pub fn close(&self, path: &Path) {
        self.documents.lock().unwrap().close(path);
    }

    /// Synchronous analysis; blocks the calling thread but is still
    /// deduplicated through the coordinator
    pub fn request_analysis(&self, paths: &[PathBuf]) -> Arc<AnalysisSnapshot> {
        let snapshot = self.coordinator.analyze(paths);
        if snapshot.degraded {
            self.diagnostic_handler.warning(
                Span::dummy(),
                &format!("analysis of {} returned a degraded result", snapshot.module),
            );
        }
        snapshot
    }

    /// Background analysis; returns a pollable, cancellable handle
    pub fn request_analysis_async(&self, paths: Vec<PathBuf>) -> AnalysisHandle {
        self.runner.submit(paths)
    }

    /// Wait for all outstanding background analyses (teardown only)
    pub fn join(&self) {
        self.runner.join();
    }

    /// Number of analyses that had to fall back to an empty result
    pub fn degraded_analyses(&self) -> u64 {
        self.coordinator.degraded_analyses()
    }

    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }
}
