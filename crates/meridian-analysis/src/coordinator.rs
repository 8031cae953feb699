use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use tracing::{debug, error, warn};

use crate::analyzer::{Analyzer, ModuleContext};
use crate::cache::{AnalysisKey, AnalysisSnapshot, PutOutcome, ResultCache};
use crate::collector::DependencyCollector;
use crate::document::{DocumentStore, SourceFile};
use crate::errors::{AnalysisError, Result};
use crate::module::ModuleName;

/// One pending computation: waiters block here until the owner publishes
struct InFlight {
    slot: Mutex<Option<Arc<AnalysisSnapshot>>>,
    done: Condvar,
}

impl InFlight {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Arc<AnalysisSnapshot> {
        let mut slot = self.slot.lock().unwrap();
        while slot.is_none() {
            slot = self.done.wait(slot).unwrap();
        }
        slot.as_ref().unwrap().clone()
    }

    fn publish(&self, snapshot: Arc<AnalysisSnapshot>) {
        *self.slot.lock().unwrap() = Some(snapshot);
        self.done.notify_all();
    }
}

/// Single-flight analysis scheduler
///
/// At most one computation runs per `AnalysisKey`; concurrent requests for
/// the same key join the in-flight computation and all receive the same
/// snapshot instance. Distinct keys analyze in parallel. Analyses never fail
/// outward: the analyzer aborting yields a logged, counted, degraded empty
/// snapshot so the embedding editor stays responsive.
pub struct AnalysisCoordinator {
    cache: Arc<ResultCache>,
    collector: DependencyCollector,
    analyzer: Arc<dyn Analyzer>,
    documents: Arc<Mutex<DocumentStore>>,
    in_flight: Mutex<FxHashMap<AnalysisKey, Arc<InFlight>>>,
    degraded: AtomicU64,
    fallback_to_singleton: bool,
}

impl AnalysisCoordinator {
    pub fn new(
        cache: Arc<ResultCache>,
        collector: DependencyCollector,
        analyzer: Arc<dyn Analyzer>,
        documents: Arc<Mutex<DocumentStore>>,
        fallback_to_singleton: bool,
    ) -> Self {
        Self {
            cache,
            collector,
            analyzer,
            documents,
            in_flight: Mutex::new(FxHashMap::default()),
            degraded: AtomicU64::new(0),
            fallback_to_singleton,
        }
    }

    /// Analyze a file set, reusing a cached or in-flight result when possible
    ///
    /// Always returns a snapshot; unresolvable or failed requests produce a
    /// degraded empty one.
    pub fn analyze(&self, requested: &[PathBuf]) -> Arc<AnalysisSnapshot> {
        match self.try_analyze(requested) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("analysis request failed, returning empty result: {e}");
                self.degraded.fetch_add(1, Ordering::Relaxed);
                Arc::new(AnalysisSnapshot::degraded(
                    AnalysisKey::empty(),
                    ModuleName::new("<none>"),
                ))
            }
        }
    }

    fn try_analyze(&self, requested: &[PathBuf]) -> Result<Arc<AnalysisSnapshot>> {
        let expanded = match self.collector.expand(requested) {
            Ok(expanded) => expanded,
            Err(AnalysisError::NoProjectContext { path }) if self.fallback_to_singleton => {
                warn!(
                    file = %path.display(),
                    "no owning module, analyzing as singleton module"
                );
                self.collector.expand_singleton(requested)?
            }
            Err(e) => return Err(e),
        };

        let files = self.snapshot_documents(&expanded.files);
        let key = AnalysisKey::of(&files);

        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        // Idle -> Running: the first caller to insert owns the computation,
        // everyone else joins the existing entry
        let (entry, owner) = {
            let mut in_flight = self.in_flight.lock().unwrap();
            match in_flight.entry(key.clone()) {
                Entry::Occupied(occupied) => (occupied.get().clone(), false),
                Entry::Vacant(vacant) => {
                    let entry = Arc::new(InFlight::new());
                    vacant.insert(entry.clone());
                    (entry, true)
                }
            }
        };

        if !owner {
            debug!(files = key.len(), "joining in-flight analysis");
            return Ok(entry.wait());
        }

        let snapshot = self.run_analyzer(key.clone(), &expanded.context, &files);

        // Publish to the cache first so callers arriving after the entry is
        // removed hit the cache instead of recomputing
        if self.cache.put(snapshot.clone()) == PutOutcome::StaleDiscarded {
            debug!(files = key.len(), "analysis result superseded mid-flight");
        }
        self.in_flight.lock().unwrap().remove(&key);
        entry.publish(snapshot.clone());

        Ok(snapshot)
    }

    fn run_analyzer(
        &self,
        key: AnalysisKey,
        context: &ModuleContext,
        files: &[Arc<SourceFile>],
    ) -> Arc<AnalysisSnapshot> {
        let module = context.module.name.clone();
        match self.analyzer.analyze(context, files) {
            Ok(output) => Arc::new(AnalysisSnapshot::new(key, module, output)),
            Err(e) => {
                // The editor must stay usable when analysis of in-progress
                // code aborts, so the fatal error stops here
                error!(module = %module, "analyzer aborted, synthesizing empty result: {e}");
                self.degraded.fetch_add(1, Ordering::Relaxed);
                Arc::new(AnalysisSnapshot::degraded(key, module))
            }
        }
    }

    /// Current open-document content for the expanded file set
    ///
    /// Files listed by the module but not present in the store are skipped;
    /// the analyzer sees only material the embedder has loaded.
    fn snapshot_documents(&self, paths: &[PathBuf]) -> Vec<Arc<SourceFile>> {
        let documents = self.documents.lock().unwrap();
        paths
            .iter()
            .filter_map(|path| {
                let file = documents.get(path);
                if file.is_none() {
                    warn!(file = %path.display(), "expanded file not loaded, skipping");
                }
                file
            })
            .collect()
    }

    /// Number of analyses that returned a synthesized empty result
    pub fn degraded_analyses(&self) -> u64 {
        self.degraded.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AnalysisOutput, DependencyModuleBuilder};
    use crate::module::{
        DependencyModule, LibraryIndexSnapshot, ModuleDescriptor, WorkspaceIndex,
    };
    use std::sync::atomic::AtomicUsize;

    struct StubBuilder;

    impl DependencyModuleBuilder for StubBuilder {
        fn build(&self, snapshot: &LibraryIndexSnapshot) -> DependencyModule {
            DependencyModule::new(ModuleName::new("<dependencies>"), snapshot.fingerprint())
        }
    }

    struct CountingAnalyzer {
        calls: AtomicUsize,
    }

    impl CountingAnalyzer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Analyzer for CountingAnalyzer {
        fn analyze(
            &self,
            _context: &ModuleContext,
            files: &[Arc<SourceFile>],
        ) -> Result<AnalysisOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut output = AnalysisOutput::empty();
            for file in files {
                output
                    .bindings
                    .insert(format!("sym:{}", file.path.display()), file.path.clone());
            }
            Ok(output)
        }
    }

    struct FailingAnalyzer;

    impl Analyzer for FailingAnalyzer {
        fn analyze(
            &self,
            _context: &ModuleContext,
            _files: &[Arc<SourceFile>],
        ) -> Result<AnalysisOutput> {
            Err(AnalysisError::AnalyzerFatal("front-end blew up".to_string()))
        }
    }

    fn coordinator_with(
        analyzer: Arc<dyn Analyzer>,
        index: WorkspaceIndex,
        documents: Arc<Mutex<DocumentStore>>,
    ) -> AnalysisCoordinator {
        let collector =
            DependencyCollector::new(Arc::new(index), Arc::new(StubBuilder), "opts".to_string());
        AnalysisCoordinator::new(
            Arc::new(ResultCache::new()),
            collector,
            analyzer,
            documents,
            true,
        )
    }

    fn open_module_files(documents: &Arc<Mutex<DocumentStore>>, files: &[&str]) {
        let mut store = documents.lock().unwrap();
        for file in files {
            store.open(*file, format!("-- {file}"));
        }
    }

    #[test]
    fn test_cache_hit_returns_same_snapshot() {
        let analyzer = Arc::new(CountingAnalyzer::new());
        let mut index = WorkspaceIndex::new();
        index.add_module(ModuleDescriptor::new(
            ModuleName::new("m"),
            vec![PathBuf::from("/a.mn")],
            vec![],
        ));
        let documents = Arc::new(Mutex::new(DocumentStore::new()));
        open_module_files(&documents, &["/a.mn"]);
        let coordinator = coordinator_with(analyzer.clone(), index, documents);

        let first = coordinator.analyze(&[PathBuf::from("/a.mn")]);
        let second = coordinator.analyze(&[PathBuf::from("/a.mn")]);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fatal_analyzer_yields_degraded_snapshot() {
        let mut index = WorkspaceIndex::new();
        index.add_module(ModuleDescriptor::new(
            ModuleName::new("m"),
            vec![PathBuf::from("/a.mn")],
            vec![],
        ));
        let documents = Arc::new(Mutex::new(DocumentStore::new()));
        open_module_files(&documents, &["/a.mn"]);
        let coordinator = coordinator_with(Arc::new(FailingAnalyzer), index, documents);

        let snapshot = coordinator.analyze(&[PathBuf::from("/a.mn")]);

        assert!(snapshot.degraded);
        assert_eq!(coordinator.degraded_analyses(), 1);
    }

    #[test]
    fn test_singleton_fallback_for_loose_file() {
        let analyzer = Arc::new(CountingAnalyzer::new());
        let documents = Arc::new(Mutex::new(DocumentStore::new()));
        open_module_files(&documents, &["/loose.mn"]);
        let coordinator = coordinator_with(analyzer.clone(), WorkspaceIndex::new(), documents);

        let snapshot = coordinator.analyze(&[PathBuf::from("/loose.mn")]);

        assert!(!snapshot.degraded);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
        assert!(snapshot.module.as_str().starts_with("<script:"));
    }

    #[test]
    fn test_no_fallback_when_disabled() {
        let analyzer = Arc::new(CountingAnalyzer::new());
        let documents = Arc::new(Mutex::new(DocumentStore::new()));
        open_module_files(&documents, &["/loose.mn"]);
        let collector = DependencyCollector::new(
            Arc::new(WorkspaceIndex::new()),
            Arc::new(StubBuilder),
            "opts".to_string(),
        );
        let coordinator = AnalysisCoordinator::new(
            Arc::new(ResultCache::new()),
            collector,
            analyzer.clone(),
            documents,
            false,
        );

        let snapshot = coordinator.analyze(&[PathBuf::from("/loose.mn")]);

        assert!(snapshot.degraded);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_request_yields_degraded_snapshot() {
        let documents = Arc::new(Mutex::new(DocumentStore::new()));
        let coordinator = coordinator_with(
            Arc::new(CountingAnalyzer::new()),
            WorkspaceIndex::new(),
            documents,
        );

        let snapshot = coordinator.analyze(&[]);

        assert!(snapshot.degraded);
    }

    #[test]
    fn test_edit_between_analyses_recomputes() {
        let analyzer = Arc::new(CountingAnalyzer::new());
        let mut index = WorkspaceIndex::new();
        index.add_module(ModuleDescriptor::new(
            ModuleName::new("m"),
            vec![PathBuf::from("/a.mn")],
            vec![],
        ));
        let documents = Arc::new(Mutex::new(DocumentStore::new()));
        open_module_files(&documents, &["/a.mn"]);
        let coordinator = coordinator_with(analyzer.clone(), index, documents.clone());

        let first = coordinator.analyze(&[PathBuf::from("/a.mn")]);

        let revision = {
            let mut store = documents.lock().unwrap();
            store
                .update(std::path::Path::new("/a.mn"), "-- edited")
                .unwrap()
                .revision
        };
        coordinator.cache().invalidate(std::path::Path::new("/a.mn"), revision);

        let second = coordinator.analyze(&[PathBuf::from("/a.mn")]);

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);
    }
}
