use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::analyzer::{DependencyModuleBuilder, ModuleContext};
use crate::cache::DependencyModuleCache;
use crate::errors::{AnalysisError, Result};
use crate::module::{ModuleDescriptor, ModuleName, ModuleResolver};

/// A request expanded to the full file set that must be analyzed together
#[derive(Debug, Clone)]
pub struct ExpandedRequest {
    /// Requested files first, then module siblings and transitive source
    /// dependencies, deduplicated in deterministic order
    pub files: Vec<PathBuf>,
    pub context: ModuleContext,
}

/// Expands a requested file set to its whole compilation unit
///
/// Semantic analysis of one file needs the binding contexts of its module
/// siblings, so a request for a single file pulls in every file of the owning
/// module plus, transitively, the files of source modules it depends on.
/// Binary dependencies resolve through the separately cached dependency
/// module.
pub struct DependencyCollector {
    resolver: Arc<dyn ModuleResolver>,
    dependency_cache: DependencyModuleCache,
}

impl DependencyCollector {
    pub fn new(
        resolver: Arc<dyn ModuleResolver>,
        builder: Arc<dyn DependencyModuleBuilder>,
        options_hash: String,
    ) -> Self {
        Self {
            resolver,
            dependency_cache: DependencyModuleCache::new(builder, options_hash),
        }
    }

    /// Expand via the owning module of the first requested file
    ///
    /// Fails with `NoProjectContext` when no module owns the file; the caller
    /// decides whether to fall back to `expand_singleton`.
    pub fn expand(&self, requested: &[PathBuf]) -> Result<ExpandedRequest> {
        let first = requested.first().ok_or(AnalysisError::EmptyRequest)?;
        let module = self.resolver.owning_module(first)?;
        Ok(self.expand_with_module(requested, module))
    }

    /// Expand a loose file set as its own singleton module with no source
    /// dependencies (ad hoc script analysis)
    pub fn expand_singleton(&self, requested: &[PathBuf]) -> Result<ExpandedRequest> {
        if requested.is_empty() {
            return Err(AnalysisError::EmptyRequest);
        }
        let module = ModuleDescriptor::singleton(requested.to_vec());
        Ok(self.expand_with_module(requested, module))
    }

    fn expand_with_module(
        &self,
        requested: &[PathBuf],
        module: ModuleDescriptor,
    ) -> ExpandedRequest {
        let mut files: IndexSet<PathBuf> = requested.iter().cloned().collect();
        files.extend(module.files.iter().cloned());

        // BFS over source-module edges only; binary deps collapse into the
        // dependency module below
        let mut seen: FxHashSet<ModuleName> = FxHashSet::default();
        seen.insert(module.name.clone());
        let mut queue: Vec<ModuleName> = module.depends_on.clone();

        while let Some(name) = queue.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            match self.resolver.module(&name) {
                Some(dep) => {
                    files.extend(dep.files.iter().cloned());
                    queue.extend(dep.depends_on.iter().cloned());
                }
                None => {
                    warn!(module = %name, "unresolved source module dependency");
                }
            }
        }

        let dependency = self
            .dependency_cache
            .get_or_build(&self.resolver.library_index());

        ExpandedRequest {
            files: files.into_iter().collect(),
            context: ModuleContext { module, dependency },
        }
    }

    pub fn dependency_cache(&self) -> &DependencyModuleCache {
        &self.dependency_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{DependencyModule, LibraryIndexSnapshot, WorkspaceIndex};
    use std::path::Path;

    struct StubBuilder;

    impl DependencyModuleBuilder for StubBuilder {
        fn build(&self, snapshot: &LibraryIndexSnapshot) -> DependencyModule {
            DependencyModule::new(ModuleName::new("<dependencies>"), snapshot.fingerprint())
        }
    }

    fn module(name: &str, files: &[&str], deps: &[&str]) -> ModuleDescriptor {
        ModuleDescriptor::new(
            ModuleName::new(name),
            files.iter().map(PathBuf::from).collect(),
            deps.iter().map(|d| ModuleName::new(*d)).collect(),
        )
    }

    fn collector(index: WorkspaceIndex) -> DependencyCollector {
        DependencyCollector::new(Arc::new(index), Arc::new(StubBuilder), "opts".to_string())
    }

    #[test]
    fn test_expand_pulls_in_module_siblings() {
        let mut index = WorkspaceIndex::new();
        index.add_module(module("m", &["/src/a.mn", "/src/b.mn"], &[]));

        let expanded = collector(index)
            .expand(&[PathBuf::from("/src/b.mn")])
            .unwrap();

        assert!(expanded.files.contains(&PathBuf::from("/src/a.mn")));
        assert!(expanded.files.contains(&PathBuf::from("/src/b.mn")));
        assert_eq!(expanded.context.module.name, ModuleName::new("m"));
    }

    #[test]
    fn test_expand_follows_transitive_source_dependencies() {
        let mut index = WorkspaceIndex::new();
        index.add_module(module("app", &["/app/main.mn"], &["lib"]));
        index.add_module(module("lib", &["/lib/api.mn"], &["base"]));
        index.add_module(module("base", &["/base/core.mn"], &[]));

        let expanded = collector(index)
            .expand(&[PathBuf::from("/app/main.mn")])
            .unwrap();

        assert!(expanded.files.contains(&PathBuf::from("/lib/api.mn")));
        assert!(expanded.files.contains(&PathBuf::from("/base/core.mn")));
    }

    #[test]
    fn test_expand_tolerates_dependency_cycles() {
        let mut index = WorkspaceIndex::new();
        index.add_module(module("a", &["/a.mn"], &["b"]));
        index.add_module(module("b", &["/b.mn"], &["a"]));

        let expanded = collector(index).expand(&[PathBuf::from("/a.mn")]).unwrap();

        assert!(expanded.files.contains(&PathBuf::from("/b.mn")));
    }

    #[test]
    fn test_expand_unowned_file_fails() {
        let index = WorkspaceIndex::new();

        let err = collector(index)
            .expand(&[PathBuf::from("/loose.mn")])
            .unwrap_err();

        assert!(matches!(err, AnalysisError::NoProjectContext { .. }));
    }

    #[test]
    fn test_expand_singleton() {
        let index = WorkspaceIndex::new();

        let expanded = collector(index)
            .expand_singleton(&[PathBuf::from("/loose.mn")])
            .unwrap();

        assert_eq!(expanded.files, vec![PathBuf::from("/loose.mn")]);
        assert!(expanded.context.module.depends_on.is_empty());
    }

    #[test]
    fn test_expand_empty_request_fails() {
        let index = WorkspaceIndex::new();
        let collector = collector(index);

        assert!(matches!(
            collector.expand(&[]),
            Err(AnalysisError::EmptyRequest)
        ));
        assert!(matches!(
            collector.expand_singleton(&[]),
            Err(AnalysisError::EmptyRequest)
        ));
    }

    #[test]
    fn test_requested_files_come_first() {
        let mut index = WorkspaceIndex::new();
        index.add_module(module("m", &["/src/a.mn", "/src/b.mn"], &[]));

        let expanded = collector(index)
            .expand(&[PathBuf::from("/src/b.mn")])
            .unwrap();

        assert_eq!(expanded.files[0], Path::new("/src/b.mn"));
    }
}
