use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::diagnostics::Diagnostic;
use crate::document::SourceFile;
use crate::errors::Result;
use crate::module::{DependencyModule, LibraryIndexSnapshot, ModuleDescriptor};

/// Everything the engine needs to analyze one module: the source module
/// descriptor and the read-only dependency module for its binary deps
#[derive(Debug, Clone)]
pub struct ModuleContext {
    pub module: ModuleDescriptor,
    pub dependency: Arc<DependencyModule>,
}

/// Payload produced by one analyzer run
///
/// Opaque to the caching layer: the cache never inspects bindings, it only
/// stores and republishes them.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutput {
    /// Diagnostics reported during the run
    pub diagnostics: Vec<Diagnostic>,

    /// Resolved symbol bindings: symbol -> defining file
    pub bindings: FxHashMap<String, PathBuf>,
}

impl AnalysisOutput {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The opaque semantic-analysis engine
///
/// May fail with `AnalysisError::AnalyzerFatal`; the coordinator recovers
/// from that locally and never surfaces it to callers.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, context: &ModuleContext, files: &[Arc<SourceFile>])
        -> Result<AnalysisOutput>;
}

/// Builds the read-only dependency module from a library index snapshot
///
/// Building is far more expensive than source analysis, which is why the
/// result is cached independently of source file identity.
pub trait DependencyModuleBuilder: Send + Sync {
    fn build(&self, snapshot: &LibraryIndexSnapshot) -> DependencyModule;
}
