//! Incremental analysis cache and coordination layer for the Meridian
//! semantic analyzer
//!
//! Decides when a previously computed analysis result can be reused, merges
//! concurrent requests for the same file set into a single analyzer run, and
//! expands single-file requests into whole-module analysis with resolved
//! dependencies. The engine itself, project resolution, and the library
//! indexer are injected seams; this crate only schedules, caches, and
//! invalidates around them.

pub mod analyzer;
pub mod cache;
pub mod collector;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod module;
pub mod runner;
pub mod session;
pub mod testing;

pub use analyzer::{AnalysisOutput, Analyzer, DependencyModuleBuilder, ModuleContext};
pub use cache::{AnalysisKey, AnalysisSnapshot, PutOutcome, ResultCache};
pub use collector::{DependencyCollector, ExpandedRequest};
pub use config::AnalysisOptions;
pub use coordinator::AnalysisCoordinator;
pub use diagnostics::{
    CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler, DiagnosticLevel, Span,
    TracingDiagnosticHandler,
};
pub use document::{DocumentStore, Revision, SourceFile};
pub use errors::AnalysisError;
pub use module::{
    DependencyModule, LibraryIndexSnapshot, ModuleDescriptor, ModuleName, ModuleResolver,
    WorkspaceIndex,
};
pub use runner::{AnalysisHandle, AnalysisRunner};
pub use session::AnalysisSession;
