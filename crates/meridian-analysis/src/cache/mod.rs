//! In-memory analysis result cache
//!
//! Stores published analysis snapshots keyed by the exact file set (and
//! per-file content revisions) that produced them, with single-entry-per-file
//! invalidation and rejection of late results computed against stale content.
//! The dependency-module cache lives here too, keyed by the library index
//! snapshot rather than source identity.

mod dependency;
mod key;
mod snapshot;
mod store;

pub use dependency::DependencyModuleCache;
pub use key::AnalysisKey;
pub use snapshot::AnalysisSnapshot;
pub use store::{PutOutcome, ResultCache};
