use std::path::PathBuf;
use thiserror::Error;

/// Errors raised inside the analysis layer.
///
/// None of these ever escape the public entry points: `AnalysisSession` and
/// `AnalysisCoordinator` convert every failure into a degraded snapshot so the
/// embedding editor always gets a usable result back.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no project context for file: {}", path.display())]
    NoProjectContext { path: PathBuf },

    #[error("analyzer aborted: {0}")]
    AnalyzerFatal(String),

    #[error("analysis requested for an empty file set")]
    EmptyRequest,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
