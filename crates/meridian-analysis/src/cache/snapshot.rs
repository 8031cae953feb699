use crate::analyzer::AnalysisOutput;
use crate::diagnostics::Diagnostic;
use crate::module::ModuleName;

use super::AnalysisKey;

/// An immutable published analysis result
///
/// Never mutated after publication; a newer analysis produces a new snapshot.
/// Shared by `Arc` between the cache and every caller that was waiting when
/// it was published.
#[derive(Debug)]
pub struct AnalysisSnapshot {
    pub key: AnalysisKey,
    pub module: ModuleName,
    pub output: AnalysisOutput,

    /// Set when the analyzer aborted and this result was synthesized empty
    /// so the editor stays responsive
    pub degraded: bool,
}

impl AnalysisSnapshot {
    pub fn new(key: AnalysisKey, module: ModuleName, output: AnalysisOutput) -> Self {
        Self {
            key,
            module,
            output,
            degraded: false,
        }
    }

    /// Best-effort empty result for a failed or unresolvable analysis
    pub fn degraded(key: AnalysisKey, module: ModuleName) -> Self {
        Self {
            key,
            module,
            output: AnalysisOutput::empty(),
            degraded: true,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.output.diagnostics
    }
}
