use serde::{Deserialize, Serialize};

/// Options that control analysis scheduling and fallback behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Number of background worker threads for async analysis
    /// (default: available parallelism)
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Analyze files with no owning module as singleton modules (default: true)
    ///
    /// When disabled, such requests yield a degraded empty result instead.
    #[serde(default = "default_true")]
    pub fallback_to_singleton: bool,
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            fallback_to_singleton: true,
        }
    }
}

/// Hash analysis options to detect option changes
/// Any change in options invalidates the dependency-module cache
pub fn hash_options(options: &AnalysisOptions) -> String {
    // Serialize to JSON for stable hashing
    let json = serde_json::to_string(options).expect("Failed to serialize options");
    let hash = blake3::hash(json.as_bytes());
    hash.to_hex().to_string()
}
