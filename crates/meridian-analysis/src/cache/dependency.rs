use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::analyzer::DependencyModuleBuilder;
use crate::module::{DependencyModule, LibraryIndexSnapshot};

/// Cache for built dependency modules
///
/// Keyed by (library index fingerprint, options hash), not by source file
/// identity: source edits never invalidate a dependency module, only a change
/// to the library set or to the analysis options does.
pub struct DependencyModuleCache {
    builder: Arc<dyn DependencyModuleBuilder>,
    options_hash: String,
    built: Mutex<FxHashMap<String, Arc<DependencyModule>>>,
}

impl DependencyModuleCache {
    pub fn new(builder: Arc<dyn DependencyModuleBuilder>, options_hash: String) -> Self {
        Self {
            builder,
            options_hash,
            built: Mutex::new(FxHashMap::default()),
        }
    }

    /// Return the dependency module for a snapshot, building it on first use
    pub fn get_or_build(&self, snapshot: &LibraryIndexSnapshot) -> Arc<DependencyModule> {
        let key = format!("{}:{}", snapshot.fingerprint(), self.options_hash);
        let mut built = self.built.lock().unwrap();

        if let Some(module) = built.get(&key) {
            return module.clone();
        }

        info!(
            entries = snapshot.entries.len(),
            revision = snapshot.revision,
            "building dependency module"
        );
        let module = Arc::new(self.builder.build(snapshot));
        built.insert(key, module.clone());
        module
    }

    pub fn len(&self) -> usize {
        self.built.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.built.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.built.lock().unwrap().clear();
    }
}
