//! The runtime view of a loaded artifact.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ignition_cache::LoadedArtifact;
use ignition_container::{Definition, Value};

/// A snapshot of the kernel handed to the container on adoption.
///
/// Components resolve environment, debug flag, and paths through this
/// instead of holding a reference back to the kernel value itself.
#[derive(Debug, Clone)]
pub struct KernelInfo {
    /// The kernel name the container class was derived from.
    pub name: String,
    /// The environment the container was compiled for.
    pub environment: String,
    /// Whether the container was compiled with debug enabled.
    pub debug: bool,
    /// The project root directory.
    pub project_dir: PathBuf,
    /// The cache directory the artifact lives in.
    pub cache_dir: PathBuf,
    /// The stable container class name.
    pub container_class: String,
}

/// The runtime-loaded instantiation of an artifact.
///
/// Parameters come eagerly from the root file; component definitions are
/// loaded lazily from the generation directory's auxiliary files the first
/// time they are requested, then memoized. Never mutated after
/// construction apart from that memoization.
pub struct Container {
    artifact: LoadedArtifact,
    info: KernelInfo,
    definitions: Mutex<HashMap<String, Arc<Definition>>>,
}

impl Container {
    pub(crate) fn new(artifact: LoadedArtifact, info: KernelInfo) -> Self {
        Self {
            artifact,
            info,
            definitions: Mutex::new(HashMap::new()),
        }
    }

    /// The kernel snapshot injected on adoption.
    pub fn kernel(&self) -> &KernelInfo {
        &self.info
    }

    /// The generation name this container was loaded from.
    pub fn generation(&self) -> &str {
        &self.artifact.manifest().generation
    }

    /// Looks up a graph parameter.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.artifact.manifest().parameters.get(name)
    }

    /// Resolves an identifier through the flattened alias table.
    fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.artifact
            .manifest()
            .aliases
            .get(id)
            .map(String::as_str)
            .unwrap_or(id)
    }

    /// Returns `true` if a component with the given identifier exists.
    pub fn has(&self, id: &str) -> bool {
        self.artifact
            .manifest()
            .components
            .contains_key(self.resolve(id))
    }

    /// Loads a component definition, lazily reading its auxiliary file.
    ///
    /// Returns `None` for unknown identifiers and for auxiliary files that
    /// are missing or corrupt.
    pub fn definition(&self, id: &str) -> Option<Arc<Definition>> {
        let id = self.resolve(id).to_string();

        let mut cache = self.definitions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(def) = cache.get(&id) {
            return Some(Arc::clone(def));
        }

        let def = Arc::new(self.artifact.load_definition(&id)?);
        cache.insert(id, Arc::clone(&def));
        Some(def)
    }
}
