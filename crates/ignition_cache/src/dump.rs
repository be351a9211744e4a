//! Serializing a compiled graph into a loadable artifact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ignition_common::ContentHash;
use ignition_container::CompiledGraph;

use crate::artifact::{write_framed, Artifact, RootManifest};
use crate::error::CacheError;
use crate::freshness::{meta_path_for, ResourceManifest};

/// Writes compiled graphs into the cache directory as artifacts.
///
/// An artifact is a root file plus one auxiliary file per component, under
/// a content-named generation directory. Auxiliary files are written
/// first, then the root, then the resource metadata, each via temp file +
/// rename: a reader that sees the root file is guaranteed every auxiliary
/// file it references already exists, and the metadata never describes a
/// root that hasn't been published yet.
pub struct ArtifactDumper {
    cache_dir: PathBuf,
}

impl ArtifactDumper {
    /// Creates a dumper targeting the given cache directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Dumps the graph under the given stable container class name.
    ///
    /// The generation directory is named `{class}_{content-hash}`, so two
    /// distinct graphs never collide and re-dumping an unchanged graph
    /// rewrites the same generation in place, which is idempotent.
    pub fn dump(&self, graph: &CompiledGraph, class_name: &str) -> Result<Artifact, CacheError> {
        let generation = format!("{class_name}_{}", graph.content_hash().short());
        let generation_dir = self.cache_dir.join(&generation);
        std::fs::create_dir_all(&generation_dir).map_err(|e| CacheError::Io {
            path: generation_dir.clone(),
            source: e,
        })?;

        // Auxiliary files first.
        let mut components = BTreeMap::new();
        for (id, definition) in &graph.definitions {
            let file = format!("{}.def", ContentHash::from_bytes(id.as_bytes()).short());
            let payload = bincode::serde::encode_to_vec(definition, bincode::config::standard())
                .map_err(|e| CacheError::Serialization {
                    reason: e.to_string(),
                })?;
            let path = generation_dir.join(&file);
            write_framed(&path, &payload)?;
            set_world_readable(&path);
            components.insert(id.clone(), file);
        }

        // A fresh write supersedes any earlier legacy marking of this
        // same generation name.
        let sentinel = self.cache_dir.join(format!("{generation}.legacy"));
        if let Err(e) = std::fs::remove_file(&sentinel) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %sentinel.display(), error = %e, "failed to clear stale legacy sentinel");
            }
        }

        // Root file next; its rename inside `write_framed` is the publish
        // signal for concurrent readers.
        let root_path = self.cache_dir.join(format!("{class_name}.root"));
        let manifest = RootManifest {
            container_class: class_name.to_string(),
            generation: generation.clone(),
            parameters: graph.parameters.clone(),
            aliases: graph.aliases.clone(),
            components,
        };
        let payload = bincode::serde::encode_to_vec(&manifest, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        write_framed(&root_path, &payload)?;
        set_world_readable(&root_path);

        // Resource metadata strictly after the root. A dump cut short here
        // leaves a fresh root paired with the previous metadata, which
        // reads as stale and costs one redundant recompile; the reverse
        // pairing would serve a stale artifact as fresh.
        let meta_path = meta_path_for(&root_path);
        ResourceManifest {
            resources: graph.resources.clone(),
        }
        .save(&meta_path)?;

        Ok(Artifact {
            class_name: class_name.to_string(),
            generation,
            root_path,
            meta_path,
            generation_dir,
        })
    }
}

/// Makes an artifact file world-readable and non-executable.
///
/// Failures are logged and ignored: wrong permissions degrade sharing
/// between processes, never correctness.
fn set_world_readable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)) {
            tracing::warn!(path = %path.display(), error = %e, "failed to set artifact permissions");
        }
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}
