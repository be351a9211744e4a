//! The freshness oracle and the sibling resource-metadata file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ignition_container::Resource;

use crate::error::CacheError;

/// How the oracle evaluates a cached artifact.
///
/// `TrustExisting` is the non-debug default: a production artifact is
/// trusted until explicitly invalidated by redeploy. `CheckResources` is
/// what debug mode uses, and may also be opted into for non-debug
/// deployments that want mtime-based invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessPolicy {
    /// Fresh iff the root file exists; no per-resource checks.
    TrustExisting,
    /// Fresh iff the root file exists and every recorded resource is valid.
    CheckResources,
}

impl FreshnessPolicy {
    /// The default policy for the given debug flag.
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            FreshnessPolicy::CheckResources
        } else {
            FreshnessPolicy::TrustExisting
        }
    }
}

/// The resource set persisted next to an artifact's root file.
///
/// Stored as `{Class}.meta.json`, so freshness can be re-evaluated without
/// re-running assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceManifest {
    /// The resources the artifact depends on.
    pub resources: Vec<Resource>,
}

impl ResourceManifest {
    /// Loads the manifest, returning `None` if it is missing or corrupt.
    ///
    /// Fail-safe: any problem reads as a stale artifact, never an error.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Saves the manifest, creating parent directories if needed.
    ///
    /// Written via temp file + rename: a concurrent freshness check reads
    /// either the previous manifest or the complete new one.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        let tmp = crate::artifact::tmp_sibling(path);
        std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            CacheError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }
}

/// Returns the metadata file path for a given root file path.
///
/// `{dir}/{Class}.root` maps to `{dir}/{Class}.meta.json`.
pub fn meta_path_for(root_path: &Path) -> PathBuf {
    let stem = root_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("artifact");
    root_path.with_file_name(format!("{stem}.meta.json"))
}

/// The freshness oracle for one cached artifact.
///
/// A pure predicate over the filesystem: it never writes, and a corrupt or
/// unreadable metadata file reads as stale rather than erroring.
#[derive(Debug)]
pub struct ArtifactCache {
    root_path: PathBuf,
    meta_path: PathBuf,
    policy: FreshnessPolicy,
}

impl ArtifactCache {
    /// Creates an oracle for the artifact at `root_path`.
    pub fn new(root_path: impl Into<PathBuf>, policy: FreshnessPolicy) -> Self {
        let root_path = root_path.into();
        let meta_path = meta_path_for(&root_path);
        Self {
            root_path,
            meta_path,
            policy,
        }
    }

    /// Path of the artifact's root file.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Path of the sibling metadata file.
    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    /// Decides whether the cached artifact may be used without recompiling.
    pub fn is_fresh(&self) -> bool {
        if !self.root_path.exists() {
            return false;
        }
        match self.policy {
            FreshnessPolicy::TrustExisting => true,
            FreshnessPolicy::CheckResources => {
                let Some(manifest) = ResourceManifest::load(&self.meta_path) else {
                    return false;
                };
                manifest.resources.iter().all(Resource::is_valid)
            }
        }
    }
}
