//! Resources: the inputs a compiled graph depends on.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignition_common::ContentHash;

/// One input the compiled graph depends on.
///
/// Resources are recorded during assembly and serialized next to the
/// artifact, so freshness can be re-evaluated later without re-running
/// assembly. The artifact is fresh iff every recorded resource is still
/// valid under its own rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resource {
    /// A file on disk, valid while its modification time is unchanged.
    File {
        /// Absolute or project-relative path of the file.
        path: PathBuf,
        /// Modification time in whole seconds since the Unix epoch,
        /// captured when the resource was recorded.
        mtime: u64,
    },

    /// A non-file input identified by an opaque fingerprint (e.g. the
    /// identity of a registration hook). There is nothing to re-check at
    /// freshness time: a changed fingerprint changes the generation name,
    /// so the stale artifact is simply never found.
    Opaque {
        /// Stable identifier for the input.
        id: String,
        /// Fingerprint of the input at record time.
        fingerprint: ContentHash,
    },
}

impl Resource {
    /// Records a file resource, capturing its current modification time.
    pub fn file(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let mtime = current_mtime(&path)?;
        Ok(Resource::File { path, mtime })
    }

    /// Records an opaque resource from an identifier and fingerprint bytes.
    pub fn opaque(id: impl Into<String>, data: &[u8]) -> Self {
        Resource::Opaque {
            id: id.into(),
            fingerprint: ContentHash::from_bytes(data),
        }
    }

    /// Re-evaluates the resource's validity predicate.
    ///
    /// A file resource is valid while the file exists and its modification
    /// time matches the recorded one; a deleted or rewritten file
    /// invalidates the artifact. Opaque resources are always valid.
    pub fn is_valid(&self) -> bool {
        match self {
            Resource::File { path, mtime } => {
                matches!(current_mtime(path), Ok(current) if current == *mtime)
            }
            Resource::Opaque { .. } => true,
        }
    }
}

fn current_mtime(path: &Path) -> std::io::Result<u64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn file_resource_valid_while_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.conf");
        std::fs::write(&path, "a = 1").unwrap();

        let resource = Resource::file(&path).unwrap();
        assert!(resource.is_valid());
    }

    #[test]
    fn file_resource_invalid_after_mtime_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.conf");
        std::fs::write(&path, "a = 1").unwrap();

        let resource = Resource::file(&path).unwrap();

        // Push the mtime forward explicitly; rewriting within the same
        // second would not be observable at whole-second granularity.
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        let later = std::time::SystemTime::now() + Duration::from_secs(10);
        file.set_modified(later).unwrap();

        assert!(!resource.is_valid());
    }

    #[test]
    fn file_resource_invalid_after_deletion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.conf");
        std::fs::write(&path, "a = 1").unwrap();

        let resource = Resource::file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!resource.is_valid());
    }

    #[test]
    fn file_resource_missing_at_record_time_errors() {
        assert!(Resource::file("/nonexistent/services.conf").is_err());
    }

    #[test]
    fn opaque_resource_always_valid() {
        let resource = Resource::opaque("hooks", b"hook identity v1");
        assert!(resource.is_valid());
    }

    #[test]
    fn serde_roundtrip() {
        let resource = Resource::opaque("hooks", b"data");
        let json = serde_json::to_string(&resource).unwrap();
        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(resource, back);
    }
}
