//! Error types for the boot path.

use std::path::PathBuf;

use ignition_cache::CacheError;
use ignition_container::AssemblyError;

/// Errors that abort a boot attempt.
///
/// All variants are fatal and surface to the caller uncaught; there is no
/// automatic retry. The only self-healing behavior on the boot path is the
/// corrupt-artifact fallback, which recompiles instead of erroring and so
/// never appears here.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    /// The cache directory could not be prepared, or the artifact could
    /// not be written.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration loading or graph compilation failed. Assembly is
    /// purely in-memory, so a previously published artifact is untouched.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// The artifact that was just dumped failed to load back.
    #[error("freshly dumped artifact at {path} failed to reload")]
    ArtifactReload {
        /// Path of the root file that would not load.
        path: PathBuf,
    },
}
