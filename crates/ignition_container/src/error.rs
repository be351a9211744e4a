//! Error types for graph assembly and compilation.

/// A configuration-loading hook failed.
///
/// Raised by the collaborator's loading hook; assembly is purely in-memory,
/// so this error never leaves partial state on disk.
#[derive(Debug, thiserror::Error)]
#[error("configuration loading failed: {message}")]
pub struct ConfigurationLoadError {
    /// Description of the load failure.
    pub message: String,
}

impl ConfigurationLoadError {
    /// Creates a new configuration-load error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that can abort graph assembly.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// The collaborator's configuration-loading hook failed.
    #[error(transparent)]
    ConfigurationLoad(#[from] ConfigurationLoadError),

    /// A compiler pass rejected the graph.
    #[error("graph compilation failed in pass '{pass}': {reason}")]
    Compile {
        /// Name of the pass that failed.
        pass: String,
        /// Description of the failure.
        reason: String,
    },
}
