//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur while persisting or publishing artifacts.
///
/// Reads are fail-safe and never surface these; only the write path (dump
/// and cache-directory preparation) propagates errors. Generation cleanup
/// failures are logged and swallowed, never returned.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache directory could not be created or is not writable.
    #[error("unable to create or write the cache directory {path}: {source}")]
    CacheDirUnavailable {
        /// The cache directory path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O error occurred while writing artifact files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization error occurred while encoding artifact payloads.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
