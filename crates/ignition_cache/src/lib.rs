//! Compiled-artifact caching and the generation lifecycle.
//!
//! This crate persists [`CompiledGraph`](ignition_container::CompiledGraph)s
//! as loadable artifacts (a root file plus per-component auxiliary files in
//! a generation directory), decides whether a cached artifact is still
//! fresh, and reclaims superseded generations with a one-cycle grace window
//! so in-flight readers are never pulled out from under.
//!
//! All reads are fail-safe: a corrupt or truncated artifact is a cache
//! miss, never an error.

#![warn(missing_docs)]

mod artifact;
mod dump;
mod error;
mod freshness;
mod generation;

pub use artifact::{Artifact, LoadedArtifact, RootManifest};
pub use dump::ArtifactDumper;
pub use error::CacheError;
pub use freshness::{meta_path_for, ArtifactCache, FreshnessPolicy, ResourceManifest};
pub use generation::GenerationManager;
