//! The mutable configuration graph and its compile step.
//!
//! A [`GraphBuilder`] accumulates parameters, component definitions, aliases,
//! resources, and compiler passes during assembly, then freezes into an
//! immutable [`CompiledGraph`]. The graph-resolution machinery here is
//! deliberately small: collaborator hooks populate the graph, and the
//! built-in passes only flatten aliases and validate references.

#![warn(missing_docs)]

mod builder;
mod compiled;
mod definition;
mod error;
mod passes;
mod resource;
mod value;

pub use builder::{DeprecationNotice, GraphBuilder};
pub use compiled::CompiledGraph;
pub use definition::Definition;
pub use error::{AssemblyError, ConfigurationLoadError};
pub use passes::{CompilerPass, PassOrder};
pub use resource::Resource;
pub use value::Value;
