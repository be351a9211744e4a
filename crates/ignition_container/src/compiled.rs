//! The immutable compiled graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ignition_common::ContentHash;

use crate::definition::Definition;
use crate::resource::Resource;
use crate::value::Value;

/// The frozen result of a successful assembly.
///
/// Built once per compile cycle and handed to the dumper, which splits it
/// into a root artifact file plus per-component auxiliary files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledGraph {
    /// Graph parameters, including the kernel-seeded ones.
    pub parameters: BTreeMap<String, Value>,

    /// All component definitions, keyed by identifier.
    pub definitions: BTreeMap<String, Definition>,

    /// Flattened aliases: every target names a real definition.
    pub aliases: BTreeMap<String, String>,

    /// The inputs this graph depends on, for later freshness checks.
    pub resources: Vec<Resource>,

    /// Log lines emitted by the compiler passes.
    pub compiler_log: Vec<String>,
}

impl CompiledGraph {
    /// Derives the graph's content identity.
    ///
    /// Hashes parameters, definitions, and aliases; resources and the
    /// compiler log are provenance, not meaning, and are excluded so that
    /// re-assembling an unchanged configuration yields the same identity.
    pub fn content_hash(&self) -> ContentHash {
        // Encoding maps of plain serde types cannot fail.
        let bytes = bincode::serde::encode_to_vec(
            (&self.parameters, &self.definitions, &self.aliases),
            bincode::config::standard(),
        )
        .unwrap_or_default();
        ContentHash::from_bytes(&bytes)
    }
}
