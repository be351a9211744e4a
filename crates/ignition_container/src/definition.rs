//! Component construction recipes.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The construction recipe for one component in the graph.
///
/// A definition does not hold a live component; it records which factory
/// produces it and with which arguments. Materializing a definition into a
/// running component is the embedding application's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Identifier of the factory/constructor that produces this component.
    pub factory: String,

    /// Arguments passed to the factory, in order.
    pub arguments: Vec<Value>,

    /// Whether the component may be looked up directly on the container.
    /// Non-public components only exist as arguments of others.
    pub public: bool,
}

impl Definition {
    /// Creates a private definition for the given factory with no arguments.
    pub fn new(factory: impl Into<String>) -> Self {
        Self {
            factory: factory.into(),
            arguments: Vec::new(),
            public: false,
        }
    }

    /// Appends a factory argument.
    pub fn with_argument(mut self, value: Value) -> Self {
        self.arguments.push(value);
        self
    }

    /// Marks the definition as publicly retrievable.
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Visits every component reference in the definition's arguments.
    pub fn for_each_ref<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        for arg in &self.arguments {
            arg.for_each_ref(f);
        }
    }
}
