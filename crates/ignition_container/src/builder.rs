//! The mutable configuration graph.

use std::collections::BTreeMap;

use crate::compiled::CompiledGraph;
use crate::definition::Definition;
use crate::error::AssemblyError;
use crate::passes::{CompilerPass, PassOrder, ResolveAliasesPass, ValidateReferencesPass};
use crate::resource::Resource;
use crate::value::Value;

/// A recoverable warning emitted while the graph was being populated.
///
/// Notices never abort assembly; in debug mode the kernel deduplicates them
/// into a sidecar log after compilation finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeprecationNotice {
    /// The warning text. Deduplication is keyed on this.
    pub message: String,
    /// Source file of the call site that emitted the notice.
    pub file: String,
    /// Line of the call site.
    pub line: u32,
}

/// The in-memory mutable configuration graph built during assembly.
///
/// Hooks populate parameters, definitions, aliases, resources, and passes;
/// [`compile`](Self::compile) then runs the passes and freezes the result
/// into a [`CompiledGraph`]. Assembly is purely in-memory: nothing here
/// touches the filesystem, so a failed compile never corrupts a previously
/// published artifact.
pub struct GraphBuilder {
    parameters: BTreeMap<String, Value>,
    definitions: BTreeMap<String, Definition>,
    aliases: BTreeMap<String, String>,
    resources: Vec<Resource>,
    passes: Vec<(PassOrder, Box<dyn CompilerPass>)>,
    deprecations: Vec<DeprecationNotice>,
    log: Vec<String>,
}

impl GraphBuilder {
    /// Creates an empty graph with no parameters.
    pub fn new() -> Self {
        Self {
            parameters: BTreeMap::new(),
            definitions: BTreeMap::new(),
            aliases: BTreeMap::new(),
            resources: Vec::new(),
            passes: Vec::new(),
            deprecations: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Sets a graph parameter, replacing any previous value.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Looks up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Registers a component definition, replacing any previous one with
    /// the same identifier.
    pub fn register(&mut self, id: impl Into<String>, definition: Definition) {
        self.definitions.insert(id.into(), definition);
    }

    /// Registers an alias from one identifier to another.
    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    /// Returns `true` if a definition with the given identifier exists.
    pub fn has_definition(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    /// All registered definitions.
    pub fn definitions(&self) -> &BTreeMap<String, Definition> {
        &self.definitions
    }

    /// All registered aliases.
    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Replaces the alias table; used by the alias-resolution pass.
    pub(crate) fn replace_aliases(&mut self, aliases: BTreeMap<String, String>) {
        self.aliases = aliases;
    }

    /// Records a resource the compiled graph will depend on.
    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Registers a compiler pass at the given position.
    pub fn add_pass(&mut self, pass: Box<dyn CompilerPass>, order: PassOrder) {
        self.passes.push((order, pass));
    }

    /// Emits a deprecation notice. Never aborts assembly.
    pub fn deprecate(&mut self, message: impl Into<String>, file: &str, line: u32) {
        self.deprecations.push(DeprecationNotice {
            message: message.into(),
            file: file.to_string(),
            line,
        });
    }

    /// The notices emitted so far. Available on both the success and the
    /// failure path, so the kernel can always write its diagnostics log.
    pub fn deprecations(&self) -> &[DeprecationNotice] {
        &self.deprecations
    }

    /// Appends a line to the compiler log.
    pub fn log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    /// The compiler log accumulated so far. Like
    /// [`deprecations`](Self::deprecations), survives a failed compile.
    pub fn compiler_log(&self) -> &[String] {
        &self.log
    }

    /// Runs all passes and freezes the graph into a [`CompiledGraph`].
    ///
    /// Collaborator passes run first in registration order, then the
    /// built-in alias-resolution and reference-validation passes. The first
    /// failing pass aborts compilation with [`AssemblyError::Compile`].
    pub fn compile(&mut self) -> Result<CompiledGraph, AssemblyError> {
        let mut passes = std::mem::take(&mut self.passes);
        passes.push((PassOrder::Optimization, Box::new(ResolveAliasesPass)));
        passes.push((PassOrder::Optimization, Box::new(ValidateReferencesPass)));
        // Stable sort keeps registration order within each phase.
        passes.sort_by_key(|(order, _)| *order);

        for (_, pass) in &passes {
            if let Err(reason) = pass.process(self) {
                self.log.push(format!("pass {}: failed: {reason}", pass.name()));
                return Err(AssemblyError::Compile {
                    pass: pass.name().to_string(),
                    reason,
                });
            }
            self.log.push(format!("pass {}: ok", pass.name()));
        }

        Ok(CompiledGraph {
            parameters: self.parameters.clone(),
            definitions: self.definitions.clone(),
            aliases: self.aliases.clone(),
            resources: self.resources.clone(),
            compiler_log: self.log.clone(),
        })
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingPass {
        name: &'static str,
    }

    impl CompilerPass for RecordingPass {
        fn name(&self) -> &str {
            self.name
        }

        fn process(&self, graph: &mut GraphBuilder) -> Result<(), String> {
            graph.log(format!("ran {}", self.name));
            Ok(())
        }
    }

    struct FailingPass;

    impl CompilerPass for FailingPass {
        fn name(&self) -> &str {
            "failing"
        }

        fn process(&self, _graph: &mut GraphBuilder) -> Result<(), String> {
            Err("intentional".to_string())
        }
    }

    #[test]
    fn parameters_roundtrip() {
        let mut graph = GraphBuilder::new();
        graph.set_parameter("kernel.environment", "dev");
        assert_eq!(
            graph.parameter("kernel.environment").and_then(Value::as_str),
            Some("dev")
        );
        assert!(graph.parameter("missing").is_none());
    }

    #[test]
    fn register_and_query_definitions() {
        let mut graph = GraphBuilder::new();
        graph.register("app.service", Definition::new("factory"));
        assert!(graph.has_definition("app.service"));
        assert!(!graph.has_definition("other"));
    }

    #[test]
    fn compile_empty_graph() {
        let graph = GraphBuilder::new().compile().unwrap();
        assert!(graph.definitions.is_empty());
        assert!(graph.compiler_log.iter().any(|l| l.contains("resolve-aliases")));
    }

    #[test]
    fn collaborator_passes_run_before_builtins() {
        let mut builder = GraphBuilder::new();
        builder.add_pass(
            Box::new(RecordingPass { name: "custom" }),
            PassOrder::BeforeOptimization,
        );
        let graph = builder.compile().unwrap();

        let custom = graph
            .compiler_log
            .iter()
            .position(|l| l.contains("ran custom"))
            .unwrap();
        let builtin = graph
            .compiler_log
            .iter()
            .position(|l| l.contains("pass resolve-aliases"))
            .unwrap();
        assert!(custom < builtin);
    }

    #[test]
    fn registration_order_preserved_within_phase() {
        let mut builder = GraphBuilder::new();
        builder.add_pass(
            Box::new(RecordingPass { name: "first" }),
            PassOrder::BeforeOptimization,
        );
        builder.add_pass(
            Box::new(RecordingPass { name: "second" }),
            PassOrder::BeforeOptimization,
        );
        let graph = builder.compile().unwrap();

        let first = graph
            .compiler_log
            .iter()
            .position(|l| l.contains("ran first"))
            .unwrap();
        let second = graph
            .compiler_log
            .iter()
            .position(|l| l.contains("ran second"))
            .unwrap();
        assert!(first < second);
    }

    #[test]
    fn failing_pass_aborts_compile() {
        let mut builder = GraphBuilder::new();
        builder.add_pass(Box::new(FailingPass), PassOrder::BeforeOptimization);

        let err = builder.compile().unwrap_err();
        match err {
            AssemblyError::Compile { pass, reason } => {
                assert_eq!(pass, "failing");
                assert_eq!(reason, "intentional");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Failure is still visible in the log for the diagnostics sidecar.
        assert!(builder.compiler_log().iter().any(|l| l.contains("failed")));
    }

    #[test]
    fn deprecations_survive_failed_compile() {
        let mut builder = GraphBuilder::new();
        builder.deprecate("old option", file!(), line!());
        builder.add_pass(Box::new(FailingPass), PassOrder::BeforeOptimization);

        assert!(builder.compile().is_err());
        assert_eq!(builder.deprecations().len(), 1);
        assert_eq!(builder.deprecations()[0].message, "old option");
    }

    #[test]
    fn resources_carried_into_compiled_graph() {
        let mut builder = GraphBuilder::new();
        builder.add_resource(Resource::opaque("hooks", b"v1"));
        let graph = builder.compile().unwrap();
        assert_eq!(graph.resources.len(), 1);
    }
}
