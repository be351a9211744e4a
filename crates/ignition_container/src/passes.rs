//! Compiler passes run when the graph is frozen.
//!
//! Collaborator-registered passes run before the built-in optimization
//! passes, matching the registration hook's contract: a hook may rewrite
//! definitions before aliases are flattened and references checked.

use crate::builder::GraphBuilder;

/// Where a pass runs relative to the built-in optimization passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PassOrder {
    /// Runs before the built-in passes, in registration order.
    BeforeOptimization,
    /// Runs with the built-in passes, after all `BeforeOptimization` passes.
    Optimization,
}

/// A transformation or validation applied to the graph during compilation.
pub trait CompilerPass {
    /// Short pass name, used in the compiler log and in error messages.
    fn name(&self) -> &str;

    /// Processes the graph, returning a failure reason on rejection.
    fn process(&self, graph: &mut GraphBuilder) -> Result<(), String>;
}

/// Flattens alias chains and rejects dangling or cyclic aliases.
pub(crate) struct ResolveAliasesPass;

impl CompilerPass for ResolveAliasesPass {
    fn name(&self) -> &str {
        "resolve-aliases"
    }

    fn process(&self, graph: &mut GraphBuilder) -> Result<(), String> {
        let aliases = graph.aliases().clone();
        let mut resolved = std::collections::BTreeMap::new();

        for (alias, mut target) in aliases.clone() {
            let mut hops = 0;
            while let Some(next) = aliases.get(&target) {
                target = next.clone();
                hops += 1;
                if hops > aliases.len() {
                    return Err(format!("alias cycle involving '{alias}'"));
                }
            }
            if !graph.definitions().contains_key(&target) {
                return Err(format!(
                    "alias '{alias}' points at unknown component '{target}'"
                ));
            }
            resolved.insert(alias, target);
        }

        let count = resolved.len();
        graph.replace_aliases(resolved);
        graph.log(format!("resolve-aliases: flattened {count} aliases"));
        Ok(())
    }
}

/// Checks that every `Value::Ref` names a known definition or alias.
pub(crate) struct ValidateReferencesPass;

impl CompilerPass for ValidateReferencesPass {
    fn name(&self) -> &str {
        "validate-references"
    }

    fn process(&self, graph: &mut GraphBuilder) -> Result<(), String> {
        let mut bad: Option<(String, String)> = None;

        for (id, def) in graph.definitions() {
            def.for_each_ref(&mut |target| {
                let known = graph.definitions().contains_key(target)
                    || graph.aliases().contains_key(target);
                if !known && bad.is_none() {
                    bad = Some((id.clone(), target.to_string()));
                }
            });
        }

        if let Some((owner, target)) = bad {
            return Err(format!(
                "component '{owner}' references unknown component '{target}'"
            ));
        }

        let count = graph.definitions().len();
        graph.log(format!("validate-references: checked {count} definitions"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Definition;
    use crate::value::Value;

    #[test]
    fn pass_order_sorts_before_optimization_first() {
        assert!(PassOrder::BeforeOptimization < PassOrder::Optimization);
    }

    #[test]
    fn resolve_aliases_flattens_chains() {
        let mut graph = GraphBuilder::new();
        graph.register("real", Definition::new("factory"));
        graph.alias("a", "b");
        graph.alias("b", "real");

        ResolveAliasesPass.process(&mut graph).unwrap();
        assert_eq!(graph.aliases().get("a").map(String::as_str), Some("real"));
        assert_eq!(graph.aliases().get("b").map(String::as_str), Some("real"));
    }

    #[test]
    fn resolve_aliases_rejects_dangling() {
        let mut graph = GraphBuilder::new();
        graph.alias("a", "missing");

        let err = ResolveAliasesPass.process(&mut graph).unwrap_err();
        assert!(err.contains("unknown component 'missing'"));
    }

    #[test]
    fn resolve_aliases_rejects_cycles() {
        let mut graph = GraphBuilder::new();
        graph.alias("a", "b");
        graph.alias("b", "a");

        let err = ResolveAliasesPass.process(&mut graph).unwrap_err();
        assert!(err.contains("cycle"));
    }

    #[test]
    fn validate_references_accepts_known_targets() {
        let mut graph = GraphBuilder::new();
        graph.register("dep", Definition::new("f"));
        graph.register(
            "user",
            Definition::new("g").with_argument(Value::Ref("dep".to_string())),
        );

        assert!(ValidateReferencesPass.process(&mut graph).is_ok());
    }

    #[test]
    fn validate_references_accepts_alias_targets() {
        let mut graph = GraphBuilder::new();
        graph.register("dep", Definition::new("f"));
        graph.alias("dep_alias", "dep");
        graph.register(
            "user",
            Definition::new("g").with_argument(Value::Ref("dep_alias".to_string())),
        );

        assert!(ValidateReferencesPass.process(&mut graph).is_ok());
    }

    #[test]
    fn validate_references_rejects_unknown_targets() {
        let mut graph = GraphBuilder::new();
        graph.register(
            "user",
            Definition::new("g").with_argument(Value::Ref("ghost".to_string())),
        );

        let err = ValidateReferencesPass.process(&mut graph).unwrap_err();
        assert!(err.contains("'user'"));
        assert!(err.contains("'ghost'"));
    }
}
