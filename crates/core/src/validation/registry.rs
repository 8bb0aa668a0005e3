//! Rule registry: built-in dispatch plus caller-registered named rules.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::DefinitionError;
use crate::validation::builtins::{Builtin, BUILTIN_NAMES};

/// A caller-registered rule: a pure predicate over the attribute value and
/// the declared positional arguments.
pub type RuleFn = Arc<dyn Fn(&Value, &[Value]) -> bool + Send + Sync>;

/// Resolves rule names to executable checks at model-definition time.
///
/// Built-in rules are fixed; [`RuleRegistry::register`] adds named rules on
/// top of the catalog. Unknown names are definition errors, never a silent
/// pass.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    registered: HashMap<String, RuleFn>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is a built-in rule.
    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_NAMES.contains(&name)
    }

    /// Register a named rule alongside the built-in catalog.
    ///
    /// Built-in names cannot be shadowed; re-registering a previously
    /// registered name replaces it. Registered rules receive the raw
    /// positional arguments and perform their own argument handling.
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F) -> Result<(), DefinitionError>
    where
        F: Fn(&Value, &[Value]) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        if Self::is_builtin(&name) {
            return Err(DefinitionError::ReservedRule(name));
        }
        self.registered.insert(name, Arc::new(rule));
        Ok(())
    }

    /// Resolve one declared rule into a compiled check.
    ///
    /// Performs the definition-time configuration pass: unknown names and
    /// malformed arguments surface here, not during validation.
    pub(crate) fn resolve(
        &self,
        attribute: &str,
        rule: &str,
        args: &[Value],
    ) -> Result<CompiledCheck, DefinitionError> {
        if let Some(compiled) = Builtin::compile(rule, args) {
            return compiled.map(CompiledCheck::Builtin).map_err(|reason| {
                DefinitionError::InvalidRuleArgs {
                    attribute: attribute.to_string(),
                    rule: rule.to_string(),
                    reason,
                }
            });
        }
        if let Some(registered) = self.registered.get(rule) {
            return Ok(CompiledCheck::Registered {
                rule: registered.clone(),
                args: args.to_vec(),
            });
        }
        Err(DefinitionError::UnknownRule {
            attribute: attribute.to_string(),
            rule: rule.to_string(),
        })
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("registered", &self.registered.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A rule resolved and argument-checked at definition time.
#[derive(Clone)]
pub(crate) enum CompiledCheck {
    Builtin(Builtin),
    Registered { rule: RuleFn, args: Vec<Value> },
}

impl CompiledCheck {
    pub(crate) fn eval(&self, value: &Value) -> bool {
        match self {
            CompiledCheck::Builtin(builtin) => builtin.eval(value),
            CompiledCheck::Registered { rule, args } => rule.as_ref()(value, args),
        }
    }
}

impl std::fmt::Debug for CompiledCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompiledCheck::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            CompiledCheck::Registered { args, .. } => f
                .debug_struct("Registered")
                .field("args", args)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn resolves_builtin_rules() {
        let registry = RuleRegistry::new();
        let check = registry.resolve("name", "isEmail", &[]).unwrap();
        assert!(check.eval(&json!("abc@abc.com")));
        assert!(!check.eval(&json!("a")));
    }

    #[test]
    fn unknown_rule_is_a_definition_error() {
        let registry = RuleRegistry::new();
        assert_matches!(
            registry.resolve("name", "isSockPuppet", &[]),
            Err(DefinitionError::UnknownRule { .. })
        );
    }

    #[test]
    fn bad_arguments_are_a_definition_error() {
        let registry = RuleRegistry::new();
        assert_matches!(
            registry.resolve("name", "len", &[json!(2)]),
            Err(DefinitionError::InvalidRuleArgs { .. })
        );
    }

    #[test]
    fn registered_rules_resolve_with_their_arguments() {
        let mut registry = RuleRegistry::new();
        registry
            .register("isEven", |value, _args| {
                value.as_i64().is_some_and(|n| n % 2 == 0)
            })
            .unwrap();

        let check = registry.resolve("count", "isEven", &[]).unwrap();
        assert!(check.eval(&json!(4)));
        assert!(!check.eval(&json!(3)));
    }

    #[test]
    fn compiled_checks_are_debuggable() {
        let mut registry = RuleRegistry::new();
        registry.register("isEven", |_, _| true).unwrap();

        let builtin = registry.resolve("name", "isEmail", &[]).unwrap();
        assert!(format!("{builtin:?}").contains("Builtin"));

        let registered = registry.resolve("count", "isEven", &[json!(2)]).unwrap();
        assert!(format!("{registered:?}").contains("Registered"));
    }

    #[test]
    fn builtin_names_cannot_be_shadowed() {
        let mut registry = RuleRegistry::new();
        assert_matches!(
            registry.register("isEmail", |_, _| true),
            Err(DefinitionError::ReservedRule(_))
        );
    }
}
