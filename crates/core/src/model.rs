//! Model definitions: attributes, their declared checks, and the
//! definition-time configuration pass.
//!
//! Definitions are built once, checked for configuration defects in
//! [`ModelBuilder::build`], and immutable afterwards, so concurrent
//! validation of distinct instances needs no locking.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::error::DefinitionError;
use crate::instance::Instance;
use crate::types::{AttributeType, AttributeValues};
use crate::validation::registry::{CompiledCheck, RuleRegistry};
use crate::validation::spec::RuleSpec;

/// A custom per-attribute predicate. Failure is signalled by `Err` with the
/// failure text; the engine converts it into a plain message, never a panic
/// or an escaping error.
pub type AttributeCheck = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// A model-wide validator. Receives the full attribute-value map as an
/// explicit parameter; on `Err`, the message lands under the validator's
/// own name in the result.
pub type ModelCheck = Arc<dyn Fn(&AttributeValues) -> Result<(), String> + Send + Sync>;

/// One attribute under definition: name, type tag, null policy, and an
/// ordered list of named checks.
pub struct AttributeDef {
    name: String,
    kind: AttributeType,
    allow_null: bool,
    checks: Vec<(String, DeclaredCheck)>,
}

enum DeclaredCheck {
    Rule(RuleSpec),
    Predicate(AttributeCheck),
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            name: name.into(),
            kind,
            allow_null: false,
            checks: Vec::new(),
        }
    }

    /// Whether a null value skips every check on this attribute.
    /// Defaults to `false`.
    pub fn allow_null(mut self, allow: bool) -> Self {
        self.allow_null = allow;
        self
    }

    /// Declare a named rule. Resolved against the rule registry when the
    /// model is built; declaration order is failure-message order.
    pub fn rule(mut self, name: impl Into<String>, spec: RuleSpec) -> Self {
        self.checks.push((name.into(), DeclaredCheck::Rule(spec)));
        self
    }

    /// Declare a named custom predicate for this attribute.
    pub fn check<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.checks
            .push((name.into(), DeclaredCheck::Predicate(Arc::new(predicate))));
        self
    }
}

/// Builder for a [`ModelDefinition`].
pub struct ModelBuilder {
    name: String,
    registry: RuleRegistry,
    attributes: Vec<AttributeDef>,
    model_checks: Vec<(String, ModelCheck)>,
}

impl ModelBuilder {
    /// Use a registry carrying caller-registered rules instead of the
    /// built-in-only default.
    pub fn registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare a named model-wide validator. These always run, regardless
    /// of per-attribute outcomes.
    pub fn model_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&AttributeValues) -> Result<(), String> + Send + Sync + 'static,
    {
        self.model_checks.push((name.into(), Arc::new(check)));
        self
    }

    /// Run the definition-time configuration pass and produce the immutable
    /// definition.
    ///
    /// Unknown rule names, malformed rule arguments, and duplicate attribute
    /// names all fail here, never at validation time.
    pub fn build(self) -> Result<ModelDefinition, DefinitionError> {
        let mut seen = HashSet::new();
        let mut attributes = Vec::with_capacity(self.attributes.len());

        for attribute in self.attributes {
            if !seen.insert(attribute.name.clone()) {
                return Err(DefinitionError::DuplicateAttribute(attribute.name));
            }

            let mut checks = Vec::with_capacity(attribute.checks.len());
            for (rule_name, declared) in attribute.checks {
                let compiled = match declared {
                    DeclaredCheck::Rule(spec) => {
                        let (args, msg) = spec.into_parts();
                        let check = self.registry.resolve(&attribute.name, &rule_name, &args)?;
                        CompiledAttributeCheck {
                            name: rule_name,
                            msg,
                            kind: CheckKind::Rule(check),
                        }
                    }
                    DeclaredCheck::Predicate(predicate) => CompiledAttributeCheck {
                        name: rule_name,
                        msg: None,
                        kind: CheckKind::Predicate(predicate),
                    },
                };
                checks.push(compiled);
            }

            attributes.push(CompiledAttribute {
                name: attribute.name,
                kind: attribute.kind,
                allow_null: attribute.allow_null,
                checks,
            });
        }

        Ok(ModelDefinition {
            name: self.name,
            attributes,
            model_checks: self.model_checks,
        })
    }
}

/// An immutable, definition-checked model: the unit the validation engine
/// runs against.
pub struct ModelDefinition {
    name: String,
    attributes: Vec<CompiledAttribute>,
    model_checks: Vec<(String, ModelCheck)>,
}

impl ModelDefinition {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            registry: RuleRegistry::new(),
            attributes: Vec::new(),
            model_checks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot current values into a disposable instance. Attributes
    /// missing from `values` read as null.
    pub fn build(&self, values: AttributeValues) -> Instance<'_> {
        Instance::new(self, values)
    }

    pub(crate) fn attributes(&self) -> &[CompiledAttribute] {
        &self.attributes
    }

    pub(crate) fn model_checks(&self) -> &[(String, ModelCheck)] {
        &self.model_checks
    }
}

impl std::fmt::Debug for ModelDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("name", &self.name)
            .field(
                "attributes",
                &self
                    .attributes
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field(
                "model_checks",
                &self
                    .model_checks
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

pub(crate) struct CompiledAttribute {
    pub(crate) name: String,
    #[allow(dead_code)] // informational type tag; the engine never branches on it
    pub(crate) kind: AttributeType,
    pub(crate) allow_null: bool,
    pub(crate) checks: Vec<CompiledAttributeCheck>,
}

pub(crate) struct CompiledAttributeCheck {
    pub(crate) name: String,
    pub(crate) msg: Option<String>,
    pub(crate) kind: CheckKind,
}

pub(crate) enum CheckKind {
    Rule(CompiledCheck),
    Predicate(AttributeCheck),
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_rule_fails_at_definition_time() {
        let result = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("isSockPuppet", RuleSpec::none()),
            )
            .build();
        assert_matches!(result, Err(DefinitionError::UnknownRule { .. }));
    }

    #[test]
    fn malformed_arguments_fail_at_definition_time() {
        let result = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("len", RuleSpec::arg(2)),
            )
            .build();
        assert_matches!(
            result,
            Err(DefinitionError::InvalidRuleArgs { ref rule, .. }) if rule == "len"
        );
    }

    #[test]
    fn duplicate_attributes_are_rejected() {
        let result = ModelDefinition::builder("User")
            .attribute(AttributeDef::new("name", AttributeType::String))
            .attribute(AttributeDef::new("name", AttributeType::Text))
            .build();
        assert_matches!(result, Err(DefinitionError::DuplicateAttribute(ref a)) if a == "name");
    }

    #[test]
    fn registered_rules_are_resolvable() {
        let mut registry = RuleRegistry::new();
        registry
            .register("isEven", |value, _| value.as_i64().is_some_and(|n| n % 2 == 0))
            .unwrap();

        let model = ModelDefinition::builder("Counter")
            .registry(registry)
            .attribute(
                AttributeDef::new("count", AttributeType::Integer)
                    .rule("isEven", RuleSpec::none().msg("count must be even")),
            )
            .build()
            .unwrap();

        let mut values = AttributeValues::new();
        values.insert("count".into(), json!(3));
        let errors = model.build(values).validate().unwrap();
        assert_eq!(
            errors.messages("count"),
            Some(&["count must be even".to_string()][..])
        );
    }

    #[test]
    fn debug_output_names_attributes_and_model_checks() {
        let model = ModelDefinition::builder("User")
            .attribute(AttributeDef::new("name", AttributeType::String))
            .model_check("xnor", |_| Ok(()))
            .build()
            .unwrap();

        let rendered = format!("{model:?}");
        assert!(rendered.contains("User"));
        assert!(rendered.contains("name"));
        assert!(rendered.contains("xnor"));
    }

    #[test]
    fn well_formed_definition_builds() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("len", RuleSpec::args([json!(2), json!(40)]))
                    .rule("isAlpha", RuleSpec::none()),
            )
            .build()
            .unwrap();
        assert_eq!(model.name(), "User");
    }
}
