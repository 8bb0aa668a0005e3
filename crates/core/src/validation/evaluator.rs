//! Validation engine — pure logic over a definition and a value snapshot.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::model::{CheckKind, CompiledAttributeCheck, ModelDefinition};
use crate::types::{AttributeValues, NULL};

/// Aggregated failure messages, keyed by attribute name or model-wide
/// validator name.
///
/// A key is present iff at least one check attached to it failed; its
/// messages appear in check-declaration order. Cross-key iteration order is
/// key-sorted, not declaration-ordered, and is not part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    fn push(&mut self, key: &str, message: String) {
        self.0.entry(key.to_string()).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Failure messages for one key, in declaration order.
    pub fn messages(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl IntoIterator for ValidationErrors {
    type Item = (String, Vec<String>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Evaluate every applicable check of `model` against `values`.
///
/// Per attribute, in declaration order: a null value under `allow_null`
/// skips the attribute's checks entirely; otherwise each check runs in
/// order and contributes one message per failure. Model-wide validators
/// then always run against the full value map. Returns `None` when nothing
/// failed.
pub(crate) fn validate_instance(
    model: &ModelDefinition,
    values: &AttributeValues,
) -> Option<ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for attribute in model.attributes() {
        let value = values.get(&attribute.name).unwrap_or(&NULL);
        if value.is_null() && attribute.allow_null {
            continue;
        }
        for check in &attribute.checks {
            if let Some(message) = run_check(check, value) {
                errors.push(&attribute.name, message);
            }
        }
    }

    for (name, check) in model.model_checks() {
        if let Err(message) = check.as_ref()(values) {
            errors.push(name, message);
        }
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

fn run_check(check: &CompiledAttributeCheck, value: &Value) -> Option<String> {
    match &check.kind {
        CheckKind::Rule(rule) => {
            if rule.eval(value) {
                None
            } else {
                Some(
                    check
                        .msg
                        .clone()
                        .unwrap_or_else(|| default_message(&check.name)),
                )
            }
        }
        // Custom predicates signal failure through Err; the message stops
        // here and becomes plain data.
        CheckKind::Predicate(predicate) => predicate.as_ref()(value).err(),
    }
}

fn default_message(rule: &str) -> String {
    format!("{rule} failed")
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::model::{AttributeDef, ModelDefinition};
    use crate::types::{AttributeType, AttributeValues};
    use crate::validation::spec::RuleSpec;

    fn values(pairs: &[(&str, Value)]) -> AttributeValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn allow_null_skips_every_check_including_predicates() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("age", AttributeType::Integer)
                    .allow_null(true)
                    .rule("min", RuleSpec::arg(0).msg("must be positive"))
                    .check("neverNull", |_| Err("predicate ran".to_string())),
            )
            .build()
            .unwrap();

        assert!(model
            .build(values(&[("age", Value::Null)]))
            .validate()
            .is_none());
    }

    #[test]
    fn allow_null_does_not_soften_non_null_failures() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("age", AttributeType::Integer)
                    .allow_null(true)
                    .rule("min", RuleSpec::arg(0).msg("must be positive")),
            )
            .build()
            .unwrap();

        let errors = model.build(values(&[("age", json!(-1))])).validate().unwrap();
        assert_eq!(
            errors.messages("age"),
            Some(&["must be positive".to_string()][..])
        );

        assert!(model.build(values(&[("age", json!(1))])).validate().is_none());
    }

    #[test]
    fn missing_attribute_reads_as_null() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("notNull", RuleSpec::none().msg("name is required")),
            )
            .build()
            .unwrap();

        let errors = model.build(AttributeValues::new()).validate().unwrap();
        assert_eq!(
            errors.messages("name"),
            Some(&["name is required".to_string()][..])
        );
    }

    #[test]
    fn failures_keep_declaration_order_within_one_attribute() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("len", RuleSpec::args([json!(5), json!(10)]).msg("too short"))
                    .rule("isUppercase", RuleSpec::none().msg("not shouting"))
                    .rule("contains", RuleSpec::arg("!").msg("no excitement")),
            )
            .build()
            .unwrap();

        let errors = model.build(values(&[("name", json!("hey"))])).validate().unwrap();
        assert_eq!(
            errors.messages("name"),
            Some(
                &[
                    "too short".to_string(),
                    "not shouting".to_string(),
                    "no excitement".to_string(),
                ][..]
            )
        );
    }

    #[test]
    fn custom_predicate_failure_message_is_the_err_text() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String).check("customFn", |value| {
                    if value == &json!("2") {
                        Ok(())
                    } else {
                        Err("name should equal '2'".to_string())
                    }
                }),
            )
            .build()
            .unwrap();

        let errors = model.build(values(&[("name", json!("3"))])).validate().unwrap();
        assert_eq!(
            errors.messages("name"),
            Some(&["name should equal '2'".to_string()][..])
        );

        assert!(model.build(values(&[("name", json!("2"))])).validate().is_none());
    }

    #[test]
    fn model_wide_validators_always_run() {
        let model = ModelDefinition::builder("Foo")
            .attribute(AttributeDef::new("field1", AttributeType::Integer).allow_null(true))
            .attribute(AttributeDef::new("field2", AttributeType::Integer).allow_null(true))
            .model_check("xnor", |values| {
                let field1 = values.get("field1").map_or(true, Value::is_null);
                let field2 = values.get("field2").map_or(true, Value::is_null);
                if field1 == field2 {
                    Err("xnor failed".to_string())
                } else {
                    Ok(())
                }
            })
            .build()
            .unwrap();

        let errors = model
            .build(values(&[("field1", Value::Null), ("field2", Value::Null)]))
            .validate()
            .unwrap();
        assert_eq!(errors.messages("xnor"), Some(&["xnor failed".to_string()][..]));
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["xnor"]);

        assert!(model
            .build(values(&[("field1", json!(33)), ("field2", Value::Null)]))
            .validate()
            .is_none());
    }

    #[test]
    fn default_message_names_the_rule() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("isEmail", RuleSpec::none()),
            )
            .build()
            .unwrap();

        let errors = model.build(values(&[("name", json!("a"))])).validate().unwrap();
        assert_eq!(
            errors.messages("name"),
            Some(&["isEmail failed".to_string()][..])
        );
    }

    #[test]
    fn validate_is_idempotent() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("notEmpty", RuleSpec::none().msg("blank")),
            )
            .build()
            .unwrap();

        let instance = model.build(values(&[("name", json!("   "))]));
        assert_eq!(instance.validate(), instance.validate());
    }

    #[test]
    fn accessors_iterate_sorted_keys_with_their_messages() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("notEmpty", RuleSpec::none().msg("blank")),
            )
            .attribute(
                AttributeDef::new("age", AttributeType::Integer)
                    .rule("min", RuleSpec::arg(0).msg("too young")),
            )
            .build()
            .unwrap();

        let errors = model
            .build(values(&[("name", json!("")), ("age", json!(-1))]))
            .validate()
            .unwrap();

        let pairs: Vec<_> = errors.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("age", &["too young".to_string()][..]),
                ("name", &["blank".to_string()][..]),
            ]
        );

        let map = errors.clone().into_inner();
        assert_eq!(map["age"], vec!["too young".to_string()]);

        let owned: Vec<(String, Vec<String>)> = errors.into_iter().collect();
        assert_eq!(owned[0], ("age".to_string(), vec!["too young".to_string()]));
    }

    #[test]
    fn result_serializes_to_field_keyed_json() {
        let model = ModelDefinition::builder("User")
            .attribute(
                AttributeDef::new("name", AttributeType::String)
                    .rule("notEmpty", RuleSpec::none().msg("blank")),
            )
            .build()
            .unwrap();

        let errors = model.build(values(&[("name", json!(""))])).validate().unwrap();
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "name": ["blank"] })
        );
    }
}
