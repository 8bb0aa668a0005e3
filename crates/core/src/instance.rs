//! Per-call value snapshots.

use serde_json::Value;

use crate::model::ModelDefinition;
use crate::types::{AttributeValues, NULL};
use crate::validation::evaluator::{self, ValidationErrors};

/// A read-only snapshot of attribute values bound to its model definition.
///
/// Instances are disposable: build one, validate it, drop it. Validation
/// never mutates the values and caches nothing across calls.
pub struct Instance<'m> {
    model: &'m ModelDefinition,
    values: AttributeValues,
}

impl<'m> Instance<'m> {
    pub(crate) fn new(model: &'m ModelDefinition, values: AttributeValues) -> Self {
        Self { model, values }
    }

    pub fn model(&self) -> &ModelDefinition {
        self.model
    }

    /// Current value of one attribute; missing attributes read as null.
    pub fn get(&self, attribute: &str) -> &Value {
        self.values.get(attribute).unwrap_or(&NULL)
    }

    pub fn values(&self) -> &AttributeValues {
        &self.values
    }

    /// Run every applicable check and aggregate failures per key.
    ///
    /// Returns `None` when the instance is valid. Repeated calls on an
    /// unmodified instance return structurally equal results.
    pub fn validate(&self) -> Option<ValidationErrors> {
        evaluator::validate_instance(self.model, &self.values)
    }
}
