#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("Unknown validation rule `{rule}` on attribute `{attribute}`")]
    UnknownRule { attribute: String, rule: String },

    #[error("Invalid arguments for rule `{rule}` on attribute `{attribute}`: {reason}")]
    InvalidRuleArgs {
        attribute: String,
        rule: String,
        reason: String,
    },

    #[error("Cannot register rule `{0}`: name is reserved by a built-in rule")]
    ReservedRule(String),

    #[error("Duplicate attribute `{0}` in model definition")]
    DuplicateAttribute(String),
}
