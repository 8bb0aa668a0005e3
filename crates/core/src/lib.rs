//! Model and attribute validation engine for the ormlet ORM core.
//!
//! Pure logic: model definitions declare per-attribute validation rules and
//! model-wide validators; instances snapshot attribute values and are checked
//! with [`Instance::validate`]. No database or I/O dependencies.

pub mod error;
pub mod instance;
pub mod model;
pub mod types;
pub mod validation;

pub use error::DefinitionError;
pub use instance::Instance;
pub use model::{AttributeDef, ModelBuilder, ModelDefinition};
pub use types::{AttributeType, AttributeValues};
pub use validation::evaluator::ValidationErrors;
pub use validation::registry::RuleRegistry;
pub use validation::spec::RuleSpec;
