use serde::{Deserialize, Serialize};

/// Current attribute values of one instance, keyed by attribute name.
pub type AttributeValues = serde_json::Map<String, serde_json::Value>;

/// Shared null sentinel: attributes missing from a value map read as null.
pub(crate) static NULL: serde_json::Value = serde_json::Value::Null;

/// Declared storage type of an attribute.
///
/// Informational only: the persistence layer maps it to a column type, but
/// the validation engine never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Text,
    Integer,
    BigInt,
    Float,
    Boolean,
    Date,
    Array,
    Json,
}
