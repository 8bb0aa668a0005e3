//! Declared rule configuration: argument forms and message overrides.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The declared configuration for one rule on one attribute.
///
/// Rules accept three declaration shapes, all normalized to one internal
/// form before dispatch:
///
/// - [`RuleSpec::NoArgs`] — the rule runs with no arguments (`{}` in JSON);
/// - [`RuleSpec::Args`] — shorthand: a bare scalar becomes the sole
///   positional argument, a bare array becomes the positional argument list;
/// - [`RuleSpec::Spec`] — structured: `{args, msg}`, where `msg` overrides
///   the rule's default failure message.
///
/// `Spec { args, msg: None }` and `Args(args)` are interchangeable.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleSpec {
    NoArgs,
    Args(Vec<Value>),
    Spec {
        args: Vec<Value>,
        msg: Option<String>,
    },
}

impl RuleSpec {
    /// Spec with no arguments and no message override.
    pub fn none() -> Self {
        RuleSpec::NoArgs
    }

    /// Shorthand spec with a single positional argument.
    pub fn arg(value: impl Into<Value>) -> Self {
        RuleSpec::Args(vec![value.into()])
    }

    /// Shorthand spec with a positional argument list.
    pub fn args(values: impl IntoIterator<Item = Value>) -> Self {
        RuleSpec::Args(values.into_iter().collect())
    }

    /// Attach a message override, converting to the structured form.
    pub fn msg(self, message: impl Into<String>) -> Self {
        let (args, _) = self.into_parts();
        RuleSpec::Spec {
            args,
            msg: Some(message.into()),
        }
    }

    /// Normalize to the internal `(args, msg)` shape.
    pub(crate) fn into_parts(self) -> (Vec<Value>, Option<String>) {
        match self {
            RuleSpec::NoArgs => (Vec::new(), None),
            RuleSpec::Args(args) => (args, None),
            RuleSpec::Spec { args, msg } => (args, msg),
        }
    }

    /// Borrowing view of the normalized positional arguments.
    pub fn positional_args(&self) -> &[Value] {
        match self {
            RuleSpec::NoArgs => &[],
            RuleSpec::Args(args) => args,
            RuleSpec::Spec { args, .. } => args,
        }
    }

    /// The message override, if declared.
    pub fn message_override(&self) -> Option<&str> {
        match self {
            RuleSpec::Spec { msg, .. } => msg.as_deref(),
            _ => None,
        }
    }

    /// Interpret a JSON value as a rule spec.
    ///
    /// Objects carrying `args` and/or `msg` are the structured form; the
    /// empty object and `null` mean no arguments; anything else is the bare
    /// shorthand.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => RuleSpec::NoArgs,
            Value::Object(map) if map.is_empty() => RuleSpec::NoArgs,
            Value::Object(map) => {
                let args = match map.get("args") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items.clone(),
                    Some(single) => vec![single.clone()],
                };
                let msg = map
                    .get("msg")
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned);
                RuleSpec::Spec { args, msg }
            }
            Value::Array(items) => RuleSpec::Args(items),
            scalar => RuleSpec::Args(vec![scalar]),
        }
    }

    /// Render back to the natural JSON shape.
    pub fn to_value(&self) -> Value {
        match self {
            RuleSpec::NoArgs => Value::Object(serde_json::Map::new()),
            RuleSpec::Args(args) if args.len() == 1 => args[0].clone(),
            RuleSpec::Args(args) => Value::Array(args.clone()),
            RuleSpec::Spec { args, msg } => {
                let mut map = serde_json::Map::new();
                if !args.is_empty() {
                    map.insert("args".into(), Value::Array(args.clone()));
                }
                if let Some(msg) = msg {
                    map.insert("msg".into(), Value::String(msg.clone()));
                }
                Value::Object(map)
            }
        }
    }
}

impl Serialize for RuleSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RuleSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(RuleSpec::from_value(Value::deserialize(deserializer)?))
    }
}
