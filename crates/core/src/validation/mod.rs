//! Attribute validation engine.
//!
//! Rule argument specs, the built-in rule catalog with its registry and
//! extension point, and the evaluator that aggregates failures per key.

pub(crate) mod builtins;
pub mod evaluator;
pub mod registry;
pub mod spec;
