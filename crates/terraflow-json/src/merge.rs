//! Recursive merge of configuration documents
//!
//! Mappings merge key by key; any other value (scalar or array) replaces
//! what was there before. Arrays are never concatenated.

use crate::error::{JsonError, Result};
use serde_json::{Map, Value};

/// Fold `documents` left to right into a single document.
///
/// Every document must have a mapping root. Later documents win on
/// conflicting leaves; an empty input yields `{}`.
///
/// ```
/// use serde_json::json;
/// use terraflow_json::merge::deep_merge;
///
/// let merged = deep_merge([json!({"a": {"b": 1}}), json!({"a": {"c": 2}})]).unwrap();
/// assert_eq!(merged, json!({"a": {"b": 1, "c": 2}}));
/// ```
pub fn deep_merge<I>(documents: I) -> Result<Value>
where
    I: IntoIterator<Item = Value>,
{
    let mut result = Map::new();

    for (index, document) in documents.into_iter().enumerate() {
        match document {
            Value::Object(map) => merge_map(&mut result, map),
            other => {
                return Err(JsonError::invalid(format!(
                    "document #{} is not an object (found {})",
                    index,
                    kind(&other)
                )));
            }
        }
    }

    Ok(Value::Object(result))
}

/// Overlay `layer` onto `target` in place.
///
/// An object layer merges into an object target recursively. Anything else
/// replaces `target` wholesale.
pub fn merge_value(target: &mut Value, layer: Value) {
    match (target, layer) {
        (Value::Object(existing), Value::Object(map)) => merge_map(existing, map),
        (target, layer) => *target = layer,
    }
}

/// Merge the entries of `layer` into `target`.
pub fn merge_map(target: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

/// Human readable name of a JSON value's type, used in error messages
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
