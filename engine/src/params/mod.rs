//! Parameter expansion.
//!
//! Turns flat assignment strings into one deep-merged configuration object.
//! A long nested assignment such as:
//!
//! ```text
//! input.glob.body.aggs.device.aggs.plays.date_histogram.extended_bounds.min=2015-12-11
//! ```
//!
//! is split into a path and a value, and the path becomes a nested skeleton
//! holding the value:
//!
//! ```text
//! { "input": { "glob": { "body": { ... "extended_bounds": { "min": "2015-12-11" } ... } } } }
//! ```
//!
//! Every entry is expanded this way and the fragments are merged, in order,
//! over a clone of the defaults.
//!
//! ## Example
//!
//! ```rust
//! use paramflow::expand_parameters;
//! use serde_json::json;
//!
//! let merged = expand_parameters(&json!({}), &json!(["a.b=1", "a.c=2"]), None).unwrap();
//! assert_eq!(merged, json!({"a": {"b": 1, "c": 2}}));
//! ```

pub mod assignment;
pub mod path;
pub mod remap;

pub use assignment::{coerce_number, number_to_string, Assignment, Entry};
pub use path::FieldPath;
pub use remap::remap_keys;

use serde_json::{Map, Value};

use crate::error::{ExpandError, ExpandResult};
use crate::merge::{merge_key, merge_maps};

/// Token that stands for a literal `.` inside a key.
pub const DEFAULT_ESCAPE_TOKEN: &str = "___";

/// Expand `params` over `defaults`.
///
/// `params` is a single entry or an array of entries. String entries with
/// exactly one `=` are assignments; other strings are opaque literals; any
/// other value is used as an already-structured fragment. A missing or empty
/// `escape_token` means [`DEFAULT_ESCAPE_TOKEN`]. Neither input is
/// mutated.
///
/// # Errors
/// Returns an error when an assignment path has an empty segment, or when
/// `defaults` is not an object (`null` counts as `{}`).
pub fn expand_parameters(
    defaults: &Value,
    params: &Value,
    escape_token: Option<&str>,
) -> ExpandResult<Value> {
    expand_to_map(defaults, params, escape_token).map(Value::Object)
}

/// Same as [`expand_parameters`], returning the merged map itself.
pub fn expand_to_map(
    defaults: &Value,
    params: &Value,
    escape_token: Option<&str>,
) -> ExpandResult<Map<String, Value>> {
    let escape_token = match escape_token {
        Some(token) if !token.is_empty() => token,
        _ => DEFAULT_ESCAPE_TOKEN,
    };

    let mut merged = match defaults {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => return Err(ExpandError::InvalidDefaults(kind_of(other))),
    };

    for entry in normalize(params) {
        match Entry::from_value(entry.clone())? {
            Entry::Assignment(assignment) => {
                merge_fragment(&mut merged, &assignment.into_fragment(escape_token));
            }
            Entry::Literal(literal) => merge_literal(&mut merged, &literal),
            Entry::Fragment(fragment) => merge_fragment(&mut merged, &fragment),
        }
    }

    Ok(merged)
}

/// Expand entries given as plain strings, e.g. from the command line.
pub fn expand_assignments<S: AsRef<str>>(
    defaults: &Value,
    assignments: &[S],
    escape_token: Option<&str>,
) -> ExpandResult<Value> {
    let params = Value::Array(
        assignments
            .iter()
            .map(|s| Value::String(s.as_ref().to_string()))
            .collect(),
    );
    expand_parameters(defaults, &params, escape_token)
}

fn normalize(params: &Value) -> &[Value] {
    match params {
        Value::Array(items) => items,
        single => std::slice::from_ref(single),
    }
}

/// Merge one top-level fragment into the accumulator.
///
/// Arrays merge by index key; numbers, booleans and null contribute nothing.
fn merge_fragment(merged: &mut Map<String, Value>, fragment: &Value) {
    match fragment {
        Value::Object(map) => merge_maps(merged, map),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                merge_key(merged, &i.to_string(), item);
            }
        }
        Value::String(s) => merge_literal(merged, s),
        Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}

/// An opaque literal contributes its characters keyed by position.
fn merge_literal(merged: &mut Map<String, Value>, literal: &str) {
    for (i, c) in literal.chars().enumerate() {
        merge_key(merged, &i.to_string(), &Value::String(c.to_string()));
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
