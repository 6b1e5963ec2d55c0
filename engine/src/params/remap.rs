//! Recursive key renaming by literal substring substitution.

use serde_json::{Map, Value};

/// Rename every key containing `from` by replacing all occurrences with `to`,
/// at every depth of objects and arrays. Values are left untouched.
///
/// An empty `from` leaves the value unchanged.
pub fn remap_keys(value: &mut Value, from: &str, to: &str) {
    if from.is_empty() {
        return;
    }

    match value {
        Value::Object(map) => {
            let renamed: Map<String, Value> = std::mem::take(map)
                .into_iter()
                .map(|(key, mut inner)| {
                    remap_keys(&mut inner, from, to);
                    let key = if key.contains(from) { key.replace(from, to) } else { key };
                    (key, inner)
                })
                .collect();
            *map = renamed;
        }
        Value::Array(items) => {
            for item in items {
                remap_keys(item, from, to);
            }
        }
        _ => {}
    }
}
