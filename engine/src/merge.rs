//! Structural deep merge over JSON values.

use serde_json::{Map, Value};

/// Merge `source` into `target`.
///
/// - object + object: keys merge recursively, new keys are cloned in
/// - array + array: elements merge by index, extra source elements are appended
/// - array + object: index keys (`"0"`, `"1"`, ...) merge into the matching
///   element, padding with `null`; other keys are dropped
/// - anything else: `target` is replaced by a clone of `source`
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_maps(target, source),
        (Value::Array(target), Value::Array(source)) => {
            for (i, item) in source.iter().enumerate() {
                match target.get_mut(i) {
                    Some(existing) => deep_merge(existing, item),
                    None => target.push(item.clone()),
                }
            }
        }
        (Value::Array(target), Value::Object(source)) => {
            for (key, value) in source {
                let Some(i) = array_index(key) else {
                    continue;
                };
                if i >= target.len() {
                    target.resize(i + 1, Value::Null);
                }
                deep_merge(&mut target[i], value);
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Canonical decimal index (`"0"`, `"12"`, not `"01"` or `"+1"`).
fn array_index(key: &str) -> Option<usize> {
    key.parse::<usize>().ok().filter(|i| i.to_string() == key)
}

/// Merge every key of `source` into `target`.
pub fn merge_maps(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        merge_key(target, key, value);
    }
}

/// Merge a single `key: value` pair into `target`.
pub fn merge_key(target: &mut Map<String, Value>, key: &str, value: &Value) {
    match target.get_mut(key) {
        Some(existing) => deep_merge(existing, value),
        None => {
            target.insert(key.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_objects_merge_recursively() {
        let mut target = json!({"a": {"b": 1, "c": 2}, "x": true});
        deep_merge(&mut target, &json!({"a": {"c": 3, "d": 4}}));
        assert_eq!(target, json!({"a": {"b": 1, "c": 3, "d": 4}, "x": true}));
    }

    #[test]
    fn test_arrays_merge_by_index() {
        let mut target = json!([1, {"a": 1}, 3]);
        deep_merge(&mut target, &json!([9, {"b": 2}]));
        assert_eq!(target, json!([9, {"a": 1, "b": 2}, 3]));

        let mut short = json!([1]);
        deep_merge(&mut short, &json!([7, 8, 9]));
        assert_eq!(short, json!([7, 8, 9]));
    }

    #[test]
    fn test_object_merges_into_array_by_index() {
        let mut target = json!(["x", {"a": 1}]);
        deep_merge(&mut target, &json!({"1": {"b": 2}, "0": "y"}));
        assert_eq!(target, json!(["y", {"a": 1, "b": 2}]));

        let mut padded = json!([1]);
        deep_merge(&mut padded, &json!({"3": 4, "name": "dropped", "01": 5}));
        assert_eq!(padded, json!([1, null, null, 4]));
    }

    #[test]
    fn test_scalars_are_overwritten() {
        let mut target = json!({"a": {"b": 1}});
        deep_merge(&mut target, &json!({"a": "flat"}));
        assert_eq!(target, json!({"a": "flat"}));

        deep_merge(&mut target, &json!({"a": null}));
        assert_eq!(target, json!({"a": null}));
    }

    #[test]
    fn test_source_is_not_aliased() {
        let source = json!({"nested": {"k": 1}});
        let mut target = json!({});
        deep_merge(&mut target, &source);
        target["nested"]["k"] = json!(2);
        assert_eq!(source["nested"]["k"], json!(1));
    }
}
