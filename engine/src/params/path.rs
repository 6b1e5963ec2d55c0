//! Dotted field paths.
//!
//! A [`FieldPath`] is parsed once from a string like `a.b.c` and then used to
//! read or write nested values in a JSON document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::PathError;

/// Segment separator.
pub const SEPARATOR: char = '.';

/// A validated, non-empty sequence of non-empty path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path, rejecting empty paths and empty segments.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = raw.split(SEPARATOR).map(str::to_string).collect();
        if let Some(position) = segments.iter().position(|s| s.is_empty()) {
            return Err(PathError::EmptySegment {
                path: raw.to_string(),
                position,
            });
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Build the nested skeleton `{s0: {s1: {... : value}}}`.
    pub fn nest(&self, value: Value) -> Value {
        self.segments.iter().rev().fold(value, |inner, segment| {
            let mut map = Map::new();
            map.insert(segment.clone(), inner);
            Value::Object(map)
        })
    }

    /// Look up the value at this path.
    ///
    /// Numeric segments index into arrays.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Write `value` at this path, creating intermediate objects.
    ///
    /// Numeric segments index into existing arrays, padding them with
    /// `null`. Any other non-object intermediate (and a non-object root)
    /// is replaced by an empty object.
    pub fn set(&self, root: &mut Value, value: Value) {
        if self.segments.is_empty() {
            return;
        }

        let mut current = root;
        for segment in &self.segments {
            current = child_mut(current, segment);
        }
        *current = value;
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = match value {
        Value::Array(_) => segment.parse::<usize>().ok(),
        _ => None,
    };

    match (value, index) {
        (Value::Array(items), Some(i)) => {
            if i >= items.len() {
                items.resize(i + 1, Value::Null);
            }
            &mut items[i]
        }
        (value, _) => ensure_object(value).entry(segment.to_string()).or_insert(Value::Null),
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_segments() {
        let path = FieldPath::parse("a.b.c").unwrap();
        assert_eq!(path.segments(), &["a", "b", "c"]);
        assert_eq!(path.to_string(), "a.b.c");
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            FieldPath::parse("a..b"),
            Err(PathError::EmptySegment { position: 1, .. })
        ));
        assert!(FieldPath::parse(".a").is_err());
        assert!(FieldPath::parse("a.").is_err());
    }

    #[test]
    fn test_nest() {
        let path = FieldPath::parse("a.b.c").unwrap();
        assert_eq!(path.nest(json!(5)), json!({"a": {"b": {"c": 5}}}));
    }

    #[test]
    fn test_get_through_arrays() {
        let data = json!({"rows": [{"id": 1}, {"id": 2}]});
        let path = FieldPath::parse("rows.1.id").unwrap();
        assert_eq!(path.get(&data), Some(&json!(2)));
        assert_eq!(FieldPath::parse("rows.9.id").unwrap().get(&data), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut data = json!({"a": 1});
        FieldPath::parse("b.c").unwrap().set(&mut data, json!("x"));
        assert_eq!(data, json!({"a": 1, "b": {"c": "x"}}));

        FieldPath::parse("a.d").unwrap().set(&mut data, json!(true));
        assert_eq!(data["a"], json!({"d": true}));
    }

    #[test]
    fn test_set_indexes_into_arrays() {
        let mut data = json!({"rows": [{"id": 1}, {"id": 2}]});
        FieldPath::parse("rows.0.items").unwrap().set(&mut data, json!([1]));
        assert_eq!(data, json!({"rows": [{"id": 1, "items": [1]}, {"id": 2}]}));

        FieldPath::parse("rows.3").unwrap().set(&mut data, json!("z"));
        assert_eq!(data["rows"][2], Value::Null);
        assert_eq!(data["rows"][3], json!("z"));

        FieldPath::parse("rows.name").unwrap().set(&mut data, json!(1));
        assert_eq!(data["rows"], json!({"name": 1}));
    }

    #[test]
    fn test_deserialize_validates() {
        let path: FieldPath = serde_json::from_value(json!("user.name")).unwrap();
        assert_eq!(path.segments(), &["user", "name"]);
        assert!(serde_json::from_value::<FieldPath>(json!("a..b")).is_err());
        assert_eq!(serde_json::to_value(&path).unwrap(), json!("user.name"));
    }
}
