//! `path=value` assignments and numeric coercion.

use serde_json::{Number, Value};

use super::path::FieldPath;
use super::remap::remap_keys;
use crate::error::{ExpandError, ExpandResult, PathError};

/// Character separating the path from the value.
pub const ASSIGN: char = '=';

/// 2^53: integers up to this magnitude are exact in an `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single parsed `path=value` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub path: FieldPath,
    pub value: Value,
}

impl Assignment {
    /// Parse an entry containing exactly one `=`.
    ///
    /// Returns `Ok(None)` when the entry has zero or several `=` characters:
    /// such entries are opaque literals, not assignments.
    pub fn parse(entry: &str) -> Result<Option<Self>, PathError> {
        let mut parts = entry.split(ASSIGN);
        let (path, raw) = match (parts.next(), parts.next(), parts.next()) {
            (Some(path), Some(raw), None) => (path, raw),
            _ => return Ok(None),
        };

        Ok(Some(Self {
            path: FieldPath::parse(path)?,
            value: coerce_number(raw),
        }))
    }

    /// Expand into a nested fragment, turning `escape_token` back into `.`
    /// inside every key.
    pub fn into_fragment(self, escape_token: &str) -> Value {
        let mut fragment = self.path.nest(self.value);
        remap_keys(&mut fragment, escape_token, ".");
        fragment
    }
}

/// One normalized expansion input.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// `path=value`
    Assignment(Assignment),
    /// A string that is not a single assignment, merged as-is.
    Literal(String),
    /// An already-structured value, merged as-is.
    Fragment(Value),
}

impl Entry {
    pub fn from_value(value: Value) -> ExpandResult<Self> {
        match value {
            Value::String(s) => match Assignment::parse(&s) {
                Ok(Some(assignment)) => Ok(Entry::Assignment(assignment)),
                Ok(None) => Ok(Entry::Literal(s)),
                Err(source) => Err(ExpandError::Path { assignment: s, source }),
            },
            other => Ok(Entry::Fragment(other)),
        }
    }
}

/// Convert `raw` to a number iff the number renders back to exactly `raw`.
///
/// `"42"` becomes `42`; `"042"`, `"3.0"`, `"+1"` and `""` stay strings.
pub fn coerce_number(raw: &str) -> Value {
    let parsed = match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => return Value::String(raw.to_string()),
    };

    if number_to_string(parsed) != raw {
        return Value::String(raw.to_string());
    }

    if parsed.fract() == 0.0 && parsed.abs() <= MAX_EXACT_INTEGER {
        Value::from(parsed as i64)
    } else {
        Number::from_f64(parsed)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string()))
    }
}

/// Render a number the way ECMAScript `Number.prototype.toString` does.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let sign = if n < 0.0 { "-" } else { "" };

    // Shortest round-trip digits, e.g. "4.2e1" or "1.5e-7".
    let scientific = format!("{:e}", n.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return n.to_string();
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let Ok(exponent) = exponent.parse::<i32>() else {
        return n.to_string();
    };

    let k = digits.len() as i32;
    let point = exponent + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let e = point - 1;
        let e_sign = if e >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, e_sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, e_sign, e.abs())
        }
    };

    format!("{}{}", sign, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coercion_round_trip_rule() {
        assert_eq!(coerce_number("42"), json!(42));
        assert_eq!(coerce_number("-7"), json!(-7));
        assert_eq!(coerce_number("0.5"), json!(0.5));
        assert_eq!(coerce_number("042"), json!("042"));
        assert_eq!(coerce_number("3.0"), json!("3.0"));
        assert_eq!(coerce_number(""), json!(""));
        assert_eq!(coerce_number("+1"), json!("+1"));
        assert_eq!(coerce_number("-0"), json!("-0"));
        assert_eq!(coerce_number(" 1"), json!(" 1"));
        assert_eq!(coerce_number("2015-12-11"), json!("2015-12-11"));
        assert_eq!(coerce_number("NaN"), json!("NaN"));
        assert_eq!(coerce_number("Infinity"), json!("Infinity"));
        assert_eq!(coerce_number("1e3"), json!("1e3"));
    }

    #[test]
    fn test_large_integers_lose_precision_and_stay_strings() {
        assert_eq!(coerce_number("9007199254740993"), json!("9007199254740993"));
        assert_eq!(coerce_number("9007199254740992"), json!(9007199254740992i64));
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(0.1), "0.1");
        assert_eq!(number_to_string(-1.25), "-1.25");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(-0.0), "0");
    }

    #[test]
    fn test_parse_assignment() {
        let assignment = Assignment::parse("a.b.c=5").unwrap().unwrap();
        assert_eq!(assignment.path.segments(), &["a", "b", "c"]);
        assert_eq!(assignment.value, json!(5));
    }

    #[test]
    fn test_parse_requires_single_equals() {
        assert_eq!(Assignment::parse("a=b=c").unwrap(), None);
        assert_eq!(Assignment::parse("plain").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(Assignment::parse("a..b=1").is_err());
        assert!(Assignment::parse("=1").is_err());
    }

    #[test]
    fn test_into_fragment_restores_dots() {
        let fragment = Assignment::parse("a___b.c=1").unwrap().unwrap().into_fragment("___");
        assert_eq!(fragment, json!({"a.b": {"c": 1}}));
    }

    #[test]
    fn test_entry_classification() {
        assert!(matches!(Entry::from_value(json!("x=1")), Ok(Entry::Assignment(_))));
        assert!(matches!(Entry::from_value(json!("x=1=2")), Ok(Entry::Literal(_))));
        assert!(matches!(Entry::from_value(json!({"x": 1})), Ok(Entry::Fragment(_))));
        assert!(Entry::from_value(json!(".x=1")).is_err());
    }
}
