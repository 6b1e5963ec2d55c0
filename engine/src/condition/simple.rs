//! Fast-path checker for equality-style conditions.
//!
//! Handles the shapes that show up in most pipelines without starting a
//! script engine:
//!
//! - `true`, `1`, `null`: decided by their own truthiness
//! - `{"user.role": "admin", "active": true}`: every path equals its value
//! - `"user.role == 'admin'"`, `"count !== 0"`: one comparison against a literal
//!
//! Anything else is left to the general evaluator.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{is_truthy, Decision, FastCheck};
use crate::error::{ConditionError, ConditionResult};
use crate::params::FieldPath;

/// `<path> <op> <literal>` with the literal captured greedily.
static COMPARISON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_$][\w$]*(?:\.[\w$]+)*)\s*(===|!==|==|!=)\s*(.+?)\s*$")
        .expect("comparison pattern is valid")
});

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
}

impl Operator {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Operator::LooseEq),
            "!=" => Some(Operator::LooseNe),
            "===" => Some(Operator::StrictEq),
            "!==" => Some(Operator::StrictNe),
            _ => None,
        }
    }

    fn apply(self, left: &Value, right: &Value) -> bool {
        match self {
            Operator::LooseEq => loose_eq(left, right),
            Operator::LooseNe => !loose_eq(left, right),
            Operator::StrictEq => strict_eq(left, right),
            Operator::StrictNe => !strict_eq(left, right),
        }
    }
}

/// Structural fast path used by the default resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleEqualityCheck;

impl FastCheck for SimpleEqualityCheck {
    fn check(&self, data: &Value, condition: &Value) -> ConditionResult<Decision> {
        match condition {
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(is_truthy(condition).into()),
            Value::Object(expected) => {
                for (raw, value) in expected {
                    let path = FieldPath::parse(raw)
                        .map_err(|e| ConditionError::Unsupported(format!("'{}': {}", raw, e)))?;
                    if !strict_eq(lookup(data, &path), value) {
                        return Ok(Decision::False);
                    }
                }
                Ok(Decision::True)
            }
            Value::String(expr) => Ok(check_comparison(data, expr)),
            Value::Array(_) => Ok(Decision::Indeterminate),
        }
    }
}

fn check_comparison(data: &Value, expr: &str) -> Decision {
    let Some(caps) = COMPARISON_RE.captures(expr) else {
        return Decision::Indeterminate;
    };

    let (Ok(path), Some(op), Some(literal)) = (
        FieldPath::parse(&caps[1]),
        Operator::parse(&caps[2]),
        parse_literal(&caps[3]),
    ) else {
        return Decision::Indeterminate;
    };

    op.apply(lookup(data, &path), &literal).into()
}

/// A JSON scalar or a single-quoted string without embedded quotes.
fn parse_literal(raw: &str) -> Option<Value> {
    if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        return (!inner.contains('\'')).then(|| Value::String(inner.to_string()));
    }

    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Array(_) | Value::Object(_) => None,
        scalar => Some(scalar),
    }
}

fn lookup<'a>(data: &'a Value, path: &FieldPath) -> &'a Value {
    path.get(data).unwrap_or(&NULL)
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Strict equality plus number/numeric-string equivalence.
fn loose_eq(left: &Value, right: &Value) -> bool {
    if strict_eq(left, right) {
        return true;
    }
    match (left, right) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.trim().parse::<f64>().ok().zip(n.as_f64()).is_some_and(|(a, b)| a == b)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(data: Value, condition: Value) -> Decision {
        SimpleEqualityCheck.check(&data, &condition).unwrap()
    }

    #[test]
    fn test_scalar_conditions() {
        assert_eq!(check(json!({}), json!(true)), Decision::True);
        assert_eq!(check(json!({}), json!(0)), Decision::False);
        assert_eq!(check(json!({}), json!(null)), Decision::False);
    }

    #[test]
    fn test_object_condition() {
        let data = json!({"user": {"role": "admin"}, "active": true});
        assert_eq!(check(data.clone(), json!({"user.role": "admin", "active": true})), Decision::True);
        assert_eq!(check(data.clone(), json!({"user.role": "guest"})), Decision::False);
        assert_eq!(check(data, json!({"missing": null})), Decision::True);
    }

    #[test]
    fn test_object_condition_with_bad_path_errors() {
        let err = SimpleEqualityCheck.check(&json!({}), &json!({"a..b": 1})).unwrap_err();
        assert!(err.to_string().contains("a..b"));
    }

    #[test]
    fn test_string_comparisons() {
        let data = json!({"status": "ok", "count": 3, "flag": false});
        assert_eq!(check(data.clone(), json!("status == 'ok'")), Decision::True);
        assert_eq!(check(data.clone(), json!(r#"status != "ok""#)), Decision::False);
        assert_eq!(check(data.clone(), json!("count === 3")), Decision::True);
        assert_eq!(check(data.clone(), json!("count == 3.0")), Decision::True);
        assert_eq!(check(data.clone(), json!("count == '3'")), Decision::True);
        assert_eq!(check(data.clone(), json!("count === '3'")), Decision::False);
        assert_eq!(check(data.clone(), json!("flag == false")), Decision::True);
        assert_eq!(check(data, json!("missing == null")), Decision::True);
    }

    #[test]
    fn test_complex_expressions_are_indeterminate() {
        let data = json!({"a": 1, "b": 2});
        assert_eq!(check(data.clone(), json!("a > 0")), Decision::Indeterminate);
        assert_eq!(check(data.clone(), json!("a == 1 && b == 2")), Decision::Indeterminate);
        assert_eq!(check(data.clone(), json!("a == b")), Decision::Indeterminate);
        assert_eq!(check(data.clone(), json!("'x' && b == 'y'")), Decision::Indeterminate);
        assert_eq!(check(data, json!([1])), Decision::Indeterminate);
    }
}
