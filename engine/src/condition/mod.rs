//! Condition resolution for the `if` filter parameter.
//!
//! Resolution is two-tier:
//!
//! ```text
//! params.if absent/falsy ──▶ run
//!          │
//!          ▼
//!   FastCheck (cheap, structural) ──▶ True / False
//!          │ Indeterminate
//!          ▼
//!   Evaluate (general expression) ──▶ .if
//! ```
//!
//! Both tiers are injected, so the resolver itself never interprets the
//! condition.

pub mod rhai_eval;
pub mod simple;

pub use rhai_eval::RhaiEvaluator;
pub use simple::SimpleEqualityCheck;

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::{ConditionError, ConditionResult};

/// Reserved params key holding the condition.
pub const IF_KEY: &str = "if";

/// Filter parameters.
pub type Params = Map<String, Value>;

/// Outcome of the fast-path check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    True,
    False,
    /// The fast path cannot decide; escalate to the general evaluator.
    Indeterminate,
}

impl From<bool> for Decision {
    fn from(value: bool) -> Self {
        if value {
            Decision::True
        } else {
            Decision::False
        }
    }
}

/// Cheap structural check for simple conditions.
pub trait FastCheck: Send + Sync {
    fn check(&self, data: &Value, condition: &Value) -> ConditionResult<Decision>;
}

/// General expression evaluator.
///
/// Receives the full params (including `if`) and returns params whose `if`
/// holds the evaluated result.
pub trait Evaluate: Send + Sync {
    fn evaluate(&self, params: &Params, data: &Value) -> ConditionResult<Params>;
}

impl<F> FastCheck for F
where
    F: Fn(&Value, &Value) -> Result<Decision, ConditionError> + Send + Sync,
{
    fn check(&self, data: &Value, condition: &Value) -> ConditionResult<Decision> {
        self(data, condition)
    }
}

impl<F> Evaluate for F
where
    F: Fn(&Params, &Value) -> Result<Params, ConditionError> + Send + Sync,
{
    fn evaluate(&self, params: &Params, data: &Value) -> ConditionResult<Params> {
        self(params, data)
    }
}

/// Decides whether a filter should run.
#[derive(Clone)]
pub struct ConditionResolver {
    fast: Arc<dyn FastCheck>,
    evaluator: Arc<dyn Evaluate>,
}

impl ConditionResolver {
    pub fn new(fast: Arc<dyn FastCheck>, evaluator: Arc<dyn Evaluate>) -> Self {
        Self { fast, evaluator }
    }

    /// Resolve `params.if` against `data`.
    ///
    /// An absent or falsy `if` means no gating. Errors from either
    /// collaborator are returned unchanged.
    pub fn resolve(&self, params: &Params, data: &Value) -> ConditionResult<bool> {
        let condition = match params.get(IF_KEY) {
            Some(condition) if is_truthy(condition) => condition,
            _ => return Ok(true),
        };

        match self.fast.check(data, condition)? {
            Decision::True => Ok(true),
            Decision::False => Ok(false),
            Decision::Indeterminate => {
                let evaluated = self.evaluator.evaluate(params, data)?;
                Ok(evaluated.get(IF_KEY).is_some_and(is_truthy))
            }
        }
    }
}

impl Default for ConditionResolver {
    fn default() -> Self {
        Self::new(Arc::new(SimpleEqualityCheck), Arc::new(RhaiEvaluator::new()))
    }
}

impl fmt::Debug for ConditionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionResolver").finish_non_exhaustive()
    }
}

/// JavaScript-style truthiness: `null`, `false`, `0`, NaN and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn never_called_fast() -> Arc<dyn FastCheck> {
        Arc::new(|_: &Value, _: &Value| -> Result<Decision, ConditionError> {
            panic!("fast path should not run")
        })
    }

    fn never_called_eval() -> Arc<dyn Evaluate> {
        Arc::new(|_: &Params, _: &Value| -> Result<Params, ConditionError> {
            panic!("evaluator should not run")
        })
    }

    #[test]
    fn test_absent_or_falsy_condition_runs() {
        let resolver = ConditionResolver::new(never_called_fast(), never_called_eval());
        let data = json!({});
        assert!(resolver.resolve(&params(json!({})), &data).unwrap());
        assert!(resolver.resolve(&params(json!({"if": ""})), &data).unwrap());
        assert!(resolver.resolve(&params(json!({"if": false})), &data).unwrap());
        assert!(resolver.resolve(&params(json!({"if": null})), &data).unwrap());
        assert!(resolver.resolve(&params(json!({"if": 0})), &data).unwrap());
    }

    #[test]
    fn test_fast_path_decides_without_evaluator() {
        let fast: Arc<dyn FastCheck> =
            Arc::new(|_: &Value, _: &Value| -> Result<Decision, ConditionError> { Ok(Decision::False) });
        let resolver = ConditionResolver::new(fast, never_called_eval());
        assert!(!resolver.resolve(&params(json!({"if": "x == 1"})), &json!({})).unwrap());
    }

    #[test]
    fn test_indeterminate_escalates_with_full_params() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let fast: Arc<dyn FastCheck> = Arc::new(|_: &Value, _: &Value| -> Result<Decision, ConditionError> {
            Ok(Decision::Indeterminate)
        });
        let evaluator: Arc<dyn Evaluate> = Arc::new(move |p: &Params, _: &Value| -> Result<Params, ConditionError> {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(p.get("limit"), Some(&json!(5)));
            let mut out = p.clone();
            out.insert(IF_KEY.into(), json!("yes"));
            Ok(out)
        });

        let resolver = ConditionResolver::new(fast, evaluator);
        let result = resolver.resolve(&params(json!({"if": "complex", "limit": 5})), &json!({})).unwrap();
        assert!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_evaluator_result_is_coerced_to_bool() {
        let fast: Arc<dyn FastCheck> = Arc::new(|_: &Value, _: &Value| -> Result<Decision, ConditionError> {
            Ok(Decision::Indeterminate)
        });
        let evaluator: Arc<dyn Evaluate> = Arc::new(|p: &Params, _: &Value| -> Result<Params, ConditionError> {
            let mut out = p.clone();
            out.insert(IF_KEY.into(), json!(0));
            Ok(out)
        });
        let resolver = ConditionResolver::new(fast, evaluator);
        assert!(!resolver.resolve(&params(json!({"if": "complex"})), &json!({})).unwrap());
    }

    #[test]
    fn test_errors_propagate() {
        let fast: Arc<dyn FastCheck> = Arc::new(|_: &Value, _: &Value| -> Result<Decision, ConditionError> {
            Err(ConditionError::Evaluation("bad path".into()))
        });
        let resolver = ConditionResolver::new(fast, never_called_eval());
        let err = resolver.resolve(&params(json!({"if": "x"})), &json!({})).unwrap_err();
        assert!(err.to_string().contains("bad path"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(-1)));
    }
}
