//! General condition evaluator backed by Rhai.

use rhai::{Dynamic, Engine};
use serde_json::Value;

use super::{is_truthy, Evaluate, Params, IF_KEY};
use crate::error::{ConditionError, ConditionResult};
use crate::scripting::{bind_scope, from_dynamic, sandboxed_engine};

/// Evaluates `if` expressions such as `count > 2 && user.role == "admin"`.
///
/// Every top-level key of the data context is a variable; `data` and
/// `params` are also available.
pub struct RhaiEvaluator {
    engine: Engine,
}

impl RhaiEvaluator {
    pub fn new() -> Self {
        Self {
            engine: sandboxed_engine(),
        }
    }

    fn eval_expression(&self, expr: &str, params: &Params, data: &Value) -> ConditionResult<bool> {
        let mut bound = params.clone();
        bound.remove(IF_KEY);

        let mut scope = bind_scope(data, &bound).map_err(ConditionError::Evaluation)?;
        let result: Dynamic = self
            .engine
            .eval_expression_with_scope(&mut scope, expr)
            .map_err(|e| ConditionError::Evaluation(format!("'{}': {}", expr, e)))?;

        let value = from_dynamic(&result).map_err(ConditionError::Evaluation)?;
        Ok(is_truthy(&value))
    }
}

impl Default for RhaiEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluate for RhaiEvaluator {
    fn evaluate(&self, params: &Params, data: &Value) -> ConditionResult<Params> {
        let decision = match params.get(IF_KEY) {
            Some(Value::String(expr)) => self.eval_expression(expr, params, data)?,
            Some(other) => is_truthy(other),
            None => true,
        };

        let mut evaluated = params.clone();
        evaluated.insert(IF_KEY.to_string(), Value::Bool(decision));
        Ok(evaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{ConditionResolver, SimpleEqualityCheck};
    use serde_json::json;
    use std::sync::Arc;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_evaluates_expression_against_data() {
        let evaluator = RhaiEvaluator::new();
        let data = json!({"count": 5, "user": {"role": "admin"}});
        let out = evaluator
            .evaluate(&params(json!({"if": r#"count > 2 && user.role == "admin""#, "k": 1})), &data)
            .unwrap();
        assert_eq!(out["if"], json!(true));
        assert_eq!(out["k"], json!(1));
    }

    #[test]
    fn test_params_are_bound() {
        let evaluator = RhaiEvaluator::new();
        let out = evaluator
            .evaluate(&params(json!({"if": "params.limit < data.total", "limit": 3})), &json!({"total": 10}))
            .unwrap();
        assert_eq!(out["if"], json!(true));
    }

    #[test]
    fn test_non_boolean_result_uses_truthiness() {
        let evaluator = RhaiEvaluator::new();
        let out = evaluator.evaluate(&params(json!({"if": "name"})), &json!({"name": ""})).unwrap();
        assert_eq!(out["if"], json!(false));
    }

    #[test]
    fn test_script_error_is_evaluation_error() {
        let evaluator = RhaiEvaluator::new();
        let err = evaluator.evaluate(&params(json!({"if": "count >"})), &json!({"count": 1})).unwrap_err();
        assert!(matches!(err, ConditionError::Evaluation(_)));
    }

    #[test]
    fn test_default_resolver_end_to_end() {
        let resolver = ConditionResolver::new(Arc::new(SimpleEqualityCheck), Arc::new(RhaiEvaluator::new()));
        let data = json!({"count": 5, "status": "ok"});
        assert!(resolver.resolve(&params(json!({"if": "status == 'ok'"})), &data).unwrap());
        assert!(!resolver.resolve(&params(json!({"if": "count < 5"})), &data).unwrap());
        assert!(resolver.resolve(&params(json!({"if": "count >= 5"})), &data).unwrap());
    }
}
