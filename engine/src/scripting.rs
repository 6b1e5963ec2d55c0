//! Rhai engine setup shared by the condition evaluator and the `script` filter.

use rhai::{Dynamic, Engine, Scope};
use serde_json::{Map, Value};

/// Name under which the whole data context is bound.
pub const DATA_VAR: &str = "data";

/// Name under which the filter params are bound.
pub const PARAMS_VAR: &str = "params";

/// Creates a Rhai engine with safety limits.
pub fn sandboxed_engine() -> Engine {
    let mut engine = Engine::new();

    engine.set_max_expr_depths(64, 64);
    engine.set_max_operations(100_000);
    engine.set_max_string_size(1_000_000);
    engine.set_max_array_size(10_000);
    engine.set_max_map_size(10_000);

    engine.set_optimization_level(rhai::OptimizationLevel::Full);
    engine.set_max_call_levels(16);

    engine
}

/// Convert a JSON value to a Rhai value.
pub fn to_dynamic(value: &Value) -> Result<Dynamic, String> {
    rhai::serde::to_dynamic(value).map_err(|e| e.to_string())
}

/// Convert a Rhai value back to JSON.
pub fn from_dynamic(value: &Dynamic) -> Result<Value, String> {
    rhai::serde::from_dynamic::<Value>(value).map_err(|e| e.to_string())
}

/// Build a scope for evaluating against `data`.
///
/// Top-level keys of `data` are bound as variables; `data` and `params` are
/// bound last so they always refer to the whole context and the params.
pub fn bind_scope(data: &Value, params: &Map<String, Value>) -> Result<Scope<'static>, String> {
    let mut scope = Scope::new();

    if let Value::Object(fields) = data {
        for (key, value) in fields {
            scope.push_dynamic(key.as_str(), to_dynamic(value)?);
        }
    }

    scope.push_dynamic(DATA_VAR, to_dynamic(data)?);
    scope.push_dynamic(PARAMS_VAR, to_dynamic(&Value::Object(params.clone()))?);

    Ok(scope)
}
