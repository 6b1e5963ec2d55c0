//! `script`: run a Rhai script over the data.
//!
//! ```text
//! { "filter": "script", "params": { "script": "data.total = count * 2;" } }
//! ```
//!
//! The script sees `data`, `params` and every top-level data key. A map
//! returned by the script replaces the data; a script returning `()` keeps
//! whatever it left in `data`.

use once_cell::sync::Lazy;
use rhai::{Dynamic, Engine};
use serde::Deserialize;
use serde_json::Value;

use super::options;
use crate::condition::{Params, IF_KEY};
use crate::error::{ExecutionError, ExecutionResult};
use crate::scripting::{bind_scope, from_dynamic, sandboxed_engine, DATA_VAR};

static ENGINE: Lazy<Engine> = Lazy::new(sandboxed_engine);

#[derive(Debug, Deserialize)]
struct ScriptOptions {
    script: String,
}

pub fn script(params: &Params, data: Value) -> ExecutionResult<Value> {
    let opts: ScriptOptions = options(params)?;

    let mut bound = params.clone();
    bound.remove(IF_KEY);
    bound.remove("script");

    let mut scope = bind_scope(&data, &bound).map_err(ExecutionError::Script)?;
    let result: Dynamic = ENGINE
        .eval_with_scope(&mut scope, &opts.script)
        .map_err(|e| ExecutionError::Script(e.to_string()))?;

    if result.is_unit() {
        return match scope.get_value::<Dynamic>(DATA_VAR) {
            Some(updated) => from_dynamic(&updated).map_err(ExecutionError::Script),
            None => Ok(data),
        };
    }

    if !result.is_map() {
        return Err(ExecutionError::Script(format!(
            "script must return a map or (), got {}",
            result.type_name()
        )));
    }
    from_dynamic(&result).map_err(ExecutionError::Script)
}
