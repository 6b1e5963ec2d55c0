use serde::Deserialize;
use serde_json::Value;

use super::{default_path, number, options};
use crate::condition::Params;
use crate::error::{ExecutionError, ExecutionResult};
use crate::params::FieldPath;

/// Upper bound on generated items.
pub const MAX_COUNT: usize = 100_000;

default_path!(default_items, "items");

fn default_step() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct GenerateOptions {
    count: usize,
    #[serde(default)]
    start: f64,
    #[serde(default = "default_step")]
    step: f64,
    #[serde(default = "default_items")]
    target: FieldPath,
}

/// Write `count` numbers `start + i * step` to `target`.
pub fn generate(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: GenerateOptions = options(params)?;
    if opts.count > MAX_COUNT {
        return Err(ExecutionError::InvalidParams(format!(
            "count {} exceeds the maximum of {}",
            opts.count, MAX_COUNT
        )));
    }

    let items = (0..opts.count)
        .map(|i| number(opts.start + i as f64 * opts.step))
        .collect();
    opts.target.set(&mut data, Value::Array(items));
    Ok(data)
}
