use serde::Deserialize;
use serde_json::Value;

use super::options;
use crate::condition::Params;
use crate::error::ExecutionResult;
use crate::params::expand_parameters;

#[derive(Debug, Deserialize)]
struct MutateOptions {
    set: Value,
    escape: Option<String>,
}

/// Merge `set` (assignments or fragments) into the data.
pub fn mutate(params: &Params, data: Value) -> ExecutionResult<Value> {
    let opts: MutateOptions = options(params)?;
    Ok(expand_parameters(&data, &opts.set, opts.escape.as_deref())?)
}
