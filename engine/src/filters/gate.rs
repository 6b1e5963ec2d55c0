//! Conditional invocation wrapper.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::condition::{ConditionResolver, Params};
use crate::error::{ExecutionResult, FilterError};

/// A filter implementation: `(params, data) -> data`.
pub type Implementation = Arc<dyn Fn(&Params, Value) -> ExecutionResult<Value> + Send + Sync>;

/// What the registry hands out for each catalog entry.
pub type Invoke = Arc<dyn Fn(&Params, Value) -> Result<Value, FilterError> + Send + Sync>;

/// Caller-supplied cross-cut around every invocation.
///
/// Receives the params, the data and the underlying invocation, and decides
/// whether and how to call it.
pub type Interceptor = Arc<dyn Fn(&Params, Value, &Invoke) -> Result<Value, FilterError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gating {
    /// Runs only when `params.if` resolves truthy; errors are wrapped.
    Gated,
    /// Always runs; errors are returned as-is.
    Ungated,
}

/// Wrap `implementation` so it runs only when `params.if` allows it.
///
/// - condition true: `implementation(params, data)`, with a `null` data
///   replaced by `{}`
/// - condition false: `data` is returned untouched, `null` included
///
/// Condition and execution failures come back tagged with `name`.
pub fn gated(name: &str, resolver: Arc<ConditionResolver>, implementation: Implementation) -> Invoke {
    let name = name.to_string();
    Arc::new(move |params: &Params, data: Value| -> Result<Value, FilterError> {
        let run = resolver.resolve(params, &data).map_err(|source| FilterError::Condition {
            filter: name.clone(),
            source,
        })?;

        if !run {
            return Ok(data);
        }

        let data = if data.is_null() { Value::Object(Map::new()) } else { data };
        implementation(params, data).map_err(|source| FilterError::Execution {
            filter: name.clone(),
            source,
        })
    })
}

/// Expose `implementation` directly: no condition, no error tagging.
pub fn ungated(implementation: Implementation) -> Invoke {
    Arc::new(move |params: &Params, data: Value| -> Result<Value, FilterError> {
        implementation(params, data).map_err(FilterError::Ungated)
    })
}
