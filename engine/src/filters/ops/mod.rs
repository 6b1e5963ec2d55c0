//! Filter implementations and the helpers they share.
//!
//! Every implementation has the shape `fn(&Params, Value) -> ExecutionResult<Value>`
//! and reads its options through [`options`].

pub mod generate;
pub mod geo;
pub mod mutate;
pub mod script;
pub mod tabular;
pub mod text;
pub mod time;

use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use crate::condition::Params;
use crate::error::{ExecutionError, ExecutionResult};
use crate::params::FieldPath;

/// 2^53
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Deserialize filter options from params. Unknown keys (`if` included) are ignored.
pub(crate) fn options<T: DeserializeOwned>(params: &Params) -> ExecutionResult<T> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| ExecutionError::InvalidParams(e.to_string()))
}

pub(crate) fn read<'a>(data: &'a Value, path: &FieldPath) -> ExecutionResult<&'a Value> {
    match path.get(data) {
        Some(Value::Null) | None => Err(ExecutionError::MissingValue(path.to_string())),
        Some(value) => Ok(value),
    }
}

pub(crate) fn read_str<'a>(data: &'a Value, path: &FieldPath) -> ExecutionResult<&'a str> {
    read(data, path)?.as_str().ok_or_else(|| mismatch(path, "a string"))
}

pub(crate) fn read_f64(data: &Value, path: &FieldPath) -> ExecutionResult<f64> {
    as_f64(read(data, path)?).ok_or_else(|| mismatch(path, "a number"))
}

pub(crate) fn read_array<'a>(data: &'a Value, path: &FieldPath) -> ExecutionResult<&'a Vec<Value>> {
    read(data, path)?.as_array().ok_or_else(|| mismatch(path, "an array"))
}

/// Numbers, and strings holding a number.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Integral values become integer JSON numbers.
pub(crate) fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

pub(crate) fn mismatch(path: &FieldPath, expected: &'static str) -> ExecutionError {
    ExecutionError::TypeMismatch {
        path: path.to_string(),
        expected,
    }
}

/// Default-path constructor for serde `default = "..."` attributes.
macro_rules! default_path {
    ($name:ident, $path:literal) => {
        fn $name() -> $crate::params::FieldPath {
            $crate::params::FieldPath::parse($path).expect("default path is valid")
        }
    };
}
pub(crate) use default_path;
