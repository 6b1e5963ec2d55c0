//! `json` and `urldecode`.

use serde::Deserialize;
use serde_json::Value;

use super::{default_path, options, read_str};
use crate::condition::Params;
use crate::error::{ExecutionError, ExecutionResult};
use crate::params::FieldPath;

default_path!(default_body, "body");

#[derive(Debug, Deserialize)]
struct JsonOptions {
    #[serde(default = "default_body")]
    source: FieldPath,
    target: Option<FieldPath>,
}

/// Parse the JSON text at `source` and store it at `target`.
pub fn json(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: JsonOptions = options(params)?;
    let parsed: Value = serde_json::from_str(read_str(&data, &opts.source)?)?;
    opts.target.as_ref().unwrap_or(&opts.source).set(&mut data, parsed);
    Ok(data)
}

#[derive(Debug, Deserialize)]
struct UrldecodeOptions {
    #[serde(default = "default_body")]
    source: FieldPath,
    target: Option<FieldPath>,
    #[serde(default = "default_true")]
    plus_as_space: bool,
}

fn default_true() -> bool {
    true
}

/// Percent-decode the string at `source`.
pub fn urldecode(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: UrldecodeOptions = options(params)?;
    let decoded = percent_decode(read_str(&data, &opts.source)?, opts.plus_as_space)
        .map_err(|e| ExecutionError::InvalidParams(format!("'{}': {}", opts.source, e)))?;
    opts.target
        .as_ref()
        .unwrap_or(&opts.source)
        .set(&mut data, Value::String(decoded));
    Ok(data)
}

/// Decode `%XX` escapes into UTF-8.
///
/// A `%` not followed by two hex digits is kept literally.
pub fn percent_decode(input: &str, plus_as_space: bool) -> Result<String, String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() && is_hex_pair(bytes[i + 1], bytes[i + 2]) => {
                out.push(hex_value(bytes[i + 1]) << 4 | hex_value(bytes[i + 2]));
                i += 3;
            }
            b'+' if plus_as_space => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).map_err(|e| format!("decoded bytes are not UTF-8: {}", e))
}

fn is_hex_pair(a: u8, b: u8) -> bool {
    a.is_ascii_hexdigit() && b.is_ascii_hexdigit()
}

fn hex_value(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}
