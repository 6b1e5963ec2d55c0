//! `moment`: timestamp parsing and formatting.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;

use super::{default_path, options, read};
use crate::condition::Params;
use crate::error::{ExecutionError, ExecutionResult};
use crate::params::FieldPath;

/// Format token for epoch milliseconds.
pub const EPOCH_MILLIS: &str = "x";

/// Format token for epoch seconds.
pub const EPOCH_SECONDS: &str = "X";

default_path!(default_timestamp, "timestamp");

#[derive(Debug, Deserialize)]
struct MomentOptions {
    #[serde(default = "default_timestamp")]
    source: FieldPath,
    target: Option<FieldPath>,
    input_format: Option<String>,
    format: Option<String>,
}

/// Parse the timestamp at `source` and write it in `format`.
pub fn moment(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: MomentOptions = options(params)?;

    let parsed = parse_timestamp(read(&data, &opts.source)?, opts.input_format.as_deref())?;
    let rendered = format_timestamp(&parsed, opts.format.as_deref())?;

    opts.target.as_ref().unwrap_or(&opts.source).set(&mut data, rendered);
    Ok(data)
}

/// Accepts epoch milliseconds (number or numeric string), RFC 3339, or
/// `input_format` (a chrono pattern, with or without offset, or date only).
pub fn parse_timestamp(value: &Value, input_format: Option<&str>) -> ExecutionResult<DateTime<FixedOffset>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_millis)
            .ok_or_else(|| ExecutionError::Time(format!("timestamp out of range: {}", n))),
        Value::String(s) => match input_format {
            Some(fmt) => parse_with_format(s, fmt),
            None => DateTime::parse_from_rfc3339(s).or_else(|e| {
                s.parse::<i64>()
                    .ok()
                    .and_then(from_millis)
                    .ok_or_else(|| ExecutionError::Time(format!("'{}': {}", s, e)))
            }),
        },
        _ => Err(ExecutionError::Time(format!("cannot parse {} as a timestamp", value))),
    }
}

fn parse_with_format(s: &str, fmt: &str) -> ExecutionResult<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
        return Ok(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
        return Ok(naive.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(s, fmt)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| ExecutionError::Time(format!("'{}' does not match '{}'", s, fmt)))
}

fn from_millis(ms: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.fixed_offset())
}

/// Render as RFC 3339 (default), epoch millis (`x`), epoch seconds (`X`) or
/// a chrono pattern.
pub fn format_timestamp(dt: &DateTime<FixedOffset>, format: Option<&str>) -> ExecutionResult<Value> {
    match format {
        None => Ok(Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))),
        Some(EPOCH_MILLIS) => Ok(Value::from(dt.timestamp_millis())),
        Some(EPOCH_SECONDS) => Ok(Value::from(dt.timestamp())),
        Some(pattern) => {
            let items: Vec<Item> = StrftimeItems::new(pattern).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                return Err(ExecutionError::Time(format!("invalid format '{}'", pattern)));
            }
            let mut out = String::new();
            write!(out, "{}", dt.format_with_items(items.iter()))
                .map_err(|_| ExecutionError::Time(format!("cannot format with '{}'", pattern)))?;
            Ok(Value::String(out))
        }
    }
}
