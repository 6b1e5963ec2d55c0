//! Record-oriented filters: `csv`, `paginate`, `select`, `sum`.

use ::csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{as_f64, default_path, mismatch, number, options, read_array, read_str};
use crate::condition::Params;
use crate::error::{ExecutionError, ExecutionResult};
use crate::params::FieldPath;

default_path!(default_body, "body");
default_path!(default_records, "records");
default_path!(default_items, "items");
default_path!(default_sum, "sum");

static NULL: Value = Value::Null;

fn default_true() -> bool {
    true
}

// =============================================================================
// csv
// =============================================================================

#[derive(Debug, Deserialize)]
struct CsvOptions {
    #[serde(default = "default_body")]
    source: FieldPath,
    #[serde(default = "default_records")]
    target: FieldPath,
    delimiter: Option<String>,
    #[serde(default = "default_true")]
    headers: bool,
}

/// Parse the CSV text at `source` into `target`.
///
/// With headers each row becomes an object keyed by column name; short rows
/// get `""` for missing cells and extra cells are dropped. Without headers
/// each row is an array of strings. Blank lines are skipped.
pub fn csv(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: CsvOptions = options(params)?;
    let text = read_str(&data, &opts.source)?;

    let delimiter = match opts.delimiter.as_deref() {
        Some(d) => parse_delimiter(d)?,
        None => detect_delimiter(text),
    };
    let rows = read_rows(text, delimiter)?;

    let records = if opts.headers {
        let mut rows = rows.into_iter();
        let header = rows.next().unwrap_or_default();
        rows.map(|row| {
            let object: Map<String, Value> = header
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let cell = row.get(i).cloned().unwrap_or_default();
                    (column.clone(), Value::String(cell))
                })
                .collect();
            Value::Object(object)
        })
        .collect()
    } else {
        rows.into_iter()
            .map(|row| Value::Array(row.into_iter().map(Value::String).collect()))
            .collect()
    };

    opts.target.set(&mut data, Value::Array(records));
    Ok(data)
}

/// Non-blank rows of trimmed cells.
fn read_rows(text: &str, delimiter: u8) -> ExecutionResult<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Pick the separator that occurs most often in the first line.
///
/// Falls back to `,` when none of `; , TAB |` appears.
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [b';', b',', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for sep in separators {
        let count = first_line.bytes().filter(|b| *b == sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn parse_delimiter(raw: &str) -> ExecutionResult<u8> {
    match raw.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ if raw == "\\t" => Ok(b'\t'),
        _ => Err(ExecutionError::InvalidParams(format!(
            "delimiter must be a single ASCII character, got '{}'",
            raw
        ))),
    }
}

// =============================================================================
// paginate
// =============================================================================

fn default_page() -> usize {
    1
}

fn default_size() -> usize {
    10
}

#[derive(Debug, Deserialize)]
struct PaginateOptions {
    #[serde(default = "default_items")]
    source: FieldPath,
    target: Option<FieldPath>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_size")]
    size: usize,
}

/// Keep page `page` (1-based) of `size` elements.
pub fn paginate(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: PaginateOptions = options(params)?;
    if opts.page == 0 || opts.size == 0 {
        return Err(ExecutionError::InvalidParams("page and size must be at least 1".into()));
    }

    let page: Vec<Value> = read_array(&data, &opts.source)?
        .iter()
        .skip((opts.page - 1).saturating_mul(opts.size))
        .take(opts.size)
        .cloned()
        .collect();

    opts.target
        .as_ref()
        .unwrap_or(&opts.source)
        .set(&mut data, Value::Array(page));
    Ok(data)
}

// =============================================================================
// select
// =============================================================================

#[derive(Debug, Deserialize)]
struct SelectOptions {
    fields: Vec<FieldPath>,
}

/// Keep only `fields`, preserving their nesting. Missing fields are skipped.
pub fn select(params: &Params, data: Value) -> ExecutionResult<Value> {
    let opts: SelectOptions = options(params)?;

    let mut selected = Value::Object(Map::new());
    for path in &opts.fields {
        if let Some(value) = path.get(&data) {
            path.set(&mut selected, value.clone());
        }
    }
    Ok(selected)
}

// =============================================================================
// sum
// =============================================================================

#[derive(Debug, Deserialize)]
struct SumOptions {
    #[serde(default = "default_items")]
    source: FieldPath,
    field: Option<FieldPath>,
    #[serde(default = "default_sum")]
    target: FieldPath,
}

/// Sum the array at `source` (or each element's `field`). Nulls and missing
/// fields count as zero.
pub fn sum(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: SumOptions = options(params)?;

    let mut total = 0.0;
    for (i, item) in read_array(&data, &opts.source)?.iter().enumerate() {
        let value = match &opts.field {
            Some(field) => field.get(item).unwrap_or(&NULL),
            None => item,
        };
        if value.is_null() {
            continue;
        }
        total += as_f64(value).ok_or_else(|| {
            let at = match &opts.field {
                Some(field) => format!("{}.{}.{}", opts.source, i, field),
                None => format!("{}.{}", opts.source, i),
            };
            mismatch_at(at)
        })?;
    }

    opts.target.set(&mut data, number(total));
    Ok(data)
}

fn mismatch_at(at: String) -> ExecutionError {
    match FieldPath::parse(&at) {
        Ok(path) => mismatch(&path, "a number"),
        Err(e) => e.into(),
    }
}
