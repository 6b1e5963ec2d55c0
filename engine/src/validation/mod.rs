//! JSON Schema validation for pipeline documents.
//!
//! The pipeline schema (Draft 7) is embedded at compile time from
//! `schemas/pipeline.json`.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use paramflow::validation::validate_pipeline;
//!
//! let doc = json!({
//!     "steps": [{ "filter": "mutate", "params": ["query.size=10"] }]
//! });
//! assert!(validate_pipeline(&doc).is_ok());
//!
//! let bad = json!({ "steps": [{ "filter": "mysql" }] });
//! assert!(validate_pipeline(&bad).is_err());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static PIPELINE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/pipeline.json")).expect("Invalid embedded schema")
});

/// Validate `data` against `schema`.
///
/// Returns every violation message on failure.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a pipeline document.
pub fn validate_pipeline(doc: &Value) -> Result<(), Vec<String>> {
    validate(&PIPELINE_SCHEMA, doc)
}

/// Quick check against the pipeline schema.
pub fn is_valid_pipeline(doc: &Value) -> bool {
    jsonschema::draft7::is_valid(&PIPELINE_SCHEMA, doc)
}

/// The embedded pipeline schema.
pub fn pipeline_schema() -> &'static Value {
    &PIPELINE_SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_pipeline() {
        let doc = json!({
            "description": "demo",
            "data": {"body": "a,b\n1,2"},
            "steps": [
                {"filter": "csv"},
                {"filter": "mutate", "name": "tag", "defaults": {"set": {}}, "params": "set.tag=x"},
                {"filter": "sum", "params": {"source": "records", "field": "a"}}
            ]
        });
        assert!(validate_pipeline(&doc).is_ok());
        assert!(is_valid_pipeline(&doc));
    }

    #[test]
    fn test_missing_steps() {
        let errors = validate_pipeline(&json!({"data": {}})).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("steps")));
    }

    #[test]
    fn test_unknown_filter_and_bad_params() {
        let doc = json!({"steps": [{"filter": "geoip"}, {"filter": "sum", "params": 5}]});
        let errors = validate_pipeline(&doc).unwrap_err();
        assert!(errors.len() >= 2);
        assert!(errors.iter().any(|e| e.contains("geoip")));
    }

    #[test]
    fn test_unknown_top_level_key() {
        assert!(!is_valid_pipeline(&json!({"steps": [], "extra": 1})));
    }

    #[test]
    fn test_schema_lists_every_filter() {
        let listed = &pipeline_schema()["definitions"]["step"]["properties"]["filter"]["enum"];
        let listed: Vec<&str> = listed.as_array().unwrap().iter().filter_map(Value::as_str).collect();
        let known: Vec<&str> = crate::filters::Filter::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(listed, known);
    }
}
