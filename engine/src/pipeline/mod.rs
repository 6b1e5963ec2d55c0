//! Pipeline documents and the step runner.
//!
//! A pipeline is a JSON document listing filter steps. Each step's `params`
//! are expanded over its `defaults`, then the step runs through the registry
//! and its output becomes the next step's input.
//!
//! # Example
//!
//! ```rust
//! use paramflow::pipeline::{run_document, RunOptions};
//! use paramflow::FilterRegistry;
//! use serde_json::json;
//!
//! let registry = FilterRegistry::standard();
//! let doc = json!({
//!     "data": { "env": "prod" },
//!     "steps": [
//!         { "filter": "mutate", "params": { "set": ["query.size=10"] } },
//!         { "filter": "mutate", "params": { "set": "query.debug=1", "if": "env == 'dev'" } }
//!     ]
//! });
//!
//! let out = run_document(&registry, &doc, &RunOptions::default()).unwrap();
//! assert_eq!(out, json!({ "env": "prod", "query": { "size": 10 } }));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_success_indent, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::filters::FilterRegistry;
use crate::params::{expand_assignments, expand_to_map, DEFAULT_ESCAPE_TOKEN};
use crate::validation::validate_pipeline;

/// A validated pipeline document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Initial data context.
    #[serde(default)]
    pub data: Value,

    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub filter: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub defaults: Value,

    /// Assignment string, fragment, or an array of either.
    #[serde(default)]
    pub params: Value,
}

impl Step {
    /// Label used in logs.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.filter)
    }
}

/// Options for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Token standing for a literal `.` in assignment keys
    pub escape_token: String,

    /// Replaces the document's `data` when set
    pub data: Option<Value>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            escape_token: DEFAULT_ESCAPE_TOKEN.to_string(),
            data: None,
        }
    }
}

impl PipelineDocument {
    /// Validate a raw document against the schema and deserialize it.
    pub fn from_value(doc: &Value) -> PipelineResult<Self> {
        validate_pipeline(doc).map_err(PipelineError::Invalid)?;
        Ok(serde_json::from_value(doc.clone())?)
    }

    pub fn from_json(text: &str) -> PipelineResult<Self> {
        let doc: Value = serde_json::from_str(text)?;
        Self::from_value(&doc)
    }
}

/// Apply `path=value` overrides to a raw document before it is validated.
///
/// `steps.0.params.size=5` overrides a field of the first step.
pub fn apply_overrides<S: AsRef<str>>(doc: &Value, overrides: &[S], escape_token: &str) -> PipelineResult<Value> {
    if overrides.is_empty() {
        return Ok(doc.clone());
    }

    Ok(expand_assignments(doc, overrides, Some(escape_token))?)
}

/// Run every step in order, threading the data context through.
///
/// The first failing step aborts the run.
pub fn run_pipeline(registry: &FilterRegistry, doc: &PipelineDocument, options: &RunOptions) -> PipelineResult<Value> {
    let mut data = match &options.data {
        Some(data) => {
            if !doc.data.is_null() {
                log_warning("Document data replaced by run options");
            }
            data.clone()
        }
        None => doc.data.clone(),
    };

    if let Some(description) = &doc.description {
        log_info(description.clone());
    }
    log_info(format!("Running {} step(s)", doc.steps.len()));

    for (index, step) in doc.steps.iter().enumerate() {
        log_info_indent(format!("[{}] {}", index, step.label()), 1);

        let params = expand_to_map(&step.defaults, &step.params, Some(&options.escape_token)).map_err(|source| {
            PipelineError::Expand {
                index,
                filter: step.filter.clone(),
                source,
            }
        })?;

        data = registry.invoke(&step.filter, &params, data).map_err(|source| {
            log_error(format!("[{}] {} failed: {}", index, step.label(), source));
            PipelineError::Step {
                index,
                filter: step.filter.clone(),
                source,
            }
        })?;

        log_success_indent(format!("[{}] {} done", index, step.label()), 1);
    }

    log_success("Pipeline complete");
    Ok(data)
}

/// Validate and run a raw document.
pub fn run_document(registry: &FilterRegistry, doc: &Value, options: &RunOptions) -> PipelineResult<Value> {
    let doc = PipelineDocument::from_value(doc)?;
    run_pipeline(registry, &doc, options)
}
