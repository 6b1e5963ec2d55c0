//! # paramflow - conditionally gated filters and parameter expansion
//!
//! paramflow turns loosely written parameters (`path=value` assignments,
//! JSON fragments) into nested objects, and runs declarative pipelines of
//! data filters, each optionally guarded by an `if` condition.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Assignments │────▶│  Expansion  │────▶│  Condition  │────▶│   Filter    │
//! │ + defaults  │     │  (merge)    │     │  (if gate)  │     │  (registry) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use paramflow::{expand_parameters, FilterRegistry};
//! use serde_json::json;
//!
//! let params = expand_parameters(
//!     &json!({ "count": 1 }),
//!     &json!(["count=3", "target=ids"]),
//!     None,
//! ).unwrap();
//!
//! let registry = FilterRegistry::standard();
//! let out = registry
//!     .invoke("generate", params.as_object().unwrap(), json!({}))
//!     .unwrap();
//! assert_eq!(out, json!({ "ids": [0, 1, 2] }));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`params`] - Assignment parsing, key remapping and expansion
//! - [`merge`] - Deep merge of JSON values
//! - [`condition`] - `if` resolution (fast check + Rhai evaluator)
//! - [`filters`] - Filter catalog, conditional wrapper and registry
//! - [`pipeline`] - Pipeline documents and the step runner
//! - [`validation`] - Pipeline schema validation
//! - [`scripting`] - Sandboxed Rhai engine and value conversion
//! - [`config`] - Environment settings
//! - [`api`] - HTTP API server and log stream

// Core modules
pub mod error;
pub mod merge;
pub mod params;

// Conditions and filters
pub mod condition;
pub mod filters;
pub mod scripting;

// Pipelines
pub mod pipeline;
pub mod validation;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConditionError, ExecutionError, ExpandError, FilterError, PathError, PipelineError, RegistryError, ServerError,
};

// =============================================================================
// Re-exports - Expansion
// =============================================================================

pub use merge::deep_merge;
pub use params::{expand_assignments, expand_parameters, expand_to_map, remap_keys, FieldPath, DEFAULT_ESCAPE_TOKEN};

// =============================================================================
// Re-exports - Conditions and filters
// =============================================================================

pub use condition::{is_truthy, ConditionResolver, Decision, Evaluate, FastCheck, Params};
pub use filters::{Filter, FilterInfo, FilterRegistry, Gating, Interceptor, Invoke};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{apply_overrides, run_document, run_pipeline, PipelineDocument, RunOptions, Step};
pub use validation::{is_valid_pipeline, validate_pipeline};

// =============================================================================
// Re-exports - Config and server
// =============================================================================

pub use api::server::start_server;
pub use config::Settings;
