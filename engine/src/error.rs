//! Error types for the paramflow engine.
//!
//! This module defines a small closed taxonomy:
//!
//! - [`PathError`] - Invalid dotted paths
//! - [`ExpandError`] - Parameter expansion errors
//! - [`ConditionError`] - Failures raised while deciding an `if` condition
//! - [`ExecutionError`] - Failures raised by a filter implementation
//! - [`FilterError`] - What a gated invocation returns, wrapping one of the above
//! - [`RegistryError`] - Catalog lookup errors
//! - [`PipelineError`] - Top-level pipeline orchestration errors
//!
//! Wrapping keeps the original error reachable through
//! [`std::error::Error::source`], so callers can branch on the kind.

use thiserror::Error;

// =============================================================================
// Path Errors
// =============================================================================

/// Errors while parsing a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string was empty.
    #[error("Path is empty")]
    Empty,

    /// One of the `.`-separated segments was empty.
    #[error("Empty segment at position {position} in path '{path}'")]
    EmptySegment { path: String, position: usize },
}

// =============================================================================
// Expansion Errors
// =============================================================================

/// Errors during parameter expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// An assignment path could not be parsed.
    #[error("Invalid assignment '{assignment}': {source}")]
    Path {
        assignment: String,
        #[source]
        source: PathError,
    },

    /// Defaults must be an object (or null).
    #[error("Defaults must be an object, got {0}")]
    InvalidDefaults(&'static str),
}

// =============================================================================
// Condition Errors
// =============================================================================

/// Errors raised by the fast-path checker or the general evaluator.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// The expression failed to compile or evaluate.
    #[error("Condition evaluation failed: {0}")]
    Evaluation(String),

    /// The condition has a shape the evaluator cannot handle.
    #[error("Unsupported condition: {0}")]
    Unsupported(String),
}

// =============================================================================
// Filter Execution Errors
// =============================================================================

/// Errors raised by a filter implementation.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A value the filter reads is missing from the data.
    #[error("Missing value at '{0}'")]
    MissingValue(String),

    /// The filter options could not be read.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A value had the wrong shape.
    #[error("Expected {expected} at '{path}'")]
    TypeMismatch { path: String, expected: &'static str },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A Rhai script failed.
    #[error("Script error: {0}")]
    Script(String),

    /// A timestamp could not be parsed or formatted.
    #[error("Time error: {0}")]
    Time(String),

    /// Parameter expansion failed inside a filter.
    #[error(transparent)]
    Expand(#[from] ExpandError),

    /// A path option was malformed.
    #[error(transparent)]
    Path(#[from] PathError),
}

// =============================================================================
// Filter Invocation Errors
// =============================================================================

/// Errors returned by an invocation function from the registry.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Deciding the `if` condition failed.
    #[error("Unable to process filter '{filter}': {source}")]
    Condition {
        filter: String,
        #[source]
        source: ConditionError,
    },

    /// The filter implementation failed.
    #[error("Unable to process filter '{filter}': {source}")]
    Execution {
        filter: String,
        #[source]
        source: ExecutionError,
    },

    /// Error from an ungated catalog entry, passed through as-is.
    #[error(transparent)]
    Ungated(#[from] ExecutionError),
}

impl FilterError {
    /// Whether the failure happened while deciding the condition.
    pub fn is_condition(&self) -> bool {
        matches!(self, FilterError::Condition { .. })
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the filter registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No catalog entry with that name.
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// The filter itself failed.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::pipeline::run_pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The pipeline document failed schema validation.
    #[error("Invalid pipeline: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// Expanding a step's parameters failed.
    #[error("Step {index} ('{filter}'): {source}")]
    Expand {
        index: usize,
        filter: String,
        #[source]
        source: ExpandError,
    },

    /// A step failed.
    #[error("Step {index} ('{filter}') failed: {source}")]
    Step {
        index: usize,
        filter: String,
        #[source]
        source: RegistryError,
    },

    /// Applying overrides to the document failed.
    #[error("Override error: {0}")]
    Override(#[from] ExpandError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or serving failed.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for expansion.
pub type ExpandResult<T> = Result<T, ExpandError>;

/// Result type for condition resolution.
pub type ConditionResult<T> = Result<T, ConditionError>;

/// Result type for filter implementations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;
