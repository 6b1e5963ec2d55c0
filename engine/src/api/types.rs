//! REST API request and response types.
//!
//! Failures are returned as `{ requestId, status: "error", error }` with a
//! 400 for bad input and a 422 when a filter or pipeline fails.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ExpandError, PipelineError, RegistryError};

/// Body of `POST /api/expand`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpandRequest {
    #[serde(default)]
    pub defaults: Value,

    /// Assignment string, fragment, or an array of either
    #[serde(default)]
    pub params: Value,

    pub escape: Option<String>,
}

/// Body of `POST /api/filters/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeRequest {
    #[serde(default)]
    pub params: Value,

    #[serde(default)]
    pub data: Value,
}

/// Body of `POST /api/run`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    pub pipeline: Value,

    /// Replaces the pipeline's own `data`
    pub data: Option<Value>,

    /// `path=value` overrides applied to the pipeline document
    #[serde(default)]
    pub set: Vec<String>,
}

/// Successful response carrying a JSON result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub request_id: String,
    /// Always "ok"
    pub status: String,
    pub data: Value,
}

impl DataResponse {
    pub fn new(data: Value) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            status: "ok".to_string(),
            data,
        }
    }
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

/// An error ready to be sent back to the client.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(error_response(&self.message))).into_response()
    }
}

impl From<ExpandError> for ApiError {
    fn from(err: ExpandError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownFilter(_) => Self::bad_request(err.to_string()),
            RegistryError::Filter(_) => Self::unprocessable(err.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Invalid(ref errors) => Self::bad_request(format!("Invalid pipeline: {}", errors.join("; "))),
            PipelineError::Override(_) | PipelineError::Json(_) => Self::bad_request(err.to_string()),
            PipelineError::Step {
                source: RegistryError::UnknownFilter(_),
                ..
            } => Self::bad_request(err.to_string()),
            PipelineError::Expand { .. } | PipelineError::Step { .. } => Self::unprocessable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutionError, FilterError, PathError};

    #[test]
    fn test_error_response_shape() {
        let body = error_response("boom");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "boom");
        assert!(Uuid::parse_str(body["requestId"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_data_response_camel_case() {
        let value = serde_json::to_value(DataResponse::new(json!({"a": 1}))).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"], json!({"a": 1}));
        assert!(value.get("requestId").is_some());
    }

    #[test]
    fn test_status_mapping() {
        let unknown: ApiError = RegistryError::UnknownFilter("geoip".into()).into();
        assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

        let failed: ApiError = RegistryError::Filter(FilterError::Execution {
            filter: "json".into(),
            source: ExecutionError::MissingValue("body".into()),
        })
        .into();
        assert_eq!(failed.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(failed.message.contains("json"));

        let invalid: ApiError = PipelineError::Invalid(vec!["missing steps".into()]).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert!(invalid.message.contains("missing steps"));

        let expand: ApiError = ExpandError::Path {
            assignment: "a..b=1".into(),
            source: PathError::Empty,
        }
        .into();
        assert_eq!(expand.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_request_defaults() {
        let req: InvokeRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.params.is_null());
        assert!(req.data.is_null());

        let req: RunRequest = serde_json::from_value(json!({"pipeline": {"steps": []}})).unwrap();
        assert!(req.data.is_none());
        assert!(req.set.is_empty());
    }
}
