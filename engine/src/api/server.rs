//! HTTP server exposing the expander, the filter catalog and the pipeline runner.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/health`              | Health check                         |
//! | GET    | `/api/filters`         | Filter catalog                       |
//! | POST   | `/api/expand`          | Expand params over defaults          |
//! | POST   | `/api/filters/{name}`  | Invoke one filter                    |
//! | POST   | `/api/run`             | Run a pipeline document              |
//! | GET    | `/api/logs`            | SSE stream for real-time logs        |

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{ApiError, DataResponse, ExpandRequest, InvokeRequest, RunRequest};
use crate::config::Settings;
use crate::error::ServerError;
use crate::filters::{FilterInfo, FilterRegistry};
use crate::params::{expand_parameters, expand_to_map};
use crate::pipeline::{apply_overrides, run_document};

/// Shared state handed to every handler.
pub struct AppState {
    pub registry: FilterRegistry,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            registry: FilterRegistry::standard(),
            settings,
        }
    }
}

type ApiResult = Result<Json<DataResponse>, ApiError>;

/// Build the router with CORS applied.
pub fn router(state: Arc<AppState>) -> Result<Router, ServerError> {
    let cors = cors_layer(state.settings.cors_origin.as_deref())?;

    Ok(Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/filters", get(list_filters))
        .route("/api/filters/{name}", post(invoke_filter))
        .route("/api/expand", post(expand))
        .route("/api/run", post(run))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state))
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ServerError> {
    let allow_origin = match origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin)
                .map_err(|_| ServerError::Config(format!("Invalid CORS origin '{}'", origin)))?;
            AllowOrigin::exact(value)
        }
        None => AllowOrigin::from(Any),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]))
}

/// Start the HTTP server
pub async fn start_server(settings: Settings) -> Result<(), ServerError> {
    let port = settings.port;
    let app = router(Arc::new(AppState::new(settings)))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("paramflow server running on http://localhost:{}", port);
    eprintln!("   GET  /api/filters        - Filter catalog");
    eprintln!("   POST /api/expand         - Expand parameters");
    eprintln!("   POST /api/filters/{{name}} - Invoke a filter");
    eprintln!("   POST /api/run            - Run a pipeline");
    eprintln!("   GET  /api/logs           - SSE log stream");
    eprintln!("   GET  /health             - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "paramflow",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_filters(State(state): State<Arc<AppState>>) -> Json<Vec<FilterInfo>> {
    Json(state.registry.describe())
}

async fn expand(State(state): State<Arc<AppState>>, Json(req): Json<ExpandRequest>) -> ApiResult {
    let escape = req.escape.as_deref().unwrap_or(&state.settings.escape_token);
    let expanded = expand_parameters(&req.defaults, &req.params, Some(escape))?;
    Ok(Json(DataResponse::new(expanded)))
}

async fn invoke_filter(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<InvokeRequest>,
) -> ApiResult {
    let params = expand_to_map(&Value::Null, &req.params, Some(&state.settings.escape_token))?;

    log_info(format!("Invoking filter '{}'", name));
    let data = state.registry.invoke(&name, &params, req.data)?;
    Ok(Json(DataResponse::new(data)))
}

async fn run(State(state): State<Arc<AppState>>, Json(req): Json<RunRequest>) -> ApiResult {
    let mut options = state.settings.run_options();
    options.data = req.data;

    let doc = apply_overrides(&req.pipeline, &req.set, &options.escape_token)?;
    let data = run_document(&state.registry, &doc, &options)?;
    Ok(Json(DataResponse::new(data)))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers just drop the missed entries
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
