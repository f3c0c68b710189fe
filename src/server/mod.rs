//! HTTP boundary
//!
//! Maps the four public endpoints onto [`GenerationGateway`], parses request
//! bodies, and renders every outcome into the JSON envelope. Admission
//! control, request ids, metrics and panic recovery are layered around the
//! routes here.

use crate::error::{GatewayError, Result, INTERNAL_ERROR_MESSAGE};
use crate::gateway::{utc_timestamp, ChatReply, GenerateReply, GenerationGateway};
use crate::metrics::{metrics_handler, track_requests, MetricsService};
use crate::observability::request_id_middleware;
use crate::rate_limit::{rate_limit_middleware, RateLimitConfig};
use crate::validation::{body_rejection, parse_json_object, FieldMap};
use axum::{
    body::Body,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info_span, Span};

/// Every routable path, as listed in 404 replies
pub const AVAILABLE_ENDPOINTS: [&str; 4] = ["/", "/api/health", "/api/generate", "/api/chat"];

/// Public service name
pub const SERVICE_NAME: &str = "Gemini API Wrapper";

/// Public service description
pub const SERVICE_DESCRIPTION: &str = "Free Gemini API endpoint for developers";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GenerationGateway>,
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    pub fn new(gateway: Arc<GenerationGateway>, rate_limit: RateLimitConfig) -> Self {
        Self {
            gateway,
            rate_limit,
        }
    }
}

/// Optional layers around the routes
#[derive(Clone, Default)]
pub struct AppOptions {
    /// Allow cross-origin requests from any origin
    pub cors_enabled: bool,
    /// Serve Prometheus metrics at `/metrics`
    pub metrics: Option<MetricsService>,
    /// Request body size limit in bytes; axum's default when `None`
    pub body_limit: Option<usize>,
}

/// Assemble the axum application
pub fn build_app(state: AppState, options: AppOptions) -> Router {
    let gateway = state.gateway.clone();

    // Admission wraps every public route and the 404 fallback, ahead of body
    // extraction. Metrics scrapes are added afterwards and bypass it.
    let mut app = Router::new()
        .route("/", get(index).fallback(method_not_allowed))
        .route("/api/health", get(health).fallback(method_not_allowed))
        .route("/api/generate", post(generate).fallback(method_not_allowed))
        .route("/api/chat", post(chat).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(state);

    if let Some(limit) = options.body_limit {
        app = app.layer(DefaultBodyLimit::max(limit));
    }

    app = app.layer(middleware::from_fn_with_state(gateway, rate_limit_middleware));

    if let Some(metrics) = options.metrics {
        app = app.route("/metrics", get(metrics_handler).with_state(metrics));
    }

    let mut app = app
        .layer(middleware::from_fn(track_requests))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span));

    if options.cors_enabled {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

/// Service metadata
async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": SERVICE_DESCRIPTION,
        "endpoints": {
            "generate": "/api/generate",
            "chat": "/api/chat",
            "health": "/api/health",
            "info": "/",
        },
        "rate_limit": advertised_rate_limit(&state.rate_limit),
    }))
}

/// Client-facing rate limit text. The wording says "per minute" whatever the
/// configured window; the enforced numbers come from `config`.
pub fn advertised_rate_limit(config: &RateLimitConfig) -> String {
    format!("{} requests per minute", config.requests)
}

/// Liveness probe
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": utc_timestamp(),
    }))
}

/// Request span; `request_id` is filled in by the request-id middleware
fn make_request_span(request: &Request<Body>) -> Span {
    info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
    )
}

async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<GenerateReply>> {
    let fields = read_fields(&headers, body)?;
    let reply = state.gateway.generate(&fields).await?;
    Ok(Json(reply))
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<ChatReply>> {
    let fields = read_fields(&headers, body)?;
    let reply = state.gateway.chat(&fields).await?;
    Ok(Json(reply))
}

fn read_fields(
    headers: &HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<FieldMap> {
    let body = body.map_err(body_rejection).map_err(log_bad_request)?;
    parse_json_object(headers, &body).map_err(log_bad_request)
}

fn log_bad_request(e: GatewayError) -> GatewayError {
    error!(error = %e, "Bad request");
    e
}

async fn not_found(uri: Uri) -> GatewayError {
    debug!(path = %uri.path(), "No route matched");
    GatewayError::RouteNotFound(uri.path().to_string())
}

async fn method_not_allowed(method: Method, uri: Uri) -> GatewayError {
    GatewayError::MethodNotAllowed(format!("{} {}", method, uri.path()))
}

/// Render a handler panic as a 500 envelope; the server keeps running
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Internal server error");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "message": INTERNAL_ERROR_MESSAGE,
        })),
    )
        .into_response()
}
