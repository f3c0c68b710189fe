use crate::rate_limit::RateLimitResult;
use crate::server::AVAILABLE_ENDPOINTS;
use crate::validation::ValidationError;
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Message returned to clients that have been denied admission
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please try again later.";

/// Generic message for faults that must not leak internal detail
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong on our end";

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    MalformedRequest(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Rate limit exceeded")]
    RateLimited(RateLimitResult),

    #[error("{summary}: {message}")]
    Backend {
        /// Client-facing summary, fixed per endpoint
        summary: &'static str,
        /// Text of the underlying backend failure
        message: String,
    },

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure categories surfaced to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MalformedRequest,
    PayloadTooLarge,
    ValidationError,
    RateLimited,
    BackendError,
    RouteNotFound,
    MethodNotAllowed,
    Internal,
}

impl FailureKind {
    /// The one table mapping failure kinds to HTTP status codes
    pub fn status_code(self) -> StatusCode {
        match self {
            FailureKind::MalformedRequest => StatusCode::BAD_REQUEST,
            FailureKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            FailureKind::ValidationError => StatusCode::BAD_REQUEST,
            FailureKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            FailureKind::BackendError => StatusCode::INTERNAL_SERVER_ERROR,
            FailureKind::RouteNotFound => StatusCode::NOT_FOUND,
            FailureKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl GatewayError {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            GatewayError::MalformedRequest(_) => FailureKind::MalformedRequest,
            GatewayError::PayloadTooLarge(_) => FailureKind::PayloadTooLarge,
            GatewayError::Validation(_) => FailureKind::ValidationError,
            GatewayError::RateLimited(_) => FailureKind::RateLimited,
            GatewayError::Backend { .. } => FailureKind::BackendError,
            GatewayError::RouteNotFound(_) => FailureKind::RouteNotFound,
            GatewayError::MethodNotAllowed(_) => FailureKind::MethodNotAllowed,
            GatewayError::Config(_) | GatewayError::Internal(_) | GatewayError::Io(_) => {
                FailureKind::Internal
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// JSON body of the error envelope
    pub fn envelope(&self) -> Value {
        match self {
            GatewayError::MalformedRequest(message) => json!({ "error": message }),
            GatewayError::PayloadTooLarge(_) => json!({ "error": "Request body too large" }),
            GatewayError::Validation(e) => json!({ "error": e.to_string() }),
            GatewayError::RateLimited(_) => json!({
                "error": "Rate limit exceeded",
                "message": RATE_LIMIT_MESSAGE,
            }),
            GatewayError::Backend { summary, message } => json!({
                "error": summary,
                "message": message,
            }),
            GatewayError::RouteNotFound(_) => json!({
                "error": "Endpoint not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
            GatewayError::MethodNotAllowed(_) => json!({ "error": "Method not allowed" }),
            GatewayError::Config(_) | GatewayError::Internal(_) | GatewayError::Io(_) => json!({
                "error": "Internal server error",
                "message": INTERNAL_ERROR_MESSAGE,
            }),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.kind() == FailureKind::Internal {
            error!(error = %self, "Internal server error");
        }

        let mut headers = HeaderMap::new();
        if let GatewayError::RateLimited(result) = &self {
            headers.insert("X-RateLimit-Limit", HeaderValue::from(result.limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(result.remaining));
            headers.insert("X-RateLimit-Reset", HeaderValue::from(result.reset_after));
            if let Some(retry) = result.retry_after {
                headers.insert("Retry-After", HeaderValue::from(retry));
            }
        }

        (status, headers, Json(self.envelope())).into_response()
    }
}
