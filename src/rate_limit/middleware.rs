use crate::gateway::GenerationGateway;
use crate::metrics;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Axum middleware applying global admission control to every request.
///
/// Runs ahead of routing and body extraction, so a denied request never costs
/// a body parse, a validation pass or a backend call.
pub async fn rate_limit_middleware(
    State(gateway): State<Arc<GenerationGateway>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match gateway.admit(Instant::now()) {
        Ok(Some(result)) => {
            let response = next.run(request).await;
            add_rate_limit_headers(response, result.limit, result.remaining)
        }
        Ok(None) => next.run(request).await,
        Err(e) => {
            warn!(path = %path, "Request rejected by rate limiter");
            metrics::record_rate_limited(&path);
            e.into_response()
        }
    }
}

/// Add rate limit headers to admitted responses
pub fn add_rate_limit_headers(mut response: Response, limit: u32, remaining: u32) -> Response {
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
    response
}
