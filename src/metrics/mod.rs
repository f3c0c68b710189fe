use crate::error::{GatewayError, Result};
use crate::server::AVAILABLE_ENDPOINTS;
use axum::{
    extract::{Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Metrics service exposing the Prometheus exposition format
#[derive(Clone)]
pub struct MetricsService {
    handle: Arc<PrometheusHandle>,
}

impl MetricsService {
    /// Install the global recorder. Only one recorder may exist per process.
    pub fn new() -> Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            GatewayError::Internal(format!("Failed to install metrics recorder: {}", e))
        })?;

        Self::register_metrics();

        info!("Metrics service initialized successfully");

        Ok(Self {
            handle: Arc::new(handle),
        })
    }

    fn register_metrics() {
        describe_counter!(
            "genai_gateway_requests_total",
            "Total number of HTTP requests received"
        );
        describe_histogram!(
            "genai_gateway_request_duration_seconds",
            "HTTP request latencies in seconds"
        );
        describe_counter!(
            "genai_gateway_rate_limited_total",
            "Total number of requests rejected by admission control"
        );
        describe_counter!(
            "genai_gateway_backend_requests_total",
            "Total number of generation backend calls"
        );
        describe_counter!(
            "genai_gateway_backend_errors_total",
            "Total number of failed generation backend calls"
        );
        describe_histogram!(
            "genai_gateway_backend_duration_seconds",
            "Generation backend latencies in seconds"
        );

        debug!("All metrics registered with descriptions");
    }

    /// Render metrics in Prometheus format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Metrics endpoint handler
pub async fn metrics_handler(State(service): State<MetricsService>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        service.render(),
    )
}

/// Middleware recording request counts and latencies
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = route_label(request.uri().path());
    let started = Instant::now();

    let response = next.run(request).await;

    record_request(
        &method,
        path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Record a request metric
pub fn record_request(method: &str, path: &str, status: u16, duration: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("genai_gateway_requests_total", &labels).increment(1);
    histogram!("genai_gateway_request_duration_seconds", &labels).record(duration);
}

/// Record a request denied by admission control
pub fn record_rate_limited(path: &str) {
    counter!("genai_gateway_rate_limited_total", "path" => route_label(path)).increment(1);
}

/// Record one backend call
pub fn record_backend_call(success: bool, duration: f64) {
    counter!("genai_gateway_backend_requests_total").increment(1);
    histogram!("genai_gateway_backend_duration_seconds").record(duration);

    if !success {
        counter!("genai_gateway_backend_errors_total").increment(1);
    }
}

/// Known endpoints keep their path as label, everything else collapses into one
fn route_label(path: &str) -> &'static str {
    AVAILABLE_ENDPOINTS
        .iter()
        .copied()
        .find(|endpoint| *endpoint == path)
        .unwrap_or(if path == "/metrics" {
            "/metrics"
        } else {
            "unmatched"
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/api/generate"), "/api/generate");
        assert_eq!(route_label("/"), "/");
        assert_eq!(route_label("/metrics"), "/metrics");
        assert_eq!(route_label("/api/users/123"), "unmatched");
        assert_eq!(route_label("/api/generate/extra"), "unmatched");
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed: the facade turns these into no-ops
        record_request("POST", "/api/generate", 200, 0.123);
        record_rate_limited("/api/chat");
        record_backend_call(true, 0.5);
        record_backend_call(false, 1.5);
    }
}
