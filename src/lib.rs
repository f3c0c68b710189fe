pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod observability;
pub mod rate_limit;
pub mod secrets;
pub mod server;
pub mod validation;

use crate::backend::GeminiGenerator;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::gateway::GenerationGateway;
use crate::metrics::MetricsService;
use crate::rate_limit::RateLimiter;
use crate::secrets::EnvSecretsProvider;
use crate::server::{build_app, AppOptions, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use crate::observability::init_tracing;

/// Initialize the gateway server
pub async fn init_gateway(config: GatewayConfig) -> Result<()> {
    // Validate configuration
    config.validate()?;

    info!("Starting generation gateway");

    let api_key = config
        .backend
        .resolve_api_key(&EnvSecretsProvider::default())?;
    let generator = GeminiGenerator::new(
        &config.backend.base_url,
        &config.backend.model,
        api_key,
        config.backend.timeout(),
    )?;
    info!(model = %generator.model(), "Generation backend configured");

    let limiter = if config.rate_limiting.enabled {
        if config.rate_limiting.window_secs != 60 {
            warn!(
                requests = config.rate_limiting.requests,
                window_secs = config.rate_limiting.window_secs,
                "Rate limit is advertised per minute but enforced over a different window"
            );
        }
        Some(Arc::new(RateLimiter::from_config(&config.rate_limiting)))
    } else {
        warn!("Rate limiting disabled");
        None
    };

    let gateway = Arc::new(GenerationGateway::new(Arc::new(generator), limiter));

    let metrics = if config.metrics.enabled {
        Some(MetricsService::new()?)
    } else {
        None
    };

    let app = build_app(
        AppState::new(gateway, config.rate_limiting.clone()),
        AppOptions {
            cors_enabled: config.server.cors_enabled,
            metrics,
            body_limit: Some(config.server.max_body_bytes),
        },
    );

    // Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = bind_listener(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::Internal(format!("Server error: {}", e)))?;

    info!("Gateway stopped");
    Ok(())
}

/// Bind the listening socket; the address is logged only once bound
async fn bind_listener(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr).await.map_err(GatewayError::Io)?;

    match listener.local_addr() {
        Ok(local) => info!("Server listening on {}", local),
        Err(_) => info!("Server listening on {}", addr),
    }

    Ok(listener)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
