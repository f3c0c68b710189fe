use anyhow::Context;
use genai_gateway::{config::GatewayConfig, init_gateway, init_tracing};
use std::env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config file path from the command line or GENAI_GATEWAY_CONFIG; optional
    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var("GENAI_GATEWAY_CONFIG").ok())
        .map(PathBuf::from);

    let config = GatewayConfig::load(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration from environment".to_string(),
    })?;

    init_tracing(&config.logging);

    init_gateway(config).await.context("Gateway error")?;

    Ok(())
}
