use crate::error::{GatewayError, Result};
use crate::rate_limit::RateLimitConfig;
use crate::secrets::{resolve_secret_ref, SecretString, SecretsProvider};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Generation backend configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Gemini REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
    /// API key or a `secret://`, `env://` or `file://` reference to it
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Backend request timeout in seconds
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    #[serde(default)]
    pub filter: Option<String>,
}

/// Metrics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Expose Prometheus metrics at `/metrics`
    #[serde(default)]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_api_key() -> String {
    "env://GEMINI_API_KEY".to_string()
}

fn default_backend_timeout() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: default_api_key(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

impl BackendConfig {
    /// Backend request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the configured API key
    pub fn resolve_api_key(&self, provider: &dyn SecretsProvider) -> Result<SecretString> {
        resolve_secret_ref(&self.api_key, provider)
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from an optional file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides for `HOST`, `PORT`, `GEMINI_API_KEY`, `GEMINI_MODEL`
    /// and `GEMINI_BASE_URL` using `lookup`
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| GatewayError::Config(format!("Invalid PORT value: {}", port)))?;
        }
        if lookup("GEMINI_API_KEY").is_some() {
            self.backend.api_key = default_api_key();
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.backend.model = model;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            self.backend.base_url = base_url;
        }

        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.requests == 0 {
            return Err(GatewayError::Config(
                "Rate limit requests must be > 0".to_string(),
            ));
        }
        if self.rate_limiting.window_secs == 0 {
            return Err(GatewayError::Config(
                "Rate limit window must be > 0".to_string(),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(GatewayError::Config(
                "Maximum body size must be > 0".to_string(),
            ));
        }

        let base_url = &self.backend.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(GatewayError::Config(format!(
                "Backend URL must start with http:// or https://: {}",
                base_url
            )));
        }
        if self.backend.model.trim().is_empty() {
            return Err(GatewayError::Config(
                "Backend model cannot be empty".to_string(),
            ));
        }
        if self.backend.timeout_secs == 0 {
            return Err(GatewayError::Config(
                "Backend timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::InMemorySecretsProvider;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  cors_enabled: false

backend:
  model: "gemini-1.5-flash"
  api_key: "secret://gemini"
  timeout_secs: 10

rate_limiting:
  requests: 100
  window_secs: 60

logging:
  format: json

metrics:
  enabled: true
"#;

        let config = GatewayConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(!config.server.cors_enabled);
        assert_eq!(config.backend.model, "gemini-1.5-flash");
        assert_eq!(config.backend.timeout(), Duration::from_secs(10));
        assert_eq!(config.rate_limiting.requests, 100);
        assert_eq!(config.rate_limiting.window_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = GatewayConfig::from_yaml("{}").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert!(config.server.cors_enabled);
        assert_eq!(config.server.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.backend.model, "gemini-pro");
        assert_eq!(config.backend.api_key, "env://GEMINI_API_KEY");
        assert_eq!(config.rate_limiting.requests, 300);
        assert_eq!(config.rate_limiting.window_secs, 300);
        assert!(config.rate_limiting.enabled);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("PORT", "9090"),
            ("HOST", "127.0.0.1"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
        ]);

        let config = GatewayConfig::default()
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.backend.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_env_api_key_takes_precedence_over_file() {
        let mut config = GatewayConfig::default();
        config.backend.api_key = "literal-key".to_string();

        let config = config
            .with_env_overrides(|key| (key == "GEMINI_API_KEY").then(|| "k".to_string()))
            .unwrap();
        assert_eq!(config.backend.api_key, "env://GEMINI_API_KEY");
    }

    #[test]
    fn test_invalid_port_override() {
        let result = GatewayConfig::default()
            .with_env_overrides(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = GatewayConfig::default();
        config.rate_limiting.requests = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.rate_limiting.window_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_backend() {
        let mut config = GatewayConfig::default();
        config.backend.base_url = "invalid-url".to_string();
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.backend.model = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_api_key() {
        let mut config = GatewayConfig::default();
        config.backend.api_key = "secret://gemini".to_string();

        let provider =
            InMemorySecretsProvider::new(HashMap::from([("gemini".to_string(), "abc".to_string())]));
        let key = config.backend.resolve_api_key(&provider).unwrap();
        assert_eq!(key.expose_secret(), "abc");
    }

    #[test]
    fn test_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "server:\n  port: 7000\n").unwrap();

        let config = GatewayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 7000);

        assert!(GatewayConfig::from_file("/nonexistent/genai-gateway.yaml").is_err());
    }
}
