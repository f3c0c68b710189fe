use crate::error::{GatewayError, Result};
use secrecy::Secret;
use std::collections::HashMap;
use std::env;
use std::fs;
use tracing::debug;

/// Secret string wrapper that prevents accidental exposure
pub type SecretString = Secret<String>;

/// Secrets provider interface
pub trait SecretsProvider {
    /// Get a secret by key
    fn get_secret(&self, key: &str) -> Result<SecretString>;

    /// Check if a secret exists
    fn has_secret(&self, key: &str) -> bool;
}

/// Environment variable secrets provider
#[derive(Debug, Clone)]
pub struct EnvSecretsProvider {
    prefix: String,
}

impl EnvSecretsProvider {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn env_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase())
    }
}

impl Default for EnvSecretsProvider {
    fn default() -> Self {
        Self::new("GENAI_GATEWAY_SECRET_")
    }
}

impl SecretsProvider for EnvSecretsProvider {
    fn get_secret(&self, key: &str) -> Result<SecretString> {
        env::var(self.env_key(key))
            .map(Secret::new)
            .map_err(|_| GatewayError::Config(format!("Secret '{}' not found in environment", key)))
    }

    fn has_secret(&self, key: &str) -> bool {
        env::var(self.env_key(key)).is_ok()
    }
}

/// In-memory secrets provider (for testing or simple deployments)
#[derive(Clone)]
pub struct InMemorySecretsProvider {
    secrets: HashMap<String, String>,
}

impl InMemorySecretsProvider {
    pub fn new(secrets: HashMap<String, String>) -> Self {
        Self { secrets }
    }
}

impl SecretsProvider for InMemorySecretsProvider {
    fn get_secret(&self, key: &str) -> Result<SecretString> {
        self.secrets
            .get(key)
            .map(|value| Secret::new(value.clone()))
            .ok_or_else(|| GatewayError::Config(format!("Secret '{}' not found", key)))
    }

    fn has_secret(&self, key: &str) -> bool {
        self.secrets.contains_key(key)
    }
}

/// Resolve a configured secret value.
///
/// Supports formats:
/// - `secret://key`: looked up through `provider`
/// - `env://VAR`: read from an environment variable
/// - `file:///path/to/file`: read from a file, surrounding whitespace trimmed
/// - anything else is taken literally
pub fn resolve_secret_ref(value: &str, provider: &dyn SecretsProvider) -> Result<SecretString> {
    if let Some(key) = value.strip_prefix("secret://") {
        debug!("Resolving secret reference: {}", key);
        provider.get_secret(key)
    } else if let Some(env_var) = value.strip_prefix("env://") {
        debug!("Resolving environment variable: {}", env_var);
        env::var(env_var).map(Secret::new).map_err(|_| {
            GatewayError::Config(format!("Environment variable '{}' not found", env_var))
        })
    } else if let Some(path) = value.strip_prefix("file://") {
        debug!("Resolving file reference: {}", path);
        fs::read_to_string(path)
            .map(|s| Secret::new(s.trim().to_string()))
            .map_err(|e| GatewayError::Config(format!("Failed to read file {}: {}", path, e)))
    } else {
        Ok(Secret::new(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_env_secrets_provider() {
        std::env::set_var("GENAI_GATEWAY_SECRET_TEST_KEY", "test_value");

        let provider = EnvSecretsProvider::default();
        assert!(provider.has_secret("test_key"));
        assert_eq!(provider.get_secret("test_key").unwrap().expose_secret(), "test_value");
        assert!(!provider.has_secret("absent_key"));
    }

    #[test]
    fn test_in_memory_provider() {
        let provider = InMemorySecretsProvider::new(HashMap::from([(
            "gemini".to_string(),
            "abc".to_string(),
        )]));

        assert!(provider.has_secret("gemini"));
        assert_eq!(provider.get_secret("gemini").unwrap().expose_secret(), "abc");
        assert!(provider.get_secret("other").is_err());
    }

    #[test]
    fn test_resolve_secret_ref() {
        let provider = InMemorySecretsProvider::new(HashMap::from([(
            "gemini".to_string(),
            "from-provider".to_string(),
        )]));

        let secret = resolve_secret_ref("secret://gemini", &provider).unwrap();
        assert_eq!(secret.expose_secret(), "from-provider");

        std::env::set_var("GENAI_GATEWAY_TEST_RESOLVE", "from-env");
        let secret = resolve_secret_ref("env://GENAI_GATEWAY_TEST_RESOLVE", &provider).unwrap();
        assert_eq!(secret.expose_secret(), "from-env");

        let secret = resolve_secret_ref("plain-value", &provider).unwrap();
        assert_eq!(secret.expose_secret(), "plain-value");

        assert!(resolve_secret_ref("env://GENAI_GATEWAY_TEST_UNSET_VAR", &provider).is_err());
    }

    #[test]
    fn test_resolve_file_ref() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  file-key  ").unwrap();

        let reference = format!("file://{}", file.path().display());
        let provider = InMemorySecretsProvider::new(HashMap::new());
        let secret = resolve_secret_ref(&reference, &provider).unwrap();
        assert_eq!(secret.expose_secret(), "file-key");
    }
}
