use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Credentials and connection settings shared by the REST and streaming clients.
///
/// The key and secret are never mutated after construction.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub testnet: bool,
    pub use_ssl: bool,
    pub base_url: Option<String>,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 5)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("testnet", &self.testnet)?;
        state.serialize_field("use_ssl", &self.use_ssl)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            testnet: bool,
            #[serde(default = "default_use_ssl")]
            use_ssl: bool,
            base_url: Option<String>,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            testnet: helper.testnet,
            use_ssl: helper.use_ssl,
            base_url: helper.base_url,
        })
    }
}

const fn default_use_ssl() -> bool {
    true
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet: false,
            use_ssl: true,
            base_url: None,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `DELIVERY_API_KEY`)
    /// - `{PREFIX}_SECRET_KEY`
    /// - `{PREFIX}_TESTNET` (optional, defaults to false)
    /// - `{PREFIX}_USE_SSL` (optional, defaults to true)
    /// - `{PREFIX}_BASE_URL` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let testnet = parse_flag(&format!("{}_TESTNET", prefix), false)?;
        let use_ssl = parse_flag(&format!("{}_USE_SSL", prefix), true)?;
        let base_url = env::var(format!("{}_BASE_URL", prefix)).ok();

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet,
            use_ssl,
            base_url,
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    ///
    /// A missing file is not an error; system environment variables are used instead.
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Create configuration for public endpoints and market streams only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Set testnet mode
    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Choose between `https`/`wss` and plain `http`/`ws`
    #[must_use]
    pub const fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    /// Set custom base URL (host and optional path prefix, without scheme)
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

fn parse_flag(var: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var) {
        Ok(value) => value.trim().parse::<bool>().map_err(|_| {
            ConfigError::InvalidConfiguration(format!("{} must be true or false, got '{}'", var, value))
        }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_redacts_secrets() {
        let config = ExchangeConfig::new("key".to_string(), "very-secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("very-secret"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ExchangeConfig =
            serde_json::from_str(r#"{"api_key":"k","secret_key":"s","base_url":null}"#).unwrap();
        assert!(config.use_ssl);
        assert!(!config.testnet);
        assert_eq!(config.api_key(), "k");
        assert_eq!(config.secret_key(), "s");
    }

    #[test]
    fn test_read_only_has_no_credentials() {
        assert!(!ExchangeConfig::read_only().has_credentials());
        assert!(ExchangeConfig::new("k".into(), "s".into()).has_credentials());
    }

    #[test]
    fn test_from_env() {
        env::set_var("DAPIX_CFG_TEST_API_KEY", "env-key");
        env::set_var("DAPIX_CFG_TEST_SECRET_KEY", "env-secret");
        env::set_var("DAPIX_CFG_TEST_USE_SSL", "false");

        let config = ExchangeConfig::from_env("dapix_cfg_test").unwrap();
        assert_eq!(config.api_key(), "env-key");
        assert!(!config.use_ssl);
        assert!(!config.testnet);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_from_env_missing_key() {
        let err = ExchangeConfig::from_env("dapix_cfg_missing").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvironmentVariable(var) if var == "DAPIX_CFG_MISSING_API_KEY"));
    }

    #[test]
    fn test_from_env_bad_flag() {
        env::set_var("DAPIX_CFG_FLAG_API_KEY", "k");
        env::set_var("DAPIX_CFG_FLAG_SECRET_KEY", "s");
        env::set_var("DAPIX_CFG_FLAG_TESTNET", "maybe");

        let err = ExchangeConfig::from_env("dapix_cfg_flag").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }
}
