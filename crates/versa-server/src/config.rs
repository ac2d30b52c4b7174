//! Configuration from environment variables
//!
//! Settings are read from `VERSA_*` variables after loading a `.env` file
//! when one exists.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `VERSA_ADDR` | `127.0.0.1:8080` | listen address |
//! | `VERSA_VERSION_HEADER` | `x-api-version` | header carrying the requested version |
//! | `VERSA_DEFAULT_VERSION` | unset | version used when a request names none |
//! | `VERSA_LOG` | `info` | `tracing` filter directives |
//! | `VERSA_ENV` | `development` | environment profile |

use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use versa_core::ApiVersion;

/// Error type for configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Envy(#[from] envy::Error),
}

/// Load `.env` from the working directory if present
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
}

fn default_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_version_header() -> String {
    "x-api-version".to_string()
}

fn default_log() -> String {
    "info".to_string()
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_version_header")]
    pub version_header: String,
    #[serde(default)]
    pub default_version: Option<ApiVersion>,
    #[serde(default = "default_log")]
    pub log: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            version_header: default_version_header(),
            default_version: None,
            log: default_log(),
        }
    }
}

impl ServerConfig {
    /// Read `VERSA_*` variables, loading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Ok(envy::prefixed("VERSA_").from_env::<Self>()?)
    }

    fn from_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed("VERSA_").from_iter::<_, Self>(vars)?)
    }
}

/// Install a `tracing-subscriber` fmt subscriber filtered by `config.log`
///
/// Does nothing when a global subscriber is already set.
pub fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_new(&config.log).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Environment profile for the application.
///
/// Detected from the `VERSA_ENV` environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Verbose errors
    Development,
    /// Internal error details are masked
    Production,
    /// Custom environment name for specialized deployments.
    Custom(String),
}

impl Environment {
    /// Detect the current environment from `VERSA_ENV`.
    ///
    /// `production`/`prod` and `development`/`dev` are recognized, an unset
    /// variable means development and anything else is kept as a custom name.
    pub fn current() -> Self {
        Self::from_name(std::env::var("VERSA_ENV").ok().as_deref())
    }

    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("production") | Some("prod") => Self::Production,
            Some("development") | Some("dev") | None => Self::Development,
            Some(other) => Self::Custom(other.to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Check if error details should be shown.
    pub fn show_error_details(&self) -> bool {
        !self.is_production()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_iter(Vec::new()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.version_header, "x-api-version");
    }

    #[test]
    fn test_prefixed_variables() {
        let config = ServerConfig::from_iter(vars(&[
            ("VERSA_ADDR", "0.0.0.0:3000"),
            ("VERSA_VERSION_HEADER", "api-version"),
            ("VERSA_DEFAULT_VERSION", "2024-01-01"),
            ("VERSA_LOG", "versa_server=debug"),
            ("UNRELATED", "x"),
        ]))
        .unwrap();

        assert_eq!(config.addr, "0.0.0.0:3000");
        assert_eq!(config.version_header, "api-version");
        assert_eq!(config.default_version, Some("2024-01-01".parse().unwrap()));
        assert_eq!(config.log, "versa_server=debug");
    }

    #[test]
    fn test_invalid_default_version() {
        let err = ServerConfig::from_iter(vars(&[("VERSA_DEFAULT_VERSION", "latest")])).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_environment_names() {
        assert_eq!(Environment::from_name(Some("prod")), Environment::Production);
        assert_eq!(Environment::from_name(None), Environment::Development);
        assert_eq!(Environment::from_name(Some("staging")).as_str(), "staging");
        assert!(!Environment::Production.show_error_details());
    }
}
