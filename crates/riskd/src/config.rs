//! Application configuration.
//!
//! Thresholds always come from the command line. Everything else can be set
//! in a TOML file and overridden by flags.

use std::path::Path;

use riskd_server::{MetricsConfig, ServerConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "RISKD_CONFIG";

/// Used when neither `--config` nor `RISKD_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Resolve and load the config file.
    ///
    /// An explicit path (argument, then `RISKD_CONFIG`) must exist. The
    /// default path is optional; without it, built-in defaults apply.
    pub fn load(explicit: Option<&str>) -> AppResult<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok();
        match explicit.map(str::to_owned).or(env_path) {
            Some(path) => Self::from_file(&path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            None => {
                tracing::debug!(path = DEFAULT_CONFIG_PATH, "No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        Self::from_toml(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config {path}: {e}")))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskd_server::SessionPolicy;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.order_port, 55555);
        assert_eq!(config.server.trade_port, 55556);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_sections() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            bind_address = "127.0.0.1"
            trade_port = 7001
            read_timeout_ms = 5000
            session_policy = "reset_on_new_connection"

            [metrics]
            enabled = true
            port = 9100
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.order_port, 55555);
        assert_eq!(config.server.trade_port, 7001);
        assert_eq!(config.server.read_timeout_ms, 5000);
        assert_eq!(
            config.server.session_policy,
            SessionPolicy::ResetOnNewConnection
        );
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9100);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [server]
            session_policy = "sometimes"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = AppConfig::load(Some("/nonexistent/riskd.toml"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("order_port"));
        assert!(toml_str.contains("session_policy"));
    }
}
