//! Configuration loading.
//!
//! Settings come from an optional TOML file merged with `PARLEY_*`
//! environment variables. Precedence: environment over file over defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::language::LanguageCode;
use crate::logging::LoggingConfig;

/// Connection settings for the remote NLU service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Cloud project the agent lives in.
    pub project_id: String,

    /// Service endpoint base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token for API calls. Falls back to the PARLEY_ACCESS_TOKEN
    /// environment variable when unset.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Session id used for predictions when the caller doesn't pass one.
    /// Generated randomly at connector construction when unset.
    #[serde(default)]
    pub default_session: Option<String>,

    #[serde(default = "default_language")]
    pub default_language: LanguageCode,

    /// Platforms that receive rich response messages on export.
    #[serde(default = "default_rich_platforms")]
    pub rich_platforms: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://dialogflow.googleapis.com".to_string()
}

fn default_language() -> LanguageCode {
    LanguageCode::En
}

fn default_rich_platforms() -> Vec<String> {
    vec!["telegram".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            endpoint: default_endpoint(),
            access_token: None,
            default_session: None,
            default_language: default_language(),
            rich_platforms: default_rich_platforms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Top-level configuration file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub connector: ConnectorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ParleyConfig {
    /// Load configuration from an optional file plus `PARLEY_*` environment
    /// variables (e.g. `PARLEY_CONNECTOR__PROJECT_ID`).
    pub fn load(path: Option<&Path>) -> Result<Self, ApiError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("PARLEY")
                .separator("__")
                .try_parsing(true),
        );
        let settings = builder
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        settings
            .try_deserialize()
            .map_err(|e| ApiError::ConfigError(format!("Invalid configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.endpoint, "https://dialogflow.googleapis.com");
        assert_eq!(config.default_language, LanguageCode::En);
        assert_eq!(config.rich_platforms, vec!["telegram"]);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_parse_config_file() {
        let src = r#"
            [connector]
            project_id = "my-gcp-project"
            default_language = "it"
            rich_platforms = ["telegram", "slack"]

            [logging]
            level = "debug"
        "#;
        let config: ParleyConfig = toml::from_str(src).unwrap();
        assert_eq!(config.connector.project_id, "my-gcp-project");
        assert_eq!(config.connector.default_language, LanguageCode::It);
        assert_eq!(config.connector.rich_platforms.len(), 2);
        assert_eq!(config.logging.level, "debug");
    }
}
