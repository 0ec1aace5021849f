//! API configuration

use serde::Deserialize;
use std::time::Duration;

use domain_expense::WorkflowConfig;

/// API configuration
///
/// Every field can be set from an `API_`-prefixed environment variable;
/// unset fields keep their default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// PostgreSQL URL; empty runs the in-memory store
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Upper bound for a single repository call
    pub repository_timeout_ms: u64,
    /// Extra attempts for failed repository reads
    pub read_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: String::new(),
            log_level: "info".to_string(),
            repository_timeout_ms: 5000,
            read_retries: 2,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Limits for the claim workflow's repository calls
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig::new()
            .repository_timeout(Duration::from_millis(self.repository_timeout_ms))
            .read_retries(self.read_retries)
    }

    pub fn uses_database(&self) -> bool {
        !self.database_url.trim().is_empty()
    }
}
