//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_connections` is 0 or exceeds 64
    /// - `user_agent` or either base URL is empty
    /// - `title_date` is not a `YYYY-MM-DD` date
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                field: "max_connections".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_connections > 64 {
            return Err(ConfigError::Invalid { field: "max_connections".into(), reason: "must not exceed 64".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for (field, value) in [("versioner_url", &self.versioner_url), ("admin_url", &self.admin_url)] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
        }

        if chrono::NaiveDate::parse_from_str(&self.title_date, "%Y-%m-%d").is_err() {
            return Err(ConfigError::Invalid {
                field: "title_date".into(),
                reason: format!("expected YYYY-MM-DD, got {:?}", self.title_date),
            });
        }

        if self.max_connections > 8 {
            tracing::warn!(
                max_connections = self.max_connections,
                "high outbound connection ceiling; the eCFR API rate limits aggressive clients"
            );
        }

        Ok(())
    }
}
