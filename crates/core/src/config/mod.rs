//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ECFR_*)
//! 2. TOML config file (if ECFR_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// How the section fetch plan treats documents that are already cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionCachePolicy {
    /// Log cache hits but refetch every version document anyway.
    #[default]
    AlwaysRefetch,
    /// Only fetch version documents missing from the cache.
    RespectCache,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ECFR_*)
/// 2. TOML config file (if ECFR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interface the HTTP server binds to.
    ///
    /// Set via ECFR_HOST environment variable.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    ///
    /// Set via ECFR_PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to SQLite cache database.
    ///
    /// Set via ECFR_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the eCFR versioner API.
    #[serde(default = "default_versioner_url")]
    pub versioner_url: String,

    /// Base URL of the eCFR admin API (agency directory).
    #[serde(default = "default_admin_url")]
    pub admin_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via ECFR_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via ECFR_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Ceiling on simultaneous outbound connections.
    ///
    /// Set via ECFR_MAX_CONNECTIONS environment variable.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Snapshot date used for full-title documents (YYYY-MM-DD).
    #[serde(default = "default_title_date")]
    pub title_date: String,

    /// Cache policy for version documents in the section fetch plan.
    ///
    /// Set via ECFR_VERSION_CACHE_POLICY (`always_refetch` or `respect_cache`).
    #[serde(default)]
    pub version_cache_policy: VersionCachePolicy,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3001
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ecfr-cache.sqlite")
}

fn default_versioner_url() -> String {
    "https://www.ecfr.gov/api/versioner/v1".into()
}

fn default_admin_url() -> String {
    "https://www.ecfr.gov/api/admin/v1".into()
}

fn default_user_agent() -> String {
    "ecfr-counts/0.1".into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_connections() -> usize {
    1
}

fn default_title_date() -> String {
    "2025-03-31".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            versioner_url: default_versioner_url(),
            admin_url: default_admin_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_connections: default_max_connections(),
            title_date: default_title_date(),
            version_cache_policy: VersionCachePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ECFR_`
    /// 2. TOML file from `ECFR_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ECFR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ECFR_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
