//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ICAL_CACHE_*)
//! 2. TOML config file (if ICAL_CACHE_CONFIG_FILE set)
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

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ICAL_CACHE_*)
/// 2. TOML config file (if ICAL_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the cached calendar files.
    ///
    /// Set via ICAL_CACHE_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Path to the SQLite database tracking which urls each document references.
    ///
    /// Set via ICAL_CACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Seconds after which a tracked calendar is due for a refresh check.
    ///
    /// Set via ICAL_CACHE_STALE_AFTER_SECS environment variable.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via ICAL_CACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per calendar.
    ///
    /// Set via ICAL_CACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via ICAL_CACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./ical-cache")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ical-cache.sqlite")
}

fn default_stale_after_secs() -> u64 {
    3600
}

fn default_user_agent() -> String {
    "ical-cache/0.1".into()
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            db_path: default_db_path(),
            stale_after_secs: default_stale_after_secs(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Staleness threshold for the refresh worker.
    pub fn stale_after(&self) -> chrono::Duration {
        i64::try_from(self.stale_after_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ICAL_CACHE_`
    /// 2. TOML file from `ICAL_CACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("ICAL_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ICAL_CACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("./ical-cache"));
        assert_eq!(config.db_path, PathBuf::from("./ical-cache.sqlite"));
        assert_eq!(config.stale_after_secs, 3600);
        assert_eq!(config.user_agent, "ical-cache/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_stale_after_duration() {
        let config = AppConfig { stale_after_secs: 90, ..Default::default() };
        assert_eq!(config.stale_after(), chrono::Duration::seconds(90));
    }

    #[test]
    fn test_load_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("ICAL_CACHE_STALE_AFTER_SECS", "600");
            jail.set_env("ICAL_CACHE_CACHE_DIR", "/var/cache/ical");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.stale_after_secs, 600);
            assert_eq!(config.cache_dir, PathBuf::from("/var/cache/ical"));
            assert_eq!(config.user_agent, "ical-cache/0.1");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("ical-cache.toml", "stale_after_secs = 120\nuser_agent = \"wiki/1.0\"")?;
            jail.set_env("ICAL_CACHE_CONFIG_FILE", "ical-cache.toml");
            jail.set_env("ICAL_CACHE_STALE_AFTER_SECS", "300");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.stale_after_secs, 300);
            assert_eq!(config.user_agent, "wiki/1.0");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("ICAL_CACHE_STALE_AFTER_SECS", "0");

            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "stale_after_secs"));
            Ok(())
        });
    }
}
