//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable overriding [`ApiConfig::base_url`].
pub const ENV_BASE_URL: &str = "API_BASE_URL";

/// Environment variable overriding [`ApiConfig::timeout_ms`].
pub const ENV_TIMEOUT: &str = "API_TIMEOUT";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Query cache policy
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply `API_BASE_URL` / `API_TIMEOUT` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// A blank base URL is ignored. A timeout that is not a positive integer
    /// number of milliseconds falls back to the default.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL) {
            let url = url.trim();
            if !url.is_empty() {
                self.api.base_url = url.to_string();
            }
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.api.timeout_ms = match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    log::warn!("Ignoring invalid {ENV_TIMEOUT}={raw:?}");
                    defaults::timeout_ms()
                }
            };
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        url::Url::parse(&self.api.base_url)?;
        if self.api.timeout_ms == 0 {
            return Err(AppError::validation("api.timeout_ms must be > 0"));
        }
        Ok(())
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL every resource path is appended to
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            timeout_ms: defaults::timeout_ms(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Query cache policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// How long a successful read stays fresh
    #[serde(default = "defaults::stale_time")]
    pub stale_time_secs: u64,

    /// Freshness window for the specialty list, which rarely changes
    #[serde(default = "defaults::specialties_stale_time")]
    pub specialties_stale_time_secs: u64,

    /// How long an unused entry is kept before a sweep may evict it
    #[serde(default = "defaults::gc_time")]
    pub gc_time_secs: u64,

    /// Automatic retries for failed reads
    #[serde(default = "defaults::retry")]
    pub retry: u32,

    /// Delay before a read retry in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// Revalidate cached reads every time a view asks for them
    #[serde(default = "defaults::refetch_on_mount")]
    pub refetch_on_mount: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: defaults::stale_time(),
            specialties_stale_time_secs: defaults::specialties_stale_time(),
            gc_time_secs: defaults::gc_time(),
            retry: defaults::retry(),
            retry_delay_ms: defaults::retry_delay(),
            refetch_on_mount: defaults::refetch_on_mount(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // API defaults
    pub fn base_url() -> String {
        "http://localhost:8000/api".into()
    }
    pub fn timeout_ms() -> u64 {
        10_000
    }
    pub fn user_agent() -> String {
        concat!("unicatalog/", env!("CARGO_PKG_VERSION")).into()
    }

    // Cache defaults
    pub fn stale_time() -> u64 {
        5 * 60
    }
    pub fn specialties_stale_time() -> u64 {
        10 * 60
    }
    pub fn gc_time() -> u64 {
        10 * 60
    }
    pub fn retry() -> u32 {
        1
    }
    pub fn retry_delay() -> u64 {
        1_000
    }
    pub fn refetch_on_mount() -> bool {
        true
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}
