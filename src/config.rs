// src/config.rs

//! Configuration loading utilities.
//!
//! Resolution order: built-in defaults, then the TOML file (if it loads),
//! then `API_BASE_URL` / `API_TIMEOUT` from the environment.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Load configuration from a TOML file and apply environment overrides.
///
/// Falls back to defaults if the file cannot be loaded, but rejects a
/// resolved configuration that fails validation.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load_or_default(path)
    } else {
        log::debug!("No config file at {path:?}, using defaults");
        Config::default()
    };
    config.apply_env();

    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;

    log::debug!(
        "Using API at {} (timeout {} ms)",
        config.api.base_url,
        config.api.timeout_ms
    );
    Ok(config)
}
