//! Configuration loader
//!
//! Loads application configuration from environment variables or a TOML
//! file.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes a handful of conventional paths for config files
//!
//! ## Environment Variables
//! - `PACKTRAIL_DB_PATH`: SQLite file path (required)
//! - `PACKTRAIL_DB_POOL_SIZE`: connection pool size
//! - `PACKTRAIL_PROVIDER`: active provider, `track123` or `trackingmore`
//!   (required)
//! - `PACKTRAIL_SYNC_INTERVAL`: seconds between periodic syncs
//! - `PACKTRAIL_SYNC_ENABLED`: whether periodic syncing is on (true/false)
//! - `PACKTRAIL_TRACK123_BASE_URL` / `PACKTRAIL_TRACKINGMORE_BASE_URL`:
//!   API base overrides

use std::path::{Path, PathBuf};

use packtrail_domain::{
    ApiProvider, Config, DatabaseConfig, PacktrailError, Result, SyncConfig,
};

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `PacktrailError::Config` when neither source yields a valid
/// configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "environment incomplete, trying config file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `PacktrailError::Config` when required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("PACKTRAIL_DB_PATH")?;
    let pool_size = match std::env::var("PACKTRAIL_DB_POOL_SIZE") {
        Ok(raw) => raw
            .parse::<u32>()
            .map_err(|e| PacktrailError::Config(format!("invalid pool size: {e}")))?,
        Err(_) => 4,
    };

    let provider = parse_provider(&env_var("PACKTRAIL_PROVIDER")?)?;
    let interval_seconds = match std::env::var("PACKTRAIL_SYNC_INTERVAL") {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| PacktrailError::Config(format!("invalid sync interval: {e}")))?,
        Err(_) => 1800,
    };
    let enabled = env_bool("PACKTRAIL_SYNC_ENABLED", true);

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size },
        sync: SyncConfig {
            provider,
            interval_seconds,
            enabled,
            track123_base_url: std::env::var("PACKTRAIL_TRACK123_BASE_URL").ok(),
            trackingmore_base_url: std::env::var("PACKTRAIL_TRACKINGMORE_BASE_URL").ok(),
        },
    })
}

/// Load configuration from a TOML file.
///
/// With `path` unset, probes [`probe_config_paths`] and takes the first
/// file that exists.
///
/// # Errors
/// Returns `PacktrailError::Config` when no file is found or the file
/// does not parse.
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let resolved: PathBuf = match path {
        Some(explicit) => explicit.to_path_buf(),
        None => probe_config_paths()
            .into_iter()
            .find(|candidate| candidate.exists())
            .ok_or_else(|| PacktrailError::Config("no config file found".into()))?,
    };

    let raw = std::fs::read_to_string(&resolved).map_err(|e| {
        PacktrailError::Config(format!("cannot read {}: {e}", resolved.display()))
    })?;
    let config: Config = toml::from_str(&raw).map_err(|e| {
        PacktrailError::Config(format!("cannot parse {}: {e}", resolved.display()))
    })?;

    tracing::info!(path = %resolved.display(), "configuration loaded from file");
    Ok(config)
}

/// Paths probed for a configuration file, in order.
pub fn probe_config_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("config.toml"),
        PathBuf::from("packtrail.toml"),
        PathBuf::from("../config.toml"),
        PathBuf::from("../packtrail.toml"),
    ]
}

/// Parse a provider name as used in env/config values.
pub fn parse_provider(raw: &str) -> Result<ApiProvider> {
    match raw.to_lowercase().as_str() {
        "track123" => Ok(ApiProvider::Track123),
        "trackingmore" => Ok(ApiProvider::Trackingmore),
        other => Err(PacktrailError::Config(format!("unknown provider '{other}'"))),
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| PacktrailError::Config(format!("missing environment variable {name}")))
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}
