//! Configuration structures

use serde::{Deserialize, Serialize};

use crate::types::ApiProvider;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

/// Local database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file.
    pub path: String,
    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Batch sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Which provider drives batch syncs.
    pub provider: ApiProvider,
    /// Seconds between periodic syncs.
    #[serde(default = "default_sync_interval")]
    pub interval_seconds: u64,
    /// Whether periodic syncing is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Override for the Track123 API base URL (tests, staging).
    #[serde(default)]
    pub track123_base_url: Option<String>,
    /// Override for the Trackingmore API base URL (tests, staging).
    #[serde(default)]
    pub trackingmore_base_url: Option<String>,
}

fn default_pool_size() -> u32 {
    4
}

fn default_sync_interval() -> u64 {
    1800
}

fn default_true() -> bool {
    true
}
