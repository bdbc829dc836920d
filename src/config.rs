//! Server and sync-core configuration
//!
//! All knobs for the sync core live here: data directory, bind address,
//! heartbeat cadence, flush quiescence window, client capacity, cache TTLs.
//! Loadable from a JSON file; every field has a default so a partial config
//! file is valid.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TombolaConfig {
    /// Data directory holding the durable state file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins (empty = permissive, for development)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Heartbeat interval for live push connections, in seconds
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Quiescence window for the durable-flush debounce, in milliseconds
    #[serde(default = "default_flush_quiescence_ms")]
    pub flush_quiescence_ms: u64,

    /// Maximum concurrently live push connections
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,

    /// Default cache TTL in milliseconds, for domains without an override
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Per-domain cache TTL overrides, in milliseconds
    #[serde(default)]
    pub cache_ttl_overrides_ms: HashMap<String, u64>,

    /// Interval between periodic cache sweeps, in seconds
    #[serde(default = "default_cache_sweep_interval_secs")]
    pub cache_sweep_interval_secs: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_flush_quiescence_ms() -> u64 {
    1000
}

fn default_max_clients() -> usize {
    2000
}

fn default_cache_ttl_ms() -> u64 {
    30_000
}

fn default_cache_sweep_interval_secs() -> u64 {
    300
}

impl Default for TombolaConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            flush_quiescence_ms: default_flush_quiescence_ms(),
            max_clients: default_max_clients(),
            cache_ttl_ms: default_cache_ttl_ms(),
            cache_ttl_overrides_ms: HashMap::new(),
            cache_sweep_interval_secs: default_cache_sweep_interval_secs(),
        }
    }
}

impl TombolaConfig {
    /// Load configuration from a JSON file.
    ///
    /// Missing fields fall back to defaults.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Path of the durable state file inside the data directory
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Heartbeat interval as a Duration
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Flush quiescence window as a Duration
    pub fn flush_quiescence(&self) -> Duration {
        Duration::from_millis(self.flush_quiescence_ms)
    }

    /// Cache sweep interval as a Duration
    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }
}
