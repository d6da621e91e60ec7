//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the xTDH daemon.
///
/// Can be loaded from a TOML file via [`DaemonConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). CLI flags and environment
/// variables override file settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Data directory for the LMDB store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Minutes between recomputes in `watch` mode.
    #[serde(default = "default_recalc_interval_minutes")]
    pub recalc_interval_minutes: u64,

    /// Whether to run the stats worker. When disabled, commit triggers are
    /// skipped with a warning and stats slots go stale.
    #[serde(default = "default_true")]
    pub enable_stats_worker: bool,

    /// Depth of the stats rebuild queue.
    #[serde(default = "default_stats_queue_depth")]
    pub stats_queue_depth: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./xtdh_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_recalc_interval_minutes() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_stats_queue_depth() -> usize {
    4
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config must deserialize from defaults")
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// LMDB map size in bytes.
    pub fn map_size(&self) -> usize {
        self.map_size_mb * 1024 * 1024
    }
}
