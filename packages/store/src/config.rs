use std::path::PathBuf;

use serde::Deserialize;

/// Default upload cap: 50 MiB.
pub const DEFAULT_MAX_ARTIFACT_SIZE: u64 = 50 * 1024 * 1024;

/// Where artifacts and the stats ledger live.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one file per artifact plus `latest.bin`. Default: "./public/firmware".
    #[serde(default = "default_firmware_dir")]
    pub firmware_dir: PathBuf,
    /// JSON document backing the stats ledger. Default: "./data/stats.json".
    #[serde(default = "default_stats_path")]
    pub stats_path: PathBuf,
    /// Largest accepted artifact in bytes. Default: 52428800 (50 MiB).
    #[serde(default = "default_max_artifact_size")]
    pub max_artifact_size: u64,
}

fn default_firmware_dir() -> PathBuf {
    PathBuf::from("./public/firmware")
}
fn default_stats_path() -> PathBuf {
    PathBuf::from("./data/stats.json")
}
fn default_max_artifact_size() -> u64 {
    DEFAULT_MAX_ARTIFACT_SIZE
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            firmware_dir: default_firmware_dir(),
            stats_path: default_stats_path(),
            max_artifact_size: default_max_artifact_size(),
        }
    }
}

/// Download statistics settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    /// Number of access events kept in the ledger. Default: 100.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    100
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}
