//! Configuration for the pairs engine.
//!
//! Maps directly to `pairs.toml`. Every section and field has a default, so
//! an empty file (or no file at all) yields a playable configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairsConfig {
    /// Turn resolution settings.
    #[serde(default)]
    pub game: GameConfig,
    /// Session timer settings.
    #[serde(default)]
    pub timer: TimerConfig,
    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PairsConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PairsError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::PairsError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Turn resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Pause after the second card is chosen before the board resets.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl GameConfig {
    /// Settle delay as a [`Duration`].
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
        }
    }
}

/// Session timer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Elapsed seconds at which the timer stops itself.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u64,
    /// Interval between observer notifications.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl TimerConfig {
    /// Tick interval as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 600,
            tick_interval_ms: 1000,
        }
    }
}

/// Which [`KeyValueStore`](crate::persistence::KeyValueStore) backs the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map; nothing survives a restart.
    #[default]
    Memory,
    /// Single-file SQLite database at [`StorageConfig::path`].
    Sqlite,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store implementation.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database path for the SQLite backend.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of completed sessions kept in history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Store a CRC-32 next to each SQLite value and verify it on load.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Prefix for the physical key names.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: default_db_path(),
            history_limit: 100,
            checksum_enabled: true,
            key_prefix: default_key_prefix(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_max_duration() -> u64 {
    600
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_db_path() -> String {
    "pairs.db".to_string()
}

fn default_history_limit() -> usize {
    100
}

fn default_key_prefix() -> String {
    "pairs".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
