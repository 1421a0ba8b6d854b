//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/coursetrace/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/coursetrace/` (~/.config/coursetrace/)
//! - Data: `$XDG_DATA_HOME/coursetrace/` (~/.local/share/coursetrace/)
//! - State/Logs: `$XDG_STATE_HOME/coursetrace/` (~/.local/state/coursetrace/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Dedication (session segmentation) thresholds
    #[serde(default)]
    pub dedication: DedicationConfig,

    /// Join resolution limits
    #[serde(default)]
    pub joins: JoinConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Column-label overrides keyed by label key (localization hook)
    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// Activity store path override (defaults to the XDG data dir)
    pub store_path: Option<PathBuf>,
}

/// Thresholds for the dedication session-segmentation algorithm.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DedicationConfig {
    /// Floor for a session's dedication, in seconds. A lone event still
    /// counts for this much time-on-task.
    #[serde(default = "default_dedication_min_secs")]
    pub min_secs: i64,

    /// Maximum gap between consecutive events that still belong to the same
    /// session, in seconds.
    #[serde(default = "default_dedication_max_gap_secs")]
    pub max_gap_secs: i64,

    /// Rows handled per scan pass. Chunking only bounds memory; sessions
    /// never split at a chunk edge.
    #[serde(default = "default_dedication_batch_size")]
    pub batch_size: usize,
}

impl Default for DedicationConfig {
    fn default() -> Self {
        Self {
            min_secs: default_dedication_min_secs(),
            max_gap_secs: default_dedication_max_gap_secs(),
            batch_size: default_dedication_batch_size(),
        }
    }
}

fn default_dedication_min_secs() -> i64 {
    60
}

fn default_dedication_max_gap_secs() -> i64 {
    900
}

fn default_dedication_batch_size() -> usize {
    100_000
}

/// Limits on join resolution against the lookup-table source.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct JoinConfig {
    /// Maximum distinct target-table names probed by one variable join.
    #[serde(default = "default_join_max_targets")]
    pub max_targets: usize,

    /// Keys per bulk lookup query.
    #[serde(default = "default_join_lookup_batch_size")]
    pub lookup_batch_size: usize,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            max_targets: default_join_max_targets(),
            lookup_batch_size: default_join_lookup_batch_size(),
        }
    }
}

fn default_join_max_targets() -> usize {
    100
}

fn default_join_lookup_batch_size() -> usize {
    100_000
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate threshold sanity; bad thresholds would silently ruin every
    /// dedication report.
    pub fn validate(&self) -> Result<()> {
        if self.dedication.max_gap_secs <= 0 {
            return Err(Error::Config(
                "dedication.max_gap_secs must be positive".to_string(),
            ));
        }
        if self.dedication.min_secs < 0 {
            return Err(Error::Config(
                "dedication.min_secs must not be negative".to_string(),
            ));
        }
        if self.dedication.batch_size == 0 {
            return Err(Error::Config(
                "dedication.batch_size must be at least 1".to_string(),
            ));
        }
        if self.joins.max_targets == 0 {
            return Err(Error::Config(
                "joins.max_targets must be at least 1".to_string(),
            ));
        }
        if self.joins.lookup_batch_size == 0 {
            return Err(Error::Config(
                "joins.lookup_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/coursetrace/config.toml` (~/.config/coursetrace/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("coursetrace").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite store)
    ///
    /// `$XDG_DATA_HOME/coursetrace/` (~/.local/share/coursetrace/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("coursetrace")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/coursetrace/` (~/.local/state/coursetrace/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("coursetrace")
    }

    /// Returns the activity store path, honoring the config override.
    ///
    /// `$XDG_DATA_HOME/coursetrace/activity.db` by default.
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("activity.db"))
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/coursetrace/coursetrace.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("coursetrace.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path
    /// behavior before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
