//! Minimal configuration loading for loom.
//!
//! This crate provides configuration loading with minimal dependencies,
//! designed to be imported by all loom crates without causing circular
//! dependency issues.
//!
//! # Config file locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/loom/config.toml` (system)
//! 2. `~/.config/loom/config.toml` (user)
//! 3. `./loom.toml` (local override)
//! 4. Environment variables (`LOOM_*`)
//!
//! # Example config
//!
//! ```toml
//! [tick]
//! period_ms = 50
//! process_ahead_secs = 0.3
//!
//! control_port = 6010
//! history_depth = 8
//!
//! [targets.superdirt]
//! address = "127.0.0.1:57120"
//! play_path = "/dirt/play"
//! latency_secs = 0.02
//! schedule_mode = "bundle_stamped"
//! handshake = true
//! ```

pub mod loader;
pub mod targets;

pub use loader::ConfigSources;
pub use targets::{FieldDefault, MessageTemplateConfig, ScheduleMode, TargetConfig, TargetsConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// The dispatcher's fixed tick cadence and lookahead (spec.md §4.H).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Wall-clock period between ticks, in milliseconds.
    #[serde(default = "TickConfig::default_period_ms")]
    pub period_ms: u64,

    /// How far past `now` the tick window reaches, in seconds.
    #[serde(default = "TickConfig::default_process_ahead_secs")]
    pub process_ahead_secs: f64,
}

impl TickConfig {
    fn default_period_ms() -> u64 {
        50
    }

    fn default_process_ahead_secs() -> f64 {
        0.3
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period_ms: Self::default_period_ms(),
            process_ahead_secs: Self::default_process_ahead_secs(),
        }
    }
}

fn default_control_port() -> u16 {
    6010
}

fn default_history_depth() -> usize {
    8
}

/// Complete loom configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoomConfig {
    #[serde(default)]
    pub tick: TickConfig,

    /// Downstream targets, keyed by a short name used in log messages.
    #[serde(default)]
    pub targets: TargetsConfig,

    /// UDP port the incoming control listener binds (spec.md §4.I).
    #[serde(default = "default_control_port")]
    pub control_port: u16,

    /// Number of prior patterns kept per play-map key for rollback.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

impl Default for LoomConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            targets: TargetsConfig::default(),
            control_port: default_control_port(),
            history_depth: default_history_depth(),
        }
    }
}

impl LoomConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    pub fn load_with_sources() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_with_sources_from(None)
    }

    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = LoomConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_tick_cadence() {
        let config = LoomConfig::default();
        assert_eq!(config.tick.period_ms, 50);
        assert_eq!(config.control_port, 6010);
        assert_eq!(config.history_depth, 8);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn load_without_any_files_returns_defaults() {
        let config = LoomConfig::load().unwrap();
        assert_eq!(config.control_port, 6010);
    }
}
