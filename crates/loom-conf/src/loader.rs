//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, LoomConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order).
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values.
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files
/// that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/loom/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("loom/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("loom.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<LoomConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge two configs, with `overlay` taking precedence field-by-field
/// for the scalar settings, and replacing `targets`/`tick` wholesale when
/// the overlay file declares them (each loaded file is fully defaulted
/// by serde, so an overlay that is silent on a section carries its
/// defaults rather than "no opinion" — callers that want a section to
/// survive across files must repeat it).
pub fn merge_configs(base: LoomConfig, overlay: LoomConfig) -> LoomConfig {
    let default = LoomConfig::default();
    LoomConfig {
        tick: if overlay.tick != default.tick {
            overlay.tick
        } else {
            base.tick
        },
        targets: if overlay.targets != default.targets {
            overlay.targets
        } else {
            base.targets
        },
        control_port: if overlay.control_port != default.control_port {
            overlay.control_port
        } else {
            base.control_port
        },
        history_depth: if overlay.history_depth != default.history_depth {
            overlay.history_depth
        } else {
            base.history_depth
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut LoomConfig, sources: &mut ConfigSources) {
    if let Ok(v) = env::var("LOOM_CONTROL_PORT") {
        if let Ok(port) = v.parse() {
            config.control_port = port;
            sources.env_overrides.push("LOOM_CONTROL_PORT".to_string());
        }
    }
    if let Ok(v) = env::var("LOOM_TICK_PERIOD_MS") {
        if let Ok(ms) = v.parse() {
            config.tick.period_ms = ms;
            sources.env_overrides.push("LOOM_TICK_PERIOD_MS".to_string());
        }
    }
    if let Ok(v) = env::var("LOOM_PROCESS_AHEAD_SECS") {
        if let Ok(secs) = v.parse() {
            config.tick.process_ahead_secs = secs;
            sources
                .env_overrides
                .push("LOOM_PROCESS_AHEAD_SECS".to_string());
        }
    }
    if let Ok(v) = env::var("LOOM_HISTORY_DEPTH") {
        if let Ok(depth) = v.parse() {
            config.history_depth = depth;
            sources.env_overrides.push("LOOM_HISTORY_DEPTH".to_string());
        }
    }
    if let Ok(v) = env::var("RUST_LOG") {
        sources.env_overrides.push(format!("RUST_LOG={v}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_config_files_does_not_panic() {
        let _files = discover_config_files();
    }

    #[test]
    fn parses_minimal_toml() {
        let toml = r#"
control_port = 7000
"#;
        let config: LoomConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.control_port, 7000);
        assert_eq!(config.tick.period_ms, 50);
    }

    #[test]
    fn parses_target_table() {
        let toml = r#"
[targets.superdirt]
address = "127.0.0.1:57120"
schedule_mode = "message_stamped"
handshake = true
"#;
        let config: LoomConfig = toml::from_str(toml).unwrap();
        let target = config.targets.get("superdirt").unwrap();
        assert_eq!(target.address, "127.0.0.1:57120");
        assert_eq!(target.schedule_mode, crate::ScheduleMode::MessageStamped);
        assert!(target.handshake);
        assert_eq!(target.play_path, "/dirt/play");
    }

    #[test]
    fn merge_prefers_overlay_when_it_differs_from_defaults() {
        let base = LoomConfig::default();
        let mut overlay = LoomConfig::default();
        overlay.control_port = 9999;
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.control_port, 9999);
    }

    #[test]
    fn load_from_file_reads_a_real_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loom.toml");
        std::fs::write(&path, "control_port = 6011\n").unwrap();
        let config = load_from_file(&path).unwrap();
        assert_eq!(config.control_port, 6011);
    }

    #[test]
    fn load_from_file_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loom.toml");
        std::fs::write(&path, "control_port = [not valid\n").unwrap();
        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
