//! Daemon-level error taxonomy (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("pattern for key {0:?} failed to evaluate: {1}")]
    PatternEval(String, String),

    #[error("no such play-map key {0:?}")]
    UnknownKey(String),

    #[error("failed to bind control listener on port {0}: {1}")]
    ListenerBind(u16, std::io::Error),

    #[error("failed to bind target send socket: {0}")]
    TargetBind(std::io::Error),

    #[error(transparent)]
    Config(#[from] loom_conf::ConfigError),
}
