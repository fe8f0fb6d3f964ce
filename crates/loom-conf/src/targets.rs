//! Per-target definitions: address, latency, schedule mode, and the OSC
//! message template bound to the target's play path (spec.md §6).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mirrors `loom_proto::ScheduleMode` by name. Kept as a separate type so
/// this crate never depends on `loom-proto`; `loom-daemon` maps one onto
/// the other when it builds a target from its config entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    BundleStamped,
    MessageStamped,
    Live,
}

impl Default for ScheduleMode {
    fn default() -> Self {
        ScheduleMode::BundleStamped
    }
}

/// A single field's serialized default for a positional template, stored
/// as the handful of scalar shapes a TOML value can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDefault {
    Int(i32),
    Float(f64),
    Text(String),
    Bool(bool),
}

/// Config-side mirror of `loom_proto::MessageTemplate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageTemplateConfig {
    Positional { fields: Vec<(String, FieldDefault)> },
    Named { keys: Vec<String> },
    Context,
}

impl Default for MessageTemplateConfig {
    fn default() -> Self {
        MessageTemplateConfig::Positional { fields: Vec::new() }
    }
}

/// One downstream recipient of scheduled messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// `host:port` the dispatcher sends UDP datagrams to.
    pub address: String,

    /// OSC address the play-path message is sent to (e.g. `/dirt/play`).
    #[serde(default = "TargetConfig::default_play_path")]
    pub play_path: String,

    /// Fixed latency added to every onset sent to this target, in seconds.
    #[serde(default)]
    pub latency_secs: f64,

    #[serde(default)]
    pub schedule_mode: ScheduleMode,

    /// Send `/dirt/handshake` on startup and learn this target's bus table.
    #[serde(default)]
    pub handshake: bool,

    #[serde(default)]
    pub template: MessageTemplateConfig,
}

impl TargetConfig {
    fn default_play_path() -> String {
        "/dirt/play".to_string()
    }
}

pub type TargetsConfig = BTreeMap<String, TargetConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_defaults_to_bundle_stamped() {
        let target = TargetConfig {
            address: "127.0.0.1:57120".to_string(),
            play_path: TargetConfig::default_play_path(),
            latency_secs: 0.0,
            schedule_mode: ScheduleMode::default(),
            handshake: false,
            template: MessageTemplateConfig::default(),
        };
        assert_eq!(target.schedule_mode, ScheduleMode::BundleStamped);
        assert_eq!(target.play_path, "/dirt/play");
    }
}
