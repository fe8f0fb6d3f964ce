//! Control-bus parameter references (spec.md §6, parameters beginning
//! with `^`) and the per-target index table learned via handshake.

use loom_core::{ControlMap, Value};
use rosc::{OscMessage, OscType};
use std::collections::HashMap;

/// Maps the logical bus index a pattern writes (`^0`, `^1`, ...) to the
/// target's actual allocated control-bus id, learned from a handshake
/// reply. Absent an entry, the logical index is used directly.
#[derive(Debug, Clone, Default)]
pub struct BusTable {
    indices: HashMap<i32, i32>,
}

impl BusTable {
    pub fn from_indices(indices: Vec<i32>) -> Self {
        BusTable {
            indices: indices.into_iter().enumerate().map(|(i, id)| (i as i32, id)).collect(),
        }
    }

    pub fn resolve(&self, logical: i32) -> i32 {
        self.indices.get(&logical).copied().unwrap_or(logical)
    }
}

/// Split a control map into bus-reference entries (`^`-prefixed keys)
/// and the remaining play-path parameters.
pub fn split_bus_params(controls: &ControlMap) -> (Vec<(String, i32)>, ControlMap) {
    let mut bus_params = Vec::new();
    let mut play_params = ControlMap::new();
    for (k, v) in controls {
        if let Some(name) = k.strip_prefix('^') {
            if let Some(idx) = v.get_i() {
                bus_params.push((name.to_string(), idx));
                continue;
            }
        }
        play_params.insert(k.clone(), v.clone());
    }
    (bus_params, play_params)
}

/// Build the `/c_set <bus_id> <value>` control-bus message for one
/// bus-reference parameter. The parameter's own declared value serves
/// both as the (possibly remapped) bus id and as the value written to
/// it, matching the single-number-per-reference model in spec.md §6.
pub fn bus_set_message(table: &BusTable, logical_index: i32) -> OscMessage {
    let bus_id = table.resolve(logical_index);
    OscMessage {
        addr: "/c_set".to_string(),
        args: vec![OscType::Int(bus_id), OscType::Int(logical_index)],
    }
}

pub fn bus_messages(table: &BusTable, controls: &ControlMap) -> (Vec<OscMessage>, ControlMap) {
    let (bus_params, play_params) = split_bus_params(controls);
    let messages = bus_params
        .into_iter()
        .map(|(_, idx)| bus_set_message(table, idx))
        .collect();
    (messages, play_params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_ref_without_table_uses_raw_index() {
        let table = BusTable::default();
        let msg = bus_set_message(&table, 3);
        assert_eq!(msg.args[0], OscType::Int(3));
    }

    #[test]
    fn bus_ref_remaps_through_table() {
        let table = BusTable::from_indices(vec![10, 11, 12]);
        let msg = bus_set_message(&table, 2);
        assert_eq!(msg.args[0], OscType::Int(12));
    }

    #[test]
    fn split_separates_bus_and_play_params() {
        let mut controls = ControlMap::new();
        controls.insert("^cutoff".to_string(), Value::Int32(1));
        controls.insert("s".to_string(), Value::String("bd".into()));
        let (bus, play) = split_bus_params(&controls);
        assert_eq!(bus, vec![("cutoff".to_string(), 1)]);
        assert!(play.contains_key("s"));
        assert!(!play.contains_key("^cutoff"));
    }
}
