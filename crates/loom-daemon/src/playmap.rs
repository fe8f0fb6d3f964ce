//! The play map (spec.md §4.G): a registry of named active patterns
//! with mute/solo and bounded per-key history for rollback.

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};

use loom_core::pattern::combinators::{silence, stack};
use loom_core::{ControlMap, Pattern, Span, State, Time};
use tracing::warn;

use crate::error::DaemonError;

struct PlayState {
    pattern: Pattern<ControlMap>,
    muted: bool,
    soloed: bool,
    history: VecDeque<Pattern<ControlMap>>,
}

impl PlayState {
    fn new(pattern: Pattern<ControlMap>) -> Self {
        PlayState {
            pattern,
            muted: false,
            soloed: false,
            history: VecDeque::new(),
        }
    }
}

/// Forces a query of the zero-width arc at cycle 0, surfacing a parse
/// or evaluation error synchronously instead of letting it reach the
/// tick loop later.
fn probe(pattern: &Pattern<ControlMap>) -> Result<(), String> {
    let state = State::new(Span::point(Time::from_integer(0)));
    panic::catch_unwind(AssertUnwindSafe(|| pattern.query(&state)))
        .map(|_| ())
        .map_err(|payload| {
            payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "pattern panicked during evaluation".to_string())
        })
}

pub struct PlayMap {
    states: BTreeMap<String, PlayState>,
    history_depth: usize,
}

impl PlayMap {
    pub fn new(history_depth: usize) -> Self {
        PlayMap {
            states: BTreeMap::new(),
            history_depth,
        }
    }

    /// Replace the pattern at `key`, probing it first. On success the
    /// previous pattern (if any) is pushed onto `key`'s history.
    pub fn replace(&mut self, key: &str, pattern: Pattern<ControlMap>) -> Result<(), DaemonError> {
        probe(&pattern).map_err(|msg| DaemonError::PatternEval(key.to_string(), msg))?;
        match self.states.get_mut(key) {
            Some(state) => {
                state.history.push_back(state.pattern.clone());
                while state.history.len() > self.history_depth {
                    state.history.pop_front();
                }
                state.pattern = pattern;
            }
            None => {
                self.states.insert(key.to_string(), PlayState::new(pattern));
            }
        }
        Ok(())
    }

    /// Roll `key` back to its most recent history entry, used by the
    /// tick loop when a pattern panics mid-query after having passed
    /// its initial probe (e.g. a degrade-by draw hitting a rare branch).
    pub fn rollback(&mut self, key: &str) {
        if let Some(state) = self.states.get_mut(key) {
            if let Some(prev) = state.history.pop_back() {
                warn!(key, "rolling back pattern to previous history entry");
                state.pattern = prev;
            } else {
                warn!(key, "rolling back pattern with no history; silencing");
                state.pattern = silence();
            }
        }
    }

    pub fn mute(&mut self, key: &str) {
        if let Some(state) = self.states.get_mut(key) {
            state.muted = true;
        }
    }

    pub fn unmute(&mut self, key: &str) {
        if let Some(state) = self.states.get_mut(key) {
            state.muted = false;
        }
    }

    pub fn solo(&mut self, key: &str) {
        if let Some(state) = self.states.get_mut(key) {
            state.soloed = true;
        }
    }

    pub fn unsolo(&mut self, key: &str) {
        if let Some(state) = self.states.get_mut(key) {
            state.soloed = false;
        }
    }

    pub fn mute_all(&mut self) {
        for state in self.states.values_mut() {
            state.muted = true;
        }
    }

    pub fn unmute_all(&mut self) {
        for state in self.states.values_mut() {
            state.muted = false;
        }
    }

    pub fn unsolo_all(&mut self) {
        for state in self.states.values_mut() {
            state.soloed = false;
        }
    }

    /// Replace every pattern with silence, leaving mute/solo flags and
    /// history alone.
    pub fn hush(&mut self) {
        for (key, state) in self.states.iter_mut() {
            state.history.push_back(state.pattern.clone());
            while state.history.len() > self.history_depth {
                state.history.pop_front();
            }
            state.pattern = silence();
            let _ = key;
        }
    }

    /// Replace one key's pattern with silence.
    pub fn silence(&mut self, key: &str) {
        if self.states.contains_key(key) {
            let _ = self.replace(key, silence());
        }
    }

    /// Keys whose pattern currently contributes sound: if any key is
    /// soloed, only soloed (and unmuted) keys sound; otherwise every
    /// unmuted key sounds.
    fn audible_keys(&self) -> Vec<&str> {
        let any_solo = self.states.values().any(|s| s.soloed);
        self.states
            .iter()
            .filter(|(_, s)| {
                if any_solo {
                    s.soloed && !s.muted
                } else {
                    !s.muted
                }
            })
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Per-key patterns currently contributing sound, paired with their
    /// key (so the tick loop can query each independently and attribute
    /// a panic to the right key for rollback).
    pub fn audible(&self) -> Vec<(String, Pattern<ControlMap>)> {
        self.audible_keys()
            .into_iter()
            .map(|k| (k.to_string(), self.states[k].pattern.clone()))
            .collect()
    }

    /// The full composite pattern (all audible keys stacked), for
    /// callers that don't need per-key fault isolation.
    pub fn composite(&self) -> Pattern<ControlMap> {
        stack(self.audible().into_iter().map(|(_, p)| p).collect())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(|k| k.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::pattern::atom;
    use loom_core::Value;

    fn cm(n: i32) -> ControlMap {
        let mut m = ControlMap::new();
        m.insert("n".to_string(), Value::Int32(n));
        m
    }

    #[test]
    fn replace_rejects_failing_probe_without_mutating_state() {
        let mut map = PlayMap::new(8);
        map.replace("d1", atom(cm(0))).unwrap();
        let panicking = Pattern::<ControlMap>::new(|_| panic!("boom"));
        let err = map.replace("d1", panicking);
        assert!(err.is_err());
        assert_eq!(map.audible().len(), 1);
    }

    #[test]
    fn mute_removes_a_key_from_the_audible_set() {
        let mut map = PlayMap::new(8);
        map.replace("d1", atom(cm(0))).unwrap();
        map.replace("d2", atom(cm(1))).unwrap();
        map.mute("d1");
        let audible: Vec<_> = map.audible().into_iter().map(|(k, _)| k).collect();
        assert_eq!(audible, vec!["d2".to_string()]);
    }

    #[test]
    fn solo_silences_every_other_key() {
        let mut map = PlayMap::new(8);
        map.replace("d1", atom(cm(0))).unwrap();
        map.replace("d2", atom(cm(1))).unwrap();
        map.solo("d2");
        let audible: Vec<_> = map.audible().into_iter().map(|(k, _)| k).collect();
        assert_eq!(audible, vec!["d2".to_string()]);
    }

    #[test]
    fn hush_silences_everything_but_keeps_keys() {
        let mut map = PlayMap::new(8);
        map.replace("d1", atom(cm(0))).unwrap();
        map.hush();
        assert_eq!(map.keys().count(), 1);
        let state = State::new(Span::new(Time::from_integer(0), Time::from_integer(1)));
        assert!(map.states["d1"].pattern.query(&state).is_empty());
    }

    #[test]
    fn rollback_restores_previous_pattern() {
        let mut map = PlayMap::new(8);
        map.replace("d1", atom(cm(0))).unwrap();
        map.replace("d1", atom(cm(1))).unwrap();
        map.rollback("d1");
        let state = State::new(Span::new(Time::from_integer(0), Time::from_integer(1)));
        let events = map.states["d1"].pattern.query(&state);
        assert_eq!(events[0].value.get("n"), Some(&Value::Int32(0)));
    }
}
