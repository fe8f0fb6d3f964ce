//! The tick loop and its action queue (spec.md §4.H, §5): the single
//! task that owns `Tempo` and the play map, and the only place events
//! are turned into outgoing OSC traffic.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use loom_core::controls::resolve_state;
use loom_core::event::emit_order;
use loom_core::{ControlMap, Event, Pattern, Span, State, Tempo, Time, Value};
use loom_proto::{bus, message, schedule};
use tracing::{error, warn};

use crate::playmap::PlayMap;
use crate::target::Target;

/// A command submitted from a replace/control task into the tick
/// loop's queue. Applied at the top of the next tick, never mid-tick
/// (spec.md §5).
pub enum Action {
    Replace(String, Pattern<ControlMap>),
    Mute(String),
    Unmute(String),
    Solo(String),
    Unsolo(String),
    MuteAll,
    UnmuteAll,
    UnsoloAll,
    Hush,
    Silence(String),
    SetCps(Time),
    SetCycle(Time),
    Nudge(f64),
    SetControl(String, Value),
    Once(Pattern<ControlMap>),
    Shutdown,
}

pub struct Dispatcher {
    tempo: Tempo,
    playmap: PlayMap,
    controls: Arc<RwLock<ControlMap>>,
    targets: Vec<Target>,
    prev_cycle: Time,
    period: Duration,
    process_ahead_secs: f64,
}

impl Dispatcher {
    pub fn new(
        tempo: Tempo,
        playmap: PlayMap,
        controls: Arc<RwLock<ControlMap>>,
        targets: Vec<Target>,
        period: Duration,
        process_ahead_secs: f64,
    ) -> Self {
        let now = SystemTime::now();
        Dispatcher {
            prev_cycle: tempo.cycle_at(now),
            tempo,
            playmap,
            controls,
            targets,
            period,
            process_ahead_secs,
        }
    }

    /// Apply one queued action. Returns `false` only for `Shutdown`.
    pub fn apply(&mut self, action: Action) -> bool {
        let now = SystemTime::now();
        match action {
            Action::Replace(key, pattern) => {
                if let Err(e) = self.playmap.replace(&key, pattern) {
                    error!(key, error = %e, "rejected pattern replace");
                }
            }
            Action::Mute(key) => self.playmap.mute(&key),
            Action::Unmute(key) => self.playmap.unmute(&key),
            Action::Solo(key) => self.playmap.solo(&key),
            Action::Unsolo(key) => self.playmap.unsolo(&key),
            Action::MuteAll => self.playmap.mute_all(),
            Action::UnmuteAll => self.playmap.unmute_all(),
            Action::UnsoloAll => self.playmap.unsolo_all(),
            Action::Hush => self.playmap.hush(),
            Action::Silence(key) => self.playmap.silence(&key),
            Action::SetCps(cps) => self.tempo.set_cps(cps, now),
            Action::SetCycle(cycle) => {
                self.tempo.set_cycle(cycle, now);
                self.prev_cycle = cycle;
            }
            Action::Nudge(delta) => self.tempo.set_nudge(delta),
            Action::SetControl(name, value) => {
                if let Ok(mut controls) = self.controls.write() {
                    controls.insert(name, value);
                }
            }
            Action::Once(pattern) => self.dispatch_once(&pattern),
            Action::Shutdown => return false,
        }
        true
    }

    /// Drain queued actions, then tick, then sleep until the next
    /// period. Runs until `Action::Shutdown` is received or `shutdown`
    /// is set.
    pub fn run(mut self, actions: Receiver<Action>, shutdown: Arc<AtomicBool>) {
        loop {
            match actions.recv_timeout(self.period) {
                Ok(action) => {
                    if !self.apply(action) {
                        return;
                    }
                    while let Ok(action) = actions.try_recv() {
                        if !self.apply(action) {
                            return;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
            if shutdown.load(AtomicOrdering::Relaxed) {
                return;
            }
            self.tick();
        }
    }

    fn tick(&mut self) {
        let now = SystemTime::now();
        let window_end = now + Duration::from_secs_f64(self.process_ahead_secs);
        let end_cycle = self.tempo.cycle_at(window_end);
        if end_cycle <= self.prev_cycle {
            return;
        }
        let tick_arc = Span::new(self.prev_cycle, end_cycle);
        self.prev_cycle = end_cycle;

        let resolved = {
            let snapshot = match self.controls.read() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };
            resolve_state(&snapshot, tick_arc.begin)
        };
        let state = State {
            span: tick_arc,
            controls: resolved,
        };

        let mut tagged: Vec<(String, Event<ControlMap>)> = Vec::new();
        for (key, pattern) in self.playmap.audible() {
            let state_ref = &state;
            match panic::catch_unwind(AssertUnwindSafe(|| pattern.query(state_ref))) {
                Ok(events) => {
                    for event in events {
                        tagged.push((key.clone(), event));
                    }
                }
                Err(payload) => {
                    let msg = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "pattern panicked during query".to_string());
                    error!(key, error = %msg, "pattern failed mid-tick; rolling back");
                    self.playmap.rollback(&key);
                }
            }
        }

        tagged.sort_by(|(_, a), (_, b)| emit_order(a, b, |_, _| std::cmp::Ordering::Equal));

        for (key, event) in &tagged {
            let cycle = event.whole_or_active().begin;
            let base_onset = self.tempo.time_at(cycle)
                + event.value.get("nudge").and_then(Value::get_f).unwrap_or(0.0);
            for target in &mut self.targets {
                let t_on = base_onset + target.config.latency_secs;
                if let Err(e) = send_to_target(target, key, event, t_on) {
                    warn!(target = %target.name, key, error = %e, "failed to send event");
                }
            }
        }
    }

    /// For `once`: query and dispatch a single pattern immediately,
    /// bypassing the play map entirely.
    pub fn dispatch_once(&mut self, pattern: &Pattern<ControlMap>) {
        let now = SystemTime::now();
        let cycle = self.tempo.cycle_at(now);
        let state = State::new(Span::point(cycle));
        let events = match panic::catch_unwind(AssertUnwindSafe(|| pattern.query(&state))) {
            Ok(events) => events,
            Err(_) => {
                error!("once pattern panicked during query");
                return;
            }
        };
        for event in &events {
            let t_on = self.tempo.time_at(cycle)
                + event.value.get("nudge").and_then(Value::get_f).unwrap_or(0.0);
            for target in &mut self.targets {
                let t_on = t_on + target.config.latency_secs;
                if let Err(e) = send_to_target(target, "once", event, t_on) {
                    warn!(target = %target.name, error = %e, "failed to send once event");
                }
            }
        }
    }
}

/// Encode and send one event to one target, including any control-bus
/// writes its `^`-prefixed parameters carry. A free function (not a
/// `Dispatcher` method) so the tick loop can hold an immutable borrow
/// of the sorted event list while iterating `&mut self.targets`.
fn send_to_target(
    target: &mut Target,
    pattern_id: &str,
    event: &Event<ControlMap>,
    t_on: f64,
) -> Result<(), String> {
    if target.schedule_mode == loom_proto::ScheduleMode::Live {
        sleep_until(t_on);
    }

    let (bus_msgs, play_params) = bus::bus_messages(&target.bus_table, &event.value);
    for bus_msg in bus_msgs {
        let bytes = schedule::encode_scheduled(target.schedule_mode, bus_msg, t_on).map_err(|e| e.to_string())?;
        target.socket.send(&bytes).map_err(|e| e.to_string())?;
    }

    let play_event = Event {
        metadata: event.metadata.clone(),
        whole: event.whole,
        active: event.active,
        value: play_params,
    };
    let msg = message::build_message(&target.config.play_path, &target.template, pattern_id, &play_event)
        .map_err(|e| e.to_string())?;
    let bytes = schedule::encode_scheduled(target.schedule_mode, msg, t_on).map_err(|e| e.to_string())?;
    target.socket.send(&bytes).map_err(|e| e.to_string())?;
    Ok(())
}

/// Block the calling thread until `t_on` (unix seconds). A no-op if
/// `t_on` has already passed. `Live` mode carries no wire timestamp, so
/// the dispatcher itself is the only thing that can honor `t_on`.
fn sleep_until(t_on: f64) {
    let now = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    let remaining = t_on - now;
    if remaining > 0.0 {
        std::thread::sleep(Duration::from_secs_f64(remaining));
    }
}
