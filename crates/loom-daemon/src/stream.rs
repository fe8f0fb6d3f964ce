//! The programmatic handle to a running daemon (spec.md §6): what an
//! embedding CLI or REPL calls to replace patterns and transport
//! controls without going through the OSC control port.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

use loom_conf::{LoomConfig, TargetsConfig};
use loom_core::{ControlMap, Pattern, Tempo, Time, Value};

use crate::dispatch::{Action, Dispatcher};
use crate::error::DaemonError;
use crate::playmap::PlayMap;
use crate::target::Target;

/// A running daemon's control surface. Dropping this does not stop the
/// tick loop; call `shutdown` explicitly.
pub struct Stream {
    tx: Sender<Action>,
    controls: Arc<RwLock<ControlMap>>,
    shutdown: Arc<AtomicBool>,
    control_listener: Option<JoinHandle<()>>,
    tick_thread: Option<JoinHandle<()>>,
}

impl Stream {
    /// Connect to every configured target, spin up the tick loop and
    /// control listener threads, and return a handle to both.
    pub fn start(config: LoomConfig, targets: TargetsConfig) -> Result<Self, DaemonError> {
        let mut connected = Vec::with_capacity(targets.len());
        for (name, target_config) in &targets {
            let target = Target::connect(name, target_config).map_err(DaemonError::TargetBind)?;
            connected.push(target);
        }

        let tempo = Tempo::new(Time::from_integer(1), SystemTime::now());
        let playmap = PlayMap::new(config.history_depth);
        let controls: Arc<RwLock<ControlMap>> = Arc::new(RwLock::new(ControlMap::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let dispatcher = Dispatcher::new(
            tempo,
            playmap,
            controls.clone(),
            connected,
            Duration::from_millis(config.tick.period_ms),
            config.tick.process_ahead_secs,
        );

        let (tx, rx) = mpsc::channel();

        let tick_shutdown = shutdown.clone();
        let tick_thread = std::thread::spawn(move || dispatcher.run(rx, tick_shutdown));

        let listener_tx = tx.clone();
        let listener_shutdown = shutdown.clone();
        let control_port = config.control_port;
        let control_listener = std::thread::spawn(move || {
            if let Err(e) = crate::control_listener::run(control_port, listener_tx, listener_shutdown) {
                tracing::error!(error = %e, "control listener exited");
            }
        });

        Ok(Stream {
            tx,
            controls,
            shutdown,
            control_listener: Some(control_listener),
            tick_thread: Some(tick_thread),
        })
    }

    pub fn replace(&self, key: impl Into<String>, pattern: Pattern<ControlMap>) {
        let _ = self.tx.send(Action::Replace(key.into(), pattern));
    }

    pub fn mute(&self, key: impl Into<String>) {
        let _ = self.tx.send(Action::Mute(key.into()));
    }

    pub fn unmute(&self, key: impl Into<String>) {
        let _ = self.tx.send(Action::Unmute(key.into()));
    }

    pub fn solo(&self, key: impl Into<String>) {
        let _ = self.tx.send(Action::Solo(key.into()));
    }

    pub fn unsolo(&self, key: impl Into<String>) {
        let _ = self.tx.send(Action::Unsolo(key.into()));
    }

    pub fn mute_all(&self) {
        let _ = self.tx.send(Action::MuteAll);
    }

    pub fn unmute_all(&self) {
        let _ = self.tx.send(Action::UnmuteAll);
    }

    pub fn unsolo_all(&self) {
        let _ = self.tx.send(Action::UnsoloAll);
    }

    pub fn hush(&self) {
        let _ = self.tx.send(Action::Hush);
    }

    pub fn silence(&self, key: impl Into<String>) {
        let _ = self.tx.send(Action::Silence(key.into()));
    }

    pub fn set_cps(&self, cps: Time) {
        let _ = self.tx.send(Action::SetCps(cps));
    }

    pub fn set_cycle(&self, cycle: Time) {
        let _ = self.tx.send(Action::SetCycle(cycle));
    }

    pub fn nudge_all(&self, delta_secs: f64) {
        let _ = self.tx.send(Action::Nudge(delta_secs));
    }

    pub fn set_control(&self, name: impl Into<String>, value: Value) {
        let _ = self.tx.send(Action::SetControl(name.into(), value));
    }

    /// Query and dispatch a single pattern immediately, bypassing the
    /// play map entirely (spec.md §6, `once`).
    pub fn once(&self, pattern: Pattern<ControlMap>) {
        let _ = self.tx.send(Action::Once(pattern));
    }

    /// Read-only snapshot of the live external controls, for callers
    /// that want to display current state (e.g. a REPL status line).
    pub fn controls_snapshot(&self) -> ControlMap {
        self.controls
            .read()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.tx.send(Action::Shutdown);
        if let Some(handle) = self.tick_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.control_listener.take() {
            let _ = handle.join();
        }
    }
}
