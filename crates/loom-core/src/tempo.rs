//! The tempo clock: the single mapping between wall-clock time and
//! cycle-time that every other component in the scheduler trusts.

use crate::time::Time;
use num_rational::Ratio;
use std::time::{SystemTime, UNIX_EPOCH};

/// The smallest `cps` the clock will accept; a configured or requested
/// `cps <= 0` is clamped to this instead of producing a divide-by-zero
/// (spec.md §7, configuration error taxonomy).
const MIN_CPS: i64 = 1; // numerator of 1/1_000_000
const MIN_CPS_DENOM: i64 = 1_000_000;

fn to_secs(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

fn clamp_cps(cps: Time) -> Time {
    if cps <= Ratio::from_integer(0) {
        Ratio::new(MIN_CPS, MIN_CPS_DENOM)
    } else {
        cps
    }
}

const RATIONAL_SCALE: i64 = 1_000_000_000;

fn rational_from_f64(x: f64) -> Time {
    Ratio::new((x * RATIONAL_SCALE as f64).round() as i64, RATIONAL_SCALE)
}

fn time_to_f64(t: Time) -> f64 {
    *t.numer() as f64 / *t.denom() as f64
}

/// Cycles-per-second, cycle anchor, wall-clock anchor, pause state and
/// nudge offset. `cycle_at(t) = anchor_cycle + (t - anchor_time) * cps`
/// (frozen at `anchor_cycle` while paused); every mutator preserves
/// this invariant for the instant it is called, except `set_cycle` and
/// `reset_cycles` which explicitly rebase it.
#[derive(Debug, Clone, Copy)]
pub struct Tempo {
    anchor_cycle: Time,
    anchor_time: SystemTime,
    cps: Time,
    paused: bool,
    nudge: f64,
}

impl Tempo {
    pub fn new(cps: Time, now: SystemTime) -> Self {
        Tempo {
            anchor_cycle: Ratio::from_integer(0),
            anchor_time: now,
            cps: clamp_cps(cps),
            paused: false,
            nudge: 0.0,
        }
    }

    pub fn cps(&self) -> Time {
        self.cps
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn nudge(&self) -> f64 {
        self.nudge
    }

    /// `cycle_at(t) = anchor_cycle + (t - anchor_time) * cps`, frozen
    /// at `anchor_cycle` while paused.
    pub fn cycle_at(&self, now: SystemTime) -> Time {
        if self.paused {
            return self.anchor_cycle;
        }
        let elapsed = to_secs(now) - to_secs(self.anchor_time);
        let cps_f64 = time_to_f64(self.cps);
        self.anchor_cycle + rational_from_f64(elapsed * cps_f64)
    }

    /// The wall-clock timestamp (seconds since the Unix epoch, plus
    /// nudge) at which `cycle` occurs. This is the only place floating
    /// point re-enters pattern-derived times: cycle-time itself stays
    /// exact until this conversion.
    pub fn time_at(&self, cycle: Time) -> f64 {
        let anchor_secs = to_secs(self.anchor_time);
        let delta_cycle = time_to_f64(cycle - self.anchor_cycle);
        let cps_f64 = time_to_f64(self.cps);
        anchor_secs + delta_cycle / cps_f64 + self.nudge
    }

    /// Rebase so `cycle_at(now)` is unchanged, then take on `new_cps`.
    pub fn set_cps(&mut self, new_cps: Time, now: SystemTime) {
        let preserved = self.cycle_at(now);
        self.anchor_cycle = preserved;
        self.anchor_time = now;
        self.cps = clamp_cps(new_cps);
    }

    /// Rebase so `cycle_at(now) == c` immediately.
    pub fn set_cycle(&mut self, c: Time, now: SystemTime) {
        self.anchor_cycle = c;
        self.anchor_time = now;
    }

    pub fn reset_cycles(&mut self, now: SystemTime) {
        self.set_cycle(Ratio::from_integer(0), now);
    }

    /// Add `delta` seconds to all outgoing timestamps without touching
    /// cycle position.
    pub fn set_nudge(&mut self, delta: f64) {
        self.nudge = delta;
    }

    pub fn pause(&mut self, now: SystemTime) {
        if !self.paused {
            self.anchor_cycle = self.cycle_at(now);
            self.anchor_time = now;
            self.paused = true;
        }
    }

    pub fn resume(&mut self, now: SystemTime) {
        if self.paused {
            self.anchor_time = now;
            self.paused = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(offset_secs: f64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs_f64(1_700_000_000.0 + offset_secs)
    }

    #[test]
    fn cycle_at_advances_with_cps() {
        let t0 = at(0.0);
        let tempo = Tempo::new(Ratio::new(1, 2), t0); // 0.5 cycles/sec
        let cycle = tempo.cycle_at(at(2.0));
        assert!((time_to_f64(cycle) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn set_cps_preserves_current_cycle() {
        let t0 = at(0.0);
        let mut tempo = Tempo::new(Ratio::new(1, 1), t0);
        let before = tempo.cycle_at(at(3.0));
        tempo.set_cps(Ratio::new(2, 1), at(3.0));
        let after = tempo.cycle_at(at(3.0));
        assert!((time_to_f64(before) - time_to_f64(after)).abs() < 1e-6);
    }

    #[test]
    fn set_cycle_rebases_immediately() {
        let t0 = at(0.0);
        let mut tempo = Tempo::new(Ratio::new(1, 1), t0);
        tempo.set_cycle(Ratio::new(5, 1), at(10.0));
        let cycle = tempo.cycle_at(at(10.0));
        assert!((time_to_f64(cycle) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn pause_freezes_cycle_position() {
        let t0 = at(0.0);
        let mut tempo = Tempo::new(Ratio::new(1, 1), t0);
        tempo.pause(at(2.0));
        let frozen = tempo.cycle_at(at(2.0));
        let still_frozen = tempo.cycle_at(at(10.0));
        assert_eq!(frozen, still_frozen);
    }

    #[test]
    fn resume_continues_from_pause_point() {
        let t0 = at(0.0);
        let mut tempo = Tempo::new(Ratio::new(1, 1), t0);
        tempo.pause(at(2.0));
        tempo.resume(at(5.0));
        let cycle = tempo.cycle_at(at(6.0));
        assert!((time_to_f64(cycle) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn zero_or_negative_cps_is_clamped() {
        let tempo = Tempo::new(Ratio::new(0, 1), at(0.0));
        assert!(tempo.cps() > Ratio::from_integer(0));
    }

    #[test]
    fn time_at_is_the_inverse_of_cycle_at_scenario() {
        // cps=0.5, set_cycle(0) at t0; first event of a cycle-0 pattern
        // should land exactly at t0.
        let t0 = at(0.0);
        let mut tempo = Tempo::new(Ratio::new(1, 2), t0);
        tempo.set_cycle(Ratio::from_integer(0), t0);
        let onset = tempo.time_at(Ratio::from_integer(0));
        assert!((onset - to_secs(t0)).abs() < 1e-6);
    }
}
