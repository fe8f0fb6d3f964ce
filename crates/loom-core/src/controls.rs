//! Resolving signal-valued controls once per tick.

use crate::arc::Span;
use crate::pattern::State;
use crate::time::Time;
use crate::value::{ControlMap, Value};

/// Resolve every `Value::Signal` entry in `controls` into a concrete
/// value by querying it at `at` (the start of the tick's arc), leaving
/// every other entry untouched. Runs once per tick, before the dispatch
/// pipeline queries the composite pattern — so every pattern sees a
/// stable snapshot of live control values for the whole tick.
pub fn resolve_state(controls: &ControlMap, at: Time) -> ControlMap {
    controls
        .iter()
        .map(|(k, v)| {
            let resolved = match v {
                Value::Signal(p) => {
                    let state = State::new(Span::point(at));
                    p.query(&state)
                        .into_iter()
                        .next()
                        .map(|e| e.value)
                        .unwrap_or(Value::Double(0.0))
                }
                other => other.clone(),
            };
            (k.clone(), resolved)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::signal;
    use num_rational::Ratio;

    #[test]
    fn resolves_signal_to_concrete_value() {
        let mut controls = ControlMap::new();
        controls.insert(
            "speed".to_string(),
            Value::Signal(signal(|_| Value::Double(1.5))),
        );
        controls.insert("gain".to_string(), Value::Double(0.8));

        let resolved = resolve_state(&controls, Ratio::new(0, 1));
        assert_eq!(resolved.get("speed"), Some(&Value::Double(1.5)));
        assert_eq!(resolved.get("gain"), Some(&Value::Double(0.8)));
    }
}
