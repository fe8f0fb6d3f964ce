//! Message templates: turning a resolved event's control map into the
//! OSC argument list sent to a target (spec.md §6, "message templates").

use crate::error::ProtoError;
use crate::wire::value_to_osc;
use loom_core::{ControlMap, Event, Value};
use rosc::{OscMessage, OscType};

#[derive(Debug, Clone)]
pub enum MessageTemplate {
    /// `[(name, default)]`: emit arguments in declared order, event value
    /// over default.
    Positional(Vec<(String, Value)>),
    /// Require every key present; emit `[name1, v1, name2, v2, ...]`.
    Named(Vec<String>),
    /// `[patternID, delta, cycle, bx, by, ex, ey]` for editor highlighting.
    Context,
}

/// Build the OSC arguments for one event against one template. `path`
/// is the target's play-path address (e.g. `/dirt/play`).
pub fn build_message(
    path: &str,
    template: &MessageTemplate,
    pattern_id: &str,
    event: &Event<ControlMap>,
) -> Result<OscMessage, ProtoError> {
    let args = match template {
        MessageTemplate::Positional(fields) => {
            let mut args = Vec::with_capacity(fields.len());
            for (name, default) in fields {
                let value = event.value.get(name).unwrap_or(default);
                args.push(value_to_osc(value)?);
            }
            args
        }
        MessageTemplate::Named(required) => {
            let mut args = Vec::with_capacity(required.len() * 2);
            for name in required {
                let value = event
                    .value
                    .get(name)
                    .ok_or_else(|| ProtoError::MissingKey(name.clone()))?;
                args.push(OscType::String(name.clone()));
                args.push(value_to_osc(value)?);
            }
            args
        }
        MessageTemplate::Context => build_context_args(pattern_id, event),
    };
    Ok(OscMessage {
        addr: path.to_string(),
        args,
    })
}

fn build_context_args(pattern_id: &str, event: &Event<ControlMap>) -> Vec<OscType> {
    let whole = event.whole_or_active();
    let delta = whole.duration();
    let cycle = whole.begin.to_integer();
    let (bx, by) = event
        .metadata
        .first()
        .map(|p| (p.line as i32, p.column as i32))
        .unwrap_or((0, 0));
    let (ex, ey) = event
        .metadata
        .last()
        .map(|p| (p.line as i32, p.column as i32))
        .unwrap_or((bx, by));
    vec![
        OscType::String(pattern_id.to_string()),
        OscType::Float(*delta.numer() as f32 / *delta.denom() as f32),
        OscType::Int(cycle as i32),
        OscType::Int(bx),
        OscType::Int(by),
        OscType::Int(ex),
        OscType::Int(ey),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::{Span, SourcePos};
    use num_rational::Ratio;

    fn event(controls: ControlMap) -> Event<ControlMap> {
        let span = Span::new(Ratio::from_integer(0), Ratio::new(1, 2));
        Event::discrete(span, span, controls)
    }

    #[test]
    fn positional_template_falls_back_to_default() {
        let mut controls = ControlMap::new();
        controls.insert("n".to_string(), Value::Int32(3));
        let template = MessageTemplate::Positional(vec![
            ("n".to_string(), Value::Int32(0)),
            ("gain".to_string(), Value::Double(1.0)),
        ]);
        let msg = build_message("/dirt/play", &template, "p1", &event(controls)).unwrap();
        assert_eq!(msg.args, vec![OscType::Int(3), OscType::Float(1.0)]);
    }

    #[test]
    fn named_template_errors_on_missing_key() {
        let template = MessageTemplate::Named(vec!["s".to_string()]);
        let result = build_message("/dirt/play", &template, "p1", &event(ControlMap::new()));
        assert!(result.is_err());
    }

    #[test]
    fn context_template_carries_source_position() {
        let mut controls = ControlMap::new();
        controls.insert("s".to_string(), Value::String("bd".into()));
        let mut e = event(controls);
        e.metadata = vec![SourcePos { line: 1, column: 4 }];
        let msg = build_message("/editor/ctx", &MessageTemplate::Context, "p1", &e).unwrap();
        assert_eq!(msg.args[0], OscType::String("p1".to_string()));
        assert_eq!(msg.args[3], OscType::Int(1));
        assert_eq!(msg.args[4], OscType::Int(4));
    }
}
