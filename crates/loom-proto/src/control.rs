//! Parsing the incoming control port (spec.md §4.I, §6): `/ctrl`,
//! mute/solo family, `/hush`, `/silence`.

use crate::error::ProtoError;
use loom_core::Value;
use rosc::{OscMessage, OscType};

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetControl { name: String, value: Value },
    Mute(Option<String>),
    Unmute(Option<String>),
    Solo(Option<String>),
    Unsolo(Option<String>),
    MuteAll,
    UnmuteAll,
    UnsoloAll,
    Hush,
    Silence(Option<String>),
}

fn osc_to_value(arg: &OscType) -> Option<Value> {
    match arg {
        OscType::Int(i) => Some(Value::Int32(*i)),
        OscType::Float(f) => Some(Value::Double(*f as f64)),
        OscType::Double(f) => Some(Value::Double(*f)),
        OscType::String(s) => Some(Value::String(s.clone())),
        OscType::Bool(b) => Some(Value::Bool(*b)),
        _ => None,
    }
}

fn optional_id(msg: &OscMessage) -> Option<String> {
    msg.args.first().and_then(|a| match a {
        OscType::String(s) => Some(s.clone()),
        _ => None,
    })
}

pub fn parse_control_message(msg: &OscMessage) -> Result<ControlCommand, ProtoError> {
    match msg.addr.as_str() {
        "/ctrl" => {
            let name = match msg.args.first() {
                Some(OscType::String(s)) => s.clone(),
                _ => return Err(ProtoError::MissingArgument),
            };
            let value = msg
                .args
                .get(1)
                .and_then(osc_to_value)
                .ok_or(ProtoError::MissingArgument)?;
            Ok(ControlCommand::SetControl { name, value })
        }
        "/mute" => Ok(ControlCommand::Mute(optional_id(msg))),
        "/unmute" => Ok(ControlCommand::Unmute(optional_id(msg))),
        "/solo" => Ok(ControlCommand::Solo(optional_id(msg))),
        "/unsolo" => Ok(ControlCommand::Unsolo(optional_id(msg))),
        "/muteAll" => Ok(ControlCommand::MuteAll),
        "/unmuteAll" => Ok(ControlCommand::UnmuteAll),
        "/unsoloAll" => Ok(ControlCommand::UnsoloAll),
        "/hush" => Ok(ControlCommand::Hush),
        "/silence" => Ok(ControlCommand::Silence(optional_id(msg))),
        other => Err(ProtoError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ctrl_with_float_value() {
        let msg = OscMessage {
            addr: "/ctrl".to_string(),
            args: vec![OscType::String("speed".into()), OscType::Float(1.5)],
        };
        let cmd = parse_control_message(&msg).unwrap();
        assert_eq!(
            cmd,
            ControlCommand::SetControl {
                name: "speed".to_string(),
                value: Value::Double(1.5)
            }
        );
    }

    #[test]
    fn parses_mute_with_target_id() {
        let msg = OscMessage {
            addr: "/mute".to_string(),
            args: vec![OscType::String("d1".into())],
        };
        assert_eq!(
            parse_control_message(&msg).unwrap(),
            ControlCommand::Mute(Some("d1".to_string()))
        );
    }

    #[test]
    fn hush_takes_no_arguments() {
        let msg = OscMessage {
            addr: "/hush".to_string(),
            args: vec![],
        };
        assert_eq!(parse_control_message(&msg).unwrap(), ControlCommand::Hush);
    }

    #[test]
    fn unknown_path_is_an_error() {
        let msg = OscMessage {
            addr: "/nonsense".to_string(),
            args: vec![],
        };
        assert!(parse_control_message(&msg).is_err());
    }
}
