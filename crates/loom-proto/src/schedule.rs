//! Per-target schedule modes (spec.md §6): how a message's timestamp is
//! carried on the wire. "Live" mode carries no timestamp at all — the
//! dispatcher sleeps until `t_on` itself and sends a bare message.

use crate::error::ProtoError;
use crate::wire::{ntp_time, unix_seconds_micros};
use rosc::{OscBundle, OscMessage, OscPacket, OscType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    BundleStamped,
    MessageStamped,
    Live,
}

/// Encode `msg` for the wire according to `mode`, given its wall-clock
/// onset `t_on` (Unix seconds; see `Tempo::time_at`).
pub fn encode_scheduled(mode: ScheduleMode, msg: OscMessage, t_on: f64) -> Result<Vec<u8>, ProtoError> {
    let packet = match mode {
        ScheduleMode::BundleStamped => OscPacket::Bundle(OscBundle {
            timetag: ntp_time(t_on),
            content: vec![OscPacket::Message(msg)],
        }),
        ScheduleMode::MessageStamped => {
            let (secs, micros) = unix_seconds_micros(t_on);
            let mut stamped = msg;
            let mut args = vec![OscType::Int(secs), OscType::Int(micros)];
            args.extend(stamped.args.drain(..));
            stamped.args = args;
            OscPacket::Message(stamped)
        }
        ScheduleMode::Live => OscPacket::Message(msg),
    };
    rosc::encoder::encode(&packet).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg() -> OscMessage {
        OscMessage {
            addr: "/dirt/play".to_string(),
            args: vec![OscType::String("bd".into())],
        }
    }

    #[test]
    fn bundle_stamped_encodes_as_a_bundle() {
        let bytes = encode_scheduled(ScheduleMode::BundleStamped, msg(), 1000.0).unwrap();
        assert!(bytes.starts_with(b"#bundle\0"));
    }

    #[test]
    fn message_stamped_prepends_two_int_args() {
        let bytes = encode_scheduled(ScheduleMode::MessageStamped, msg(), 1000.5).unwrap();
        assert!(!bytes.starts_with(b"#bundle\0"));
        assert!(bytes.len() > msg().args.len());
    }

    #[test]
    fn live_mode_encodes_a_bare_message() {
        let bytes = encode_scheduled(ScheduleMode::Live, msg(), 1000.0).unwrap();
        assert!(!bytes.starts_with(b"#bundle\0"));
    }
}
