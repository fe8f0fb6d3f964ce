//! The optional `/dirt/handshake` exchange that populates a target's
//! `BusTable`.

use crate::bus::BusTable;
use crate::error::ProtoError;
use rosc::{OscMessage, OscPacket, OscType};

pub const HANDSHAKE_REQUEST_PATH: &str = "/dirt/handshake";
pub const HANDSHAKE_REPLY_PATH: &str = "/dirt/handshake/reply";

pub fn handshake_request() -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: HANDSHAKE_REQUEST_PATH.to_string(),
        args: Vec::new(),
    })
}

/// Parse a `/dirt/handshake/reply` message's
/// `&controlBusIndices, id, id, ...` payload into a `BusTable`.
pub fn parse_handshake_reply(msg: &OscMessage) -> Result<BusTable, ProtoError> {
    if msg.addr != HANDSHAKE_REPLY_PATH {
        return Err(ProtoError::UnknownCommand(msg.addr.clone()));
    }
    let mut args = msg.args.iter();
    match args.next() {
        Some(OscType::String(marker)) if marker == "&controlBusIndices" => {}
        _ => return Err(ProtoError::MalformedHandshake),
    }
    let indices = args
        .map(|a| match a {
            OscType::Int(i) => Ok(*i),
            _ => Err(ProtoError::MalformedHandshake),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BusTable::from_indices(indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let msg = OscMessage {
            addr: HANDSHAKE_REPLY_PATH.to_string(),
            args: vec![
                OscType::String("&controlBusIndices".to_string()),
                OscType::Int(10),
                OscType::Int(11),
            ],
        };
        let table = parse_handshake_reply(&msg).unwrap();
        assert_eq!(table.resolve(0), 10);
        assert_eq!(table.resolve(1), 11);
    }

    #[test]
    fn rejects_reply_missing_marker() {
        let msg = OscMessage {
            addr: HANDSHAKE_REPLY_PATH.to_string(),
            args: vec![OscType::Int(10)],
        };
        assert!(parse_handshake_reply(&msg).is_err());
    }
}
