//! Protocol-layer error taxonomy (spec.md §7 items 3–4: send/listener
//! errors are always recoverable — callers log and continue).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("malformed OSC packet: {0}")]
    Decode(#[from] rosc::OscError),

    #[error("control message is missing a required argument")]
    MissingArgument,

    #[error("unrecognized control command {0:?}")]
    UnknownCommand(String),

    #[error("message template requires key {0:?} which the event does not provide")]
    MissingKey(String),

    #[error("handshake reply malformed: expected '&controlBusIndices' prefix")]
    MalformedHandshake,

    #[error("signal-valued control {0:?} reached the wire encoder unresolved")]
    UnresolvedSignal(String),
}
