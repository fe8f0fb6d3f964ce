//! The wire protocol spoken to playback targets: OSC messages and
//! bundles, message templates, control-bus references, the handshake
//! that learns a target's bus table, and the incoming control port.
//!
//! This crate is pure encode/decode logic — no sockets. `loom-daemon`
//! owns the UDP sends and receives and drives this crate's functions.

pub mod bus;
pub mod control;
pub mod error;
pub mod handshake;
pub mod message;
pub mod schedule;
pub mod wire;

pub use bus::BusTable;
pub use control::ControlCommand;
pub use error::ProtoError;
pub use message::MessageTemplate;
pub use schedule::ScheduleMode;
