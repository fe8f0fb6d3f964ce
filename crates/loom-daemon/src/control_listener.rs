//! The incoming control port (spec.md §4.I): a UDP listener translating
//! `loom-proto` control commands into `Action`s for the dispatcher.

use std::net::UdpSocket;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use loom_proto::control::{parse_control_message, ControlCommand};
use tracing::{error, warn};

use crate::dispatch::Action;
use crate::error::DaemonError;

/// Bind the control port and loop forever, translating datagrams into
/// actions on `tx` until `shutdown` is set.
pub fn run(port: u16, tx: Sender<Action>, shutdown: Arc<AtomicBool>) -> Result<(), DaemonError> {
    let socket =
        UdpSocket::bind(("0.0.0.0", port)).map_err(|e| DaemonError::ListenerBind(port, e))?;
    socket
        .set_read_timeout(Some(std::time::Duration::from_millis(200)))
        .map_err(|e| DaemonError::ListenerBind(port, e))?;

    let mut buf = [0u8; 4096];
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(());
        }
        let n = match socket.recv(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                continue;
            }
            Err(e) => {
                warn!(error = %e, "control socket recv failed");
                continue;
            }
        };

        let (_, packet) = match rosc::decoder::decode_udp(&buf[..n]) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to decode control packet");
                continue;
            }
        };

        for msg in flatten(packet) {
            match parse_control_message(&msg) {
                Ok(cmd) => dispatch_command(cmd, &tx),
                Err(e) => warn!(addr = %msg.addr, error = %e, "unrecognized control message"),
            }
        }
    }
}

fn flatten(packet: rosc::OscPacket) -> Vec<rosc::OscMessage> {
    match packet {
        rosc::OscPacket::Message(m) => vec![m],
        rosc::OscPacket::Bundle(b) => b.content.into_iter().flat_map(flatten).collect(),
    }
}

fn dispatch_command(cmd: ControlCommand, tx: &Sender<Action>) {
    let action = match cmd {
        ControlCommand::SetControl { name, value } => Action::SetControl(name, value),
        ControlCommand::Mute(Some(id)) => Action::Mute(id),
        ControlCommand::Mute(None) => Action::MuteAll,
        ControlCommand::Unmute(Some(id)) => Action::Unmute(id),
        ControlCommand::Unmute(None) => Action::UnmuteAll,
        ControlCommand::Solo(Some(id)) => Action::Solo(id),
        ControlCommand::Solo(None) => return,
        ControlCommand::Unsolo(Some(id)) => Action::Unsolo(id),
        ControlCommand::Unsolo(None) => Action::UnsoloAll,
        ControlCommand::MuteAll => Action::MuteAll,
        ControlCommand::UnmuteAll => Action::UnmuteAll,
        ControlCommand::UnsoloAll => Action::UnsoloAll,
        ControlCommand::Hush => Action::Hush,
        ControlCommand::Silence(Some(id)) => Action::Silence(id),
        ControlCommand::Silence(None) => Action::Hush,
    };
    if tx.send(action).is_err() {
        error!("dispatcher action channel closed; dropping control command");
    }
}
