//! A configured downstream playback target: its send socket, message
//! template, schedule mode, and (optionally) a bus table learned via
//! handshake (spec.md §6).

use std::net::UdpSocket;
use std::time::Duration;

use loom_conf::{FieldDefault, MessageTemplateConfig, ScheduleMode as ConfScheduleMode, TargetConfig};
use loom_core::Value;
use loom_proto::{handshake, BusTable, MessageTemplate, ScheduleMode};
use tracing::{info, warn};

pub struct Target {
    pub name: String,
    pub config: TargetConfig,
    pub template: MessageTemplate,
    pub schedule_mode: ScheduleMode,
    pub socket: UdpSocket,
    pub bus_table: BusTable,
}

fn to_value(d: &FieldDefault) -> Value {
    match d {
        FieldDefault::Int(i) => Value::Int32(*i),
        FieldDefault::Float(f) => Value::Double(*f),
        FieldDefault::Text(s) => Value::String(s.clone()),
        FieldDefault::Bool(b) => Value::Bool(*b),
    }
}

fn to_template(t: &MessageTemplateConfig) -> MessageTemplate {
    match t {
        MessageTemplateConfig::Positional { fields } => {
            MessageTemplate::Positional(fields.iter().map(|(n, d)| (n.clone(), to_value(d))).collect())
        }
        MessageTemplateConfig::Named { keys } => MessageTemplate::Named(keys.clone()),
        MessageTemplateConfig::Context => MessageTemplate::Context,
    }
}

fn to_schedule_mode(mode: ConfScheduleMode) -> ScheduleMode {
    match mode {
        ConfScheduleMode::BundleStamped => ScheduleMode::BundleStamped,
        ConfScheduleMode::MessageStamped => ScheduleMode::MessageStamped,
        ConfScheduleMode::Live => ScheduleMode::Live,
    }
}

impl Target {
    pub fn connect(name: &str, config: &TargetConfig) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(&config.address)?;

        let bus_table = if config.handshake {
            match perform_handshake(&socket) {
                Ok(table) => table,
                Err(e) => {
                    warn!(target = name, error = %e, "handshake failed; using raw bus indices");
                    BusTable::default()
                }
            }
        } else {
            BusTable::default()
        };

        info!(target = name, address = %config.address, "connected to playback target");

        Ok(Target {
            name: name.to_string(),
            template: to_template(&config.template),
            schedule_mode: to_schedule_mode(config.schedule_mode),
            socket,
            bus_table,
            config: config.clone(),
        })
    }
}

fn perform_handshake(socket: &UdpSocket) -> Result<BusTable, String> {
    let packet = handshake::handshake_request();
    let bytes = rosc::encoder::encode(&packet).map_err(|e| e.to_string())?;
    socket.send(&bytes).map_err(|e| e.to_string())?;

    socket
        .set_read_timeout(Some(Duration::from_millis(200)))
        .map_err(|e| e.to_string())?;
    let mut buf = [0u8; 1024];
    let n = socket.recv(&mut buf).map_err(|e| e.to_string())?;
    socket.set_read_timeout(None).ok();

    let (_, reply) = rosc::decoder::decode_udp(&buf[..n]).map_err(|e| e.to_string())?;
    match reply {
        rosc::OscPacket::Message(msg) => handshake::parse_handshake_reply(&msg).map_err(|e| e.to_string()),
        rosc::OscPacket::Bundle(_) => Err("expected a handshake reply message, got a bundle".to_string()),
    }
}
