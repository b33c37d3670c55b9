//! Socket.IO v4 text packets over Engine.IO v4.
//!
//! Only the default namespace is used, so packets carry no namespace prefix.
//!
//! ```text
//! 0{"sid":..}        open (server)
//! 2 / 3              ping (server) / pong (client)
//! 40{..}             connect: auth payload (client) or ack (server)
//! 41                 disconnect
//! 42["data","..."]   event
//! 44{"message":..}   connect error (server)
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Engine.IO pong, sent in reply to a server ping.
pub const PONG: &str = "3";

/// Socket.IO disconnect for the default namespace.
pub const DISCONNECT: &str = "41";

/// Event name the collector listens on.
pub const DATA_EVENT: &str = "data";

/// Handshake data carried by the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl OpenInfo {
    /// How long the server may stay silent before the session is dead.
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// A decoded inbound packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(OpenInfo),
    Close,
    Ping,
    Pong,
    Connect(Option<Value>),
    Disconnect,
    Event(Value),
    ConnectError(String),
    /// Upgrade, noop, acks and anything else the relay ignores.
    Other,
}

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,

    #[error("malformed packet payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Decode one WebSocket text frame.
pub fn decode(frame: &str) -> Result<Packet, PacketError> {
    let mut chars = frame.chars();
    let engine_type = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();

    let packet = match engine_type {
        '0' => Packet::Open(serde_json::from_str(rest)?),
        '1' => Packet::Close,
        '2' => Packet::Ping,
        '3' => Packet::Pong,
        '4' => decode_socket(rest)?,
        _ => Packet::Other,
    };
    Ok(packet)
}

fn decode_socket(frame: &str) -> Result<Packet, PacketError> {
    let mut chars = frame.chars();
    let socket_type = chars.next().ok_or(PacketError::Empty)?;
    let payload = chars.as_str();

    let packet = match socket_type {
        '0' if payload.is_empty() => Packet::Connect(None),
        '0' => Packet::Connect(Some(serde_json::from_str(payload)?)),
        '1' => Packet::Disconnect,
        '2' => Packet::Event(serde_json::from_str(payload)?),
        '4' => {
            let value: Value = serde_json::from_str(payload)?;
            let reason = match &value {
                Value::Object(fields) => fields
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Packet::ConnectError(reason)
        }
        _ => Packet::Other,
    };
    Ok(packet)
}

/// Namespace connect carrying the auth payload.
pub fn encode_connect<A: Serialize>(auth: &A) -> Result<String, serde_json::Error> {
    Ok(format!("40{}", serde_json::to_string(auth)?))
}

/// Event packet: `42["<event>","<text>"]`.
pub fn encode_event(event: &str, text: &str) -> Result<String, serde_json::Error> {
    Ok(format!("42{}", serde_json::to_string(&[event, text])?))
}
