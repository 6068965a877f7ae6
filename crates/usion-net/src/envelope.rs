//! Inbound/outbound message envelopes (§6).

use serde::{Deserialize, Serialize};

/// One JSON frame from a client. `payload` is deferred to a `serde_json::Value`
/// because its shape depends on `msg_type`; callers parse it with
/// [`crate::input::resolve_input_payload`] or a direct `serde_json::from_value`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub ts: Option<i64>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Inbound message type tags (§6).
pub mod inbound_type {
    pub const JOIN: &str = "join";
    pub const INPUT: &str = "input";
    pub const PING: &str = "ping";
    pub const LEAVE: &str = "leave";
}

/// Outbound message type tags (§6).
pub mod outbound_type {
    pub const JOINED: &str = "joined";
    pub const PLAYER_JOINED: &str = "player_joined";
    pub const PLAYER_LEFT: &str = "player_left";
    pub const GAME_START: &str = "game_start";
    pub const STATE_SNAPSHOT: &str = "state_snapshot";
    pub const STATE_DELTA: &str = "state_delta";
    pub const PONG: &str = "pong";
    pub const MATCH_END: &str = "match_end";
    pub const ERROR: &str = "error";
}

/// `{type, payload}` — the fixed envelope every outbound frame uses.
#[derive(Debug, Clone, Serialize)]
pub struct Outbound<T: Serialize> {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub payload: T,
}

impl<T: Serialize> Outbound<T> {
    pub fn new(msg_type: &'static str, payload: T) -> Self {
        Self { msg_type, payload }
    }

    /// Serializes to the single JSON text frame sent over the socket.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_envelope_parses_minimal_join() {
        let raw = r#"{"type":"join","seq":1,"ts":1000,"payload":{}}"#;
        let env: InboundEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(env.msg_type, "join");
        assert_eq!(env.seq, Some(1));
    }

    #[test]
    fn outbound_envelope_serializes_type_and_payload() {
        #[derive(Serialize)]
        struct P {
            x: u32,
        }
        let out = Outbound::new(outbound_type::PONG, P { x: 1 });
        let json = out.to_json().unwrap();
        assert!(json.contains(r#""type":"pong""#));
        assert!(json.contains(r#""x":1"#));
    }
}
