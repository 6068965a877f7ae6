//! Outbound payload bodies, one struct per message type in the §6 table.

use std::collections::HashMap;

use serde::Serialize;

use usion_types::{TerminationReason, UserId};

use crate::delta::{ChangedEntities, RemovedEntities};
use crate::projection::NetWorldState;

/// Static per-deployment facts echoed on every frame that carries them
/// (§4.5.3, §6). Cheap to clone; held once on `Room`/`GatewayState`.
#[derive(Debug, Clone, Serialize)]
pub struct DeployProfile {
    pub deploy_region: String,
    pub sim_hz: u32,
    pub net_hz: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinedPayload {
    pub room_id: String,
    pub player_id: String,
    pub player_ids: Vec<UserId>,
    pub waiting_for: u32,
    #[serde(flatten)]
    pub deploy: DeployProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerJoinedPayload {
    pub room_id: String,
    pub player_id: String,
    pub player_ids: Vec<UserId>,
    pub waiting_for: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerLeftPayload {
    pub room_id: String,
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameStartPayload {
    pub room_id: String,
    pub player_ids: Vec<UserId>,
    #[serde(flatten)]
    pub deploy: DeployProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshotPayload {
    pub room_id: String,
    pub protocol_version: &'static str,
    pub server_ts: i64,
    pub server_tick: u64,
    pub ack_seq_by_player: HashMap<UserId, u64>,
    pub full_state: NetWorldState,
    #[serde(flatten)]
    pub deploy: DeployProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateDeltaPayload {
    pub room_id: String,
    pub protocol_version: &'static str,
    pub server_ts: i64,
    pub server_tick: u64,
    pub ack_seq_by_player: HashMap<UserId, u64>,
    pub changed_entities: ChangedEntities,
    pub removed_entities: RemovedEntities,
    #[serde(flatten)]
    pub deploy: DeployProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongPayload {
    pub room_id: String,
    pub server_tick: u64,
    pub server_ts: i64,
    #[serde(flatten)]
    pub deploy: DeployProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchEndPayload {
    pub room_id: String,
    pub protocol_version: &'static str,
    pub server_ts: i64,
    pub server_tick: u64,
    pub winner_ids: Vec<UserId>,
    pub reason: TerminationReason,
    pub final_stats: HashMap<UserId, FinalStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalStats {
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: f64,
    pub pickups_collected: u32,
}

/// Error codes used in `{type: "error", payload: {code, ...}}` (§6, §7).
pub mod error_code {
    pub const NO_TOKEN: &str = "NO_TOKEN";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const INPUT_REJECTED: &str = "INPUT_REJECTED";
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// §6 writes every other outbound field snake_case; this one is the
    /// interface table's own exception (`expectedGt`), so it's renamed on
    /// the wire rather than normalized to match its neighbors.
    #[serde(rename = "expectedGt", skip_serializing_if = "Option::is_none")]
    pub expected_gt: Option<u64>,
}

impl ErrorPayload {
    pub fn no_token() -> Self {
        Self {
            code: error_code::NO_TOKEN,
            message: None,
            reason: None,
            expected_gt: None,
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self {
            code: error_code::INVALID_TOKEN,
            message: Some(message.into()),
            reason: None,
            expected_gt: None,
        }
    }

    pub fn input_rejected(reason: &'static str, expected_gt: Option<u64>) -> Self {
        Self {
            code: error_code::INPUT_REJECTED,
            message: None,
            reason: Some(reason),
            expected_gt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_omits_absent_fields() {
        let payload = ErrorPayload::no_token();
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"code":"NO_TOKEN"}"#);
    }

    #[test]
    fn input_rejected_carries_reason() {
        let payload = ErrorPayload::input_rejected("STALE_INPUT", None);
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""reason":"STALE_INPUT""#));
    }

    #[test]
    fn expected_gt_serializes_as_camel_case_on_the_wire() {
        let payload = ErrorPayload::input_rejected("STALE_INPUT", Some(5));
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""expectedGt":5"#));
        assert!(!json.contains("expected_gt"));
    }
}
