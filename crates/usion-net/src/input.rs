//! Extraction of `input` message payloads from the inbound envelope (§4.6).
//!
//! Actual action data for `input` is found at `payload.action_data`, with a
//! fallback to `payload` itself when `action_data` is absent — some older
//! clients send the action fields at the top level of `payload`.

use serde::Deserialize;
use thiserror::Error;

use usion_types::InputSnapshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputPayloadError {
    #[error("input payload is not a JSON object")]
    NotAnObject,
    #[error("input payload failed to deserialize: {0}")]
    Malformed(String),
}

/// Raw wire shape of an `input` message's action data. Field names match the
/// client contract; `fire_seq` correlates a spawned projectile with the
/// client's own prediction, independent of the `fire_pressed` edge flag.
#[derive(Debug, Clone, Deserialize)]
struct RawInputAction {
    #[serde(default)]
    turn: f64,
    #[serde(default)]
    thrust: f64,
    #[serde(default)]
    fire: bool,
    #[serde(default)]
    fire_pressed: bool,
    #[serde(default)]
    fire_seq: u64,
    #[serde(default)]
    lag_comp_ms: f64,
}

/// Resolves `payload.action_data` (falling back to `payload` itself) into an
/// [`InputSnapshot`], clamped to its valid ranges. `fire_pressed` is taken
/// directly off the wire (§4.3: "sets fire-pressed strictly on the boolean
/// received") — the server does not infer it from `fire_seq`.
pub fn resolve_input_payload(payload: &serde_json::Value) -> Result<InputSnapshot, InputPayloadError> {
    let Some(obj) = payload.as_object() else {
        return Err(InputPayloadError::NotAnObject);
    };

    let action_value = obj.get("action_data").unwrap_or(payload);

    let raw: RawInputAction = serde_json::from_value(action_value.clone())
        .map_err(|e| InputPayloadError::Malformed(e.to_string()))?;

    Ok(InputSnapshot {
        turn: raw.turn,
        thrust: raw.thrust,
        fire: raw.fire,
        fire_pressed: raw.fire_pressed,
        fire_seq: raw.fire_seq,
        lag_comp_ms: raw.lag_comp_ms,
    }
    .clamped())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_action_data_when_present() {
        let payload = json!({
            "action_data": {"turn": 0.5, "thrust": 1.0, "fire": true, "fire_pressed": true, "fire_seq": 3},
        });
        let snap = resolve_input_payload(&payload).unwrap();
        assert_eq!(snap.turn, 0.5);
        assert!(snap.fire);
        assert!(snap.fire_pressed);
        assert_eq!(snap.fire_seq, 3);
    }

    #[test]
    fn falls_back_to_payload_root_when_action_data_absent() {
        let payload = json!({"turn": -1.0, "thrust": 0.3, "fire": false, "fire_seq": 7});
        let snap = resolve_input_payload(&payload).unwrap();
        assert_eq!(snap.turn, -1.0);
        assert_eq!(snap.fire_seq, 7);
    }

    #[test]
    fn clamps_out_of_range_fields() {
        let payload = json!({"turn": 5.0, "thrust": -9.0, "lag_comp_ms": 999.0});
        let snap = resolve_input_payload(&payload).unwrap();
        assert_eq!(snap.turn, 1.0);
        assert_eq!(snap.thrust, -1.0);
        assert_eq!(snap.lag_comp_ms, 120.0);
    }

    #[test]
    fn rejects_non_object_payload() {
        let payload = json!("not-an-object");
        assert_eq!(resolve_input_payload(&payload), Err(InputPayloadError::NotAnObject));
    }
}
