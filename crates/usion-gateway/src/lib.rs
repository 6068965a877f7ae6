//! The Connection Gateway (§4.6): verifies the upgrade token, buffers any
//! frames that arrive before verification finishes, then dispatches every
//! subsequent frame against the matched `Room`. This crate is transport-free
//! — it never touches an `axum::extract::ws::WebSocket` directly, so it can
//! be exercised without spinning up a server.

mod connection;
mod dispatch;
mod error;
mod state;

pub use connection::{ConnectionContext, PreAuthBuffer};
pub use dispatch::{dispatch, ConnDispatchState, DispatchAction};
pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;

#[cfg(test)]
mod tests {
    use usion_net::{inbound_type, outbound_type, InboundEnvelope};
    use usion_room::{outbound_channel, OutboundMessage, RoomConfig, RoomRegistry};
    use usion_types::{RoomId, SessionId, UserId};
    use usion_webhook::WebhookConfig;

    use super::*;

    fn webhook_config() -> WebhookConfig {
        WebhookConfig {
            api_base_url: "http://127.0.0.1:1".to_string(),
            service_id: "arena".to_string(),
            signing_key_id: "key-1".to_string(),
            signing_secret: "secret".to_string(),
        }
    }

    fn envelope(msg_type: &str, extra: serde_json::Value) -> InboundEnvelope {
        let mut body = serde_json::json!({"type": msg_type});
        body.as_object_mut().unwrap().extend(extra.as_object().unwrap().clone());
        serde_json::from_value(body).unwrap()
    }

    fn context(room_id: &str, user_id: &str, session_id: &str) -> ConnectionContext {
        ConnectionContext {
            user_id: UserId::new(user_id),
            room_id: RoomId::new(room_id),
            session_id: SessionId::new(session_id),
        }
    }

    #[test]
    fn join_reply_carries_player_id_and_waiting_for() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&RoomId::new("room-1"));
        let (tx, mut rx) = outbound_channel();
        let ctx = context("room-1", "u1", "s1");
        let mut state = ConnDispatchState::new(tx);

        let action = dispatch(&room, &ctx, &mut state, envelope(inbound_type::JOIN, serde_json::json!({"payload": {}})));
        assert_eq!(action, DispatchAction::Continue);

        let OutboundMessage::Frame(frame) = rx.try_recv().unwrap() else {
            panic!("expected a frame");
        };
        assert!(frame.contains(&format!("\"{}\"", outbound_type::JOINED)));
        assert!(frame.contains("\"waiting_for\":1"));
    }

    #[tokio::test]
    async fn second_join_starts_match_and_broadcasts_game_start() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&RoomId::new("room-1"));

        let (tx1, mut rx1) = outbound_channel();
        let ctx1 = context("room-1", "u1", "s1");
        let mut state1 = ConnDispatchState::new(tx1);
        dispatch(&room, &ctx1, &mut state1, envelope(inbound_type::JOIN, serde_json::json!({"payload": {}})));

        let (tx2, mut rx2) = outbound_channel();
        let ctx2 = context("room-1", "u2", "s2");
        let mut state2 = ConnDispatchState::new(tx2);
        dispatch(&room, &ctx2, &mut state2, envelope(inbound_type::JOIN, serde_json::json!({"payload": {}})));

        // joined, player_joined (for u2) -> u1's channel; joined -> u2's channel, then game_start to both.
        let mut saw_game_start_on_1 = false;
        while let Ok(OutboundMessage::Frame(frame)) = rx1.try_recv() {
            if frame.contains(&format!("\"{}\"", outbound_type::GAME_START)) {
                saw_game_start_on_1 = true;
            }
        }
        let mut saw_game_start_on_2 = false;
        while let Ok(OutboundMessage::Frame(frame)) = rx2.try_recv() {
            if frame.contains(&format!("\"{}\"", outbound_type::GAME_START)) {
                saw_game_start_on_2 = true;
            }
        }
        assert!(saw_game_start_on_1 && saw_game_start_on_2);
    }

    #[test]
    fn input_before_match_start_is_rejected() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&RoomId::new("room-1"));
        let (tx, mut rx) = outbound_channel();
        let ctx = context("room-1", "u1", "s1");
        let mut state = ConnDispatchState::new(tx);

        dispatch(&room, &ctx, &mut state, envelope(inbound_type::JOIN, serde_json::json!({"payload": {}})));
        let _ = rx.try_recv();

        dispatch(
            &room,
            &ctx,
            &mut state,
            envelope(inbound_type::INPUT, serde_json::json!({"seq": 1, "payload": {"turn": 0.5}})),
        );

        let OutboundMessage::Frame(frame) = rx.try_recv().unwrap() else {
            panic!("expected an error frame");
        };
        assert!(frame.contains(&format!("\"{}\"", outbound_type::ERROR)));
        assert!(frame.contains("ROOM_NOT_RUNNING"));
    }

    #[test]
    fn leave_broadcasts_player_left_and_closes() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&RoomId::new("room-1"));
        let (tx, mut rx) = outbound_channel();
        let ctx = context("room-1", "u1", "s1");
        let mut state = ConnDispatchState::new(tx);

        dispatch(&room, &ctx, &mut state, envelope(inbound_type::JOIN, serde_json::json!({"payload": {}})));
        let _ = rx.try_recv();

        let action = dispatch(&room, &ctx, &mut state, envelope(inbound_type::LEAVE, serde_json::json!({"payload": {}})));
        assert_eq!(action, DispatchAction::Close);

        let OutboundMessage::Frame(frame) = rx.try_recv().unwrap() else {
            panic!("expected player_left");
        };
        assert!(frame.contains(&format!("\"{}\"", outbound_type::PLAYER_LEFT)));
    }

    #[test]
    fn unknown_message_type_is_ignored() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&RoomId::new("room-1"));
        let (tx, mut rx) = outbound_channel();
        let ctx = context("room-1", "u1", "s1");
        let mut state = ConnDispatchState::new(tx);

        let action = dispatch(&room, &ctx, &mut state, envelope("teleport", serde_json::json!({"payload": {}})));
        assert_eq!(action, DispatchAction::Continue);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn gateway_state_authenticates_and_a_pre_auth_buffer_drains_in_order() {
        // Exercises `PreAuthBuffer` the way a socket task would: frames that
        // arrive while `GatewayState::authenticate` is still in flight are
        // queued, then replayed through `dispatch` once a `ConnectionContext`
        // is available.
        let mut buf = PreAuthBuffer::new();
        buf.push(envelope(inbound_type::JOIN, serde_json::json!({"payload": {}})));
        buf.push(envelope(inbound_type::PING, serde_json::json!({"payload": {}})));
        assert_eq!(buf.len(), 2);

        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&RoomId::new("room-1"));
        let (tx, mut rx) = outbound_channel();
        let ctx = context("room-1", "u1", "s1");
        let mut state = ConnDispatchState::new(tx);

        for frame in buf.drain() {
            dispatch(&room, &ctx, &mut state, frame);
        }
        assert!(buf.is_empty());

        let mut saw_joined = false;
        let mut saw_pong = false;
        while let Ok(OutboundMessage::Frame(frame)) = rx.try_recv() {
            if frame.contains(&format!("\"{}\"", outbound_type::JOINED)) {
                saw_joined = true;
            }
            if frame.contains(&format!("\"{}\"", outbound_type::PONG)) {
                saw_pong = true;
            }
        }
        assert!(saw_joined && saw_pong);
    }
}
