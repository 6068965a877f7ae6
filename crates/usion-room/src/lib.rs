//! Room Runtime (§4.5) and Room Registry (§2): a match's lifecycle, input
//! admission, self-correcting tick scheduler, broadcast fan-out, and
//! termination/webhook handoff, plus the room-id-keyed registry that owns
//! `Room` instances.

mod config;
mod error;
mod latency;
mod outbound;
mod registry;
mod room;
mod session;

pub use config::RoomConfig;
pub use error::{RoomError, RoomResult};
pub use outbound::{outbound_channel, OutboundMessage, OutboundReceiver, OutboundSender};
pub use registry::RoomRegistry;
pub use room::{JoinOutcome, RemoveOutcome, Room, DISCONNECT_CLOSE_CODE};
pub use session::{waiting_for, MAX_PARTICIPANTS};

#[cfg(test)]
mod tests {
    use super::*;
    use usion_types::{SessionId, UserId};
    use usion_webhook::WebhookConfig;

    fn webhook_config() -> WebhookConfig {
        WebhookConfig {
            api_base_url: "http://127.0.0.1:1".to_string(),
            service_id: "arena".to_string(),
            signing_key_id: "key-1".to_string(),
            signing_secret: "secret".to_string(),
        }
    }

    #[test]
    fn first_join_adds_participant_and_reports_waiting_for_one() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&usion_types::RoomId::new("room-1"));
        let (tx, _rx) = outbound_channel();
        match room.upsert_session(SessionId::new("s1"), UserId::new("u1"), tx) {
            JoinOutcome::Added { player_ids, waiting_for } => {
                assert_eq!(player_ids, vec![UserId::new("u1")]);
                assert_eq!(waiting_for, 1);
            }
            JoinOutcome::AlreadyJoined { .. } => panic!("expected a fresh join"),
        }
    }

    #[test]
    fn duplicate_session_id_is_idempotent_reconnect() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&usion_types::RoomId::new("room-1"));
        let (tx1, _rx1) = outbound_channel();
        room.upsert_session(SessionId::new("s1"), UserId::new("u1"), tx1);

        let (tx2, _rx2) = outbound_channel();
        match room.upsert_session(SessionId::new("s1"), UserId::new("u1"), tx2) {
            JoinOutcome::AlreadyJoined { player_ids, waiting_for } => {
                assert_eq!(player_ids, vec![UserId::new("u1")]);
                assert_eq!(waiting_for, 1);
            }
            JoinOutcome::Added { .. } => panic!("expected idempotent reconnect"),
        }
    }

    #[test]
    fn enqueue_input_rejects_when_room_not_running() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&usion_types::RoomId::new("room-1"));
        let err = room
            .enqueue_input(&UserId::new("u1"), 1, None, usion_sim::InputSnapshot::default())
            .unwrap_err();
        assert_eq!(err, RoomError::RoomNotRunning);
    }

    #[tokio::test]
    async fn second_join_starts_the_match() {
        let registry = RoomRegistry::new(RoomConfig::default(), webhook_config());
        let room = registry.get_or_create(&usion_types::RoomId::new("room-1"));
        let (tx1, _rx1) = outbound_channel();
        let (tx2, _rx2) = outbound_channel();
        room.upsert_session(SessionId::new("s1"), UserId::new("u1"), tx1);
        room.upsert_session(SessionId::new("s2"), UserId::new("u2"), tx2);

        let started = room.maybe_start();
        assert!(started.is_some());
        assert!(room.maybe_start().is_none(), "starting twice must be a no-op");
    }
}
