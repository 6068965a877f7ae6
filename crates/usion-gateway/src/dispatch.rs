//! Maps one inbound frame to the `Room` calls and outbound replies it
//! implies (§4.6). Pure with respect to the socket itself: all the actual
//! I/O happens through `Room::send_to`/`Room::broadcast`, which hand frames
//! to the session's outbound channel rather than writing the transport
//! directly.

use std::sync::Arc;

use usion_net::{inbound_type, outbound_type, payloads, InboundEnvelope};
use usion_room::{JoinOutcome, OutboundSender, RemoveOutcome, Room};

use crate::connection::ConnectionContext;

/// What the socket task should do after a dispatched frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    /// Keep reading.
    Continue,
    /// `leave` was processed; the socket should close normally.
    Close,
}

/// Per-connection state the dispatcher needs across calls but that doesn't
/// belong on `Room` itself: just the socket's outbound sender, handed to
/// `Room::upsert_session` on `join`.
pub struct ConnDispatchState {
    tx: OutboundSender,
}

impl ConnDispatchState {
    pub fn new(tx: OutboundSender) -> Self {
        Self { tx }
    }
}

/// Dispatches one parsed frame (§4.6's per-`type` table). `ctx` is the
/// identity bound at authentication; `room` is this connection's room,
/// looked up once and held for the life of the socket.
pub fn dispatch(room: &Arc<Room>, ctx: &ConnectionContext, state: &mut ConnDispatchState, envelope: InboundEnvelope) -> DispatchAction {
    match envelope.msg_type.as_str() {
        inbound_type::JOIN => {
            handle_join(room, ctx, state);
            DispatchAction::Continue
        }
        inbound_type::INPUT => {
            handle_input(room, ctx, &envelope);
            DispatchAction::Continue
        }
        inbound_type::PING => {
            handle_ping(room, ctx);
            DispatchAction::Continue
        }
        inbound_type::LEAVE => {
            handle_leave(room, ctx);
            DispatchAction::Close
        }
        other => {
            tracing::debug!(room_id = %ctx.room_id, msg_type = other, "ignoring unknown inbound message type");
            DispatchAction::Continue
        }
    }
}

/// `join` is also driven once, directly, right after the socket upgrade and
/// pre-auth buffer flush — the gateway's connection handler calls this the
/// same way it would for a client-sent `join` frame, so a reconnect and a
/// first join share one code path.
fn handle_join(room: &Arc<Room>, ctx: &ConnectionContext, state: &ConnDispatchState) {
    let outcome = room.upsert_session(ctx.session_id.clone(), ctx.user_id.clone(), state.tx.clone());

    let (player_ids, waiting_for, is_new) = match outcome {
        JoinOutcome::Added { player_ids, waiting_for } => (player_ids, waiting_for, true),
        JoinOutcome::AlreadyJoined { player_ids, waiting_for } => (player_ids, waiting_for, false),
    };

    room.send_to(
        &ctx.session_id,
        outbound_type::JOINED,
        payloads::JoinedPayload {
            room_id: ctx.room_id.to_string(),
            player_id: ctx.user_id.to_string(),
            player_ids: player_ids.clone(),
            waiting_for,
            deploy: room.deploy_profile(),
        },
    );

    if is_new {
        room.broadcast(
            outbound_type::PLAYER_JOINED,
            payloads::PlayerJoinedPayload {
                room_id: ctx.room_id.to_string(),
                player_id: ctx.user_id.to_string(),
                player_ids: player_ids.clone(),
                waiting_for,
            },
        );
    }

    if let Some(started_player_ids) = room.maybe_start() {
        room.broadcast(
            outbound_type::GAME_START,
            payloads::GameStartPayload {
                room_id: ctx.room_id.to_string(),
                player_ids: started_player_ids,
                deploy: room.deploy_profile(),
            },
        );
    }
}

fn handle_input(room: &Arc<Room>, ctx: &ConnectionContext, envelope: &InboundEnvelope) {
    let Some(seq) = envelope.seq else {
        room.send_to(&ctx.session_id, outbound_type::ERROR, payloads::ErrorPayload::input_rejected("MISSING_SEQ", None));
        return;
    };

    let snapshot = match usion_net::resolve_input_payload(&envelope.payload) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::debug!(room_id = %ctx.room_id, user_id = %ctx.user_id, error = %err, "rejecting malformed input payload");
            room.send_to(&ctx.session_id, outbound_type::ERROR, payloads::ErrorPayload::input_rejected("MALFORMED_INPUT", None));
            return;
        }
    };

    if let Err(err) = room.enqueue_input(&ctx.user_id, seq, envelope.ts, snapshot) {
        let reason = match err {
            usion_room::RoomError::RoomNotRunning => "ROOM_NOT_RUNNING",
            usion_room::RoomError::StaleInput { .. } => "STALE_INPUT",
        };
        let expected_gt = match err {
            usion_room::RoomError::StaleInput { expected_gt } => Some(expected_gt),
            usion_room::RoomError::RoomNotRunning => None,
        };
        room.send_to(&ctx.session_id, outbound_type::ERROR, payloads::ErrorPayload::input_rejected(reason, expected_gt));
    }
}

fn handle_ping(room: &Arc<Room>, ctx: &ConnectionContext) {
    room.send_to(
        &ctx.session_id,
        outbound_type::PONG,
        payloads::PongPayload {
            room_id: ctx.room_id.to_string(),
            server_tick: room.current_tick(),
            server_ts: chrono::Utc::now().timestamp_millis(),
            deploy: room.deploy_profile(),
        },
    );
}

fn handle_leave(room: &Arc<Room>, ctx: &ConnectionContext) {
    match room.remove_session(&ctx.session_id) {
        RemoveOutcome::Removed => {
            room.broadcast(
                outbound_type::PLAYER_LEFT,
                payloads::PlayerLeftPayload {
                    room_id: ctx.room_id.to_string(),
                    player_id: ctx.user_id.to_string(),
                },
            );
        }
        // `match_end` was already broadcast by `remove_session` itself.
        RemoveOutcome::MatchEndedByDisconnect { .. } => {}
        RemoveOutcome::NotPresent => {}
    }
}
