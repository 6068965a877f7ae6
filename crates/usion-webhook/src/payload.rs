//! The `MatchResult` body submitted to the matchmaking API (§4.2, §4.5.5).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use usion_types::{RoomId, SessionId, TerminationReason, UserId};

/// Per-player stats included in `final_stats`, mirroring `usion_net::FinalStats`
/// (this crate does not depend on `usion-net` to avoid a wire-protocol
/// coupling for what is, here, just an outbound HTTP body).
#[derive(Debug, Clone, Serialize)]
pub struct FinalStats {
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: f64,
    pub pickups_collected: u32,
}

/// Everything the Room Runtime knows about a finished match, handed to
/// [`crate::submit`] to build the request body.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub room_id: RoomId,
    pub session_id: SessionId,
    pub winner_ids: Vec<UserId>,
    pub participants: Vec<UserId>,
    pub reason: TerminationReason,
    pub final_stats: HashMap<UserId, FinalStats>,
}

/// The serialized POST body. `ended_at` is stamped by [`crate::submit`] at
/// call time, not carried on [`MatchResult`], since the result's wall-clock
/// finish time is a submission-time fact, not a simulation fact.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResultBody {
    pub room_id: RoomId,
    pub session_id: SessionId,
    pub winner_ids: Vec<UserId>,
    pub participants: Vec<UserId>,
    pub reason: TerminationReason,
    pub final_stats: HashMap<UserId, FinalStats>,
    pub ended_at: DateTime<Utc>,
}

impl MatchResult {
    pub fn into_body(self, ended_at: DateTime<Utc>) -> MatchResultBody {
        MatchResultBody {
            room_id: self.room_id,
            session_id: self.session_id,
            winner_ids: self.winner_ids,
            participants: self.participants,
            reason: self.reason,
            final_stats: self.final_stats,
            ended_at,
        }
    }
}
