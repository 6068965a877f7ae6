//! A room's per-connection session table entry (§3 Data Model).

use usion_types::UserId;

use crate::outbound::OutboundSender;

pub struct SessionEntry {
    pub user_id: UserId,
    pub tx: OutboundSender,
}

/// What a caller needs to build the `joined` / `player_joined` payloads.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub player_ids: Vec<UserId>,
    pub waiting_for: u32,
}

pub const MAX_PARTICIPANTS: usize = 2;

pub fn waiting_for(participant_count: usize) -> u32 {
    (MAX_PARTICIPANTS.saturating_sub(participant_count)) as u32
}
