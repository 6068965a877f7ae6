//! World state: the simulation's single source of truth for one match.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::ids::UserId;
use crate::pickup::Pickup;
use crate::projectile::Projectile;
use crate::ship::Ship;

/// Arena is always a 100x100 axis-aligned square (§4.3.1).
pub const ARENA_EXTENT: f64 = 100.0;

/// Round length before a timeout resolution, ms.
pub const ROUND_DURATION_MS: f64 = 180_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Elimination,
    Timeout,
    PlayerDisconnected,
}

/// Axis-aligned square arena, width == height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: ARENA_EXTENT,
            height: ARENA_EXTENT,
        }
    }
}

/// The full authoritative state of one match, owned exclusively by its `Room`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub phase: Phase,
    /// Derived from the room id: first 12 hex digits of a sha256 of the id,
    /// interpreted as base-16. Seeds pickup placement's PRNG.
    pub seed: u64,
    pub tick: u64,
    pub remaining_ms: f64,
    pub arena: Arena,
    pub players: HashMap<UserId, Ship>,
    /// Insertion order of `players`, fixed at `World::new`/`init` time. The
    /// tick algorithm processes ships "in insertion order" (§4.3.2 step 3);
    /// a `HashMap` alone cannot give us that deterministically.
    pub player_order: Vec<UserId>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub effects: Vec<Effect>,
    pub winner_ids: Vec<UserId>,
    pub reason: Option<TerminationReason>,
    /// Monotonic counter backing both `ProjectileId` and `PickupId` allocation.
    pub next_entity_id: u64,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            phase: Phase::Playing,
            seed,
            tick: 0,
            remaining_ms: ROUND_DURATION_MS,
            arena: Arena::default(),
            players: HashMap::new(),
            player_order: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            effects: Vec::new(),
            winner_ids: Vec::new(),
            reason: None,
            next_entity_id: 0,
        }
    }

    /// Allocates the next id in the shared projectile/pickup id space.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }
}

/// Derives the deterministic world seed from a room id: first 12 hex
/// characters of sha256(room_id), parsed as a base-16 integer.
pub fn seed_from_room_id(room_id: &str) -> u64 {
    use sha2_for_seed::Digest;
    let mut hasher = sha2_for_seed::Sha256::new();
    hasher.update(room_id.as_bytes());
    let digest = hasher.finalize();
    let hex_str: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    u64::from_str_radix(&hex_str[..12], 16).unwrap_or(0)
}

// `usion-types` is intentionally dependency-light; it borrows sha2 only for
// this one deterministic derivation rather than pulling in the full crypto
// stack that `usion-auth`/`usion-webhook` carry.
mod sha2_for_seed {
    pub use sha2::{Digest, Sha256};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_deterministic_per_room() {
        let a = seed_from_room_id("room-42");
        let b = seed_from_room_id("room-42");
        let c = seed_from_room_id("room-43");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn new_world_starts_in_playing_phase() {
        let world = World::new(1234);
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(world.remaining_ms, ROUND_DURATION_MS);
        assert!(world.players.is_empty());
    }
}
