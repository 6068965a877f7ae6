//! Match termination: elimination and timeout resolution (§4.3.6).

use serde::{Deserialize, Serialize};
use usion_types::{Phase, TerminationReason, UserId, World};

use crate::constants::HP_TIE_TOLERANCE;

/// Read-only projection of a world's termination state, returned by the
/// `isTerminal` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalStatus {
    pub terminal: bool,
    pub winner_ids: Vec<UserId>,
    pub reason: Option<TerminationReason>,
    pub final_tick: u64,
    pub remaining_ms: f64,
}

/// Step 7 of the tick algorithm. Idempotent: does nothing once the world is
/// already `Finished`.
pub fn resolve_terminal(world: &mut World) {
    if world.phase == Phase::Finished {
        return;
    }

    let alive: Vec<UserId> = world
        .player_order
        .iter()
        .filter(|uid| world.players.get(*uid).map(|s| s.alive).unwrap_or(false))
        .cloned()
        .collect();

    if alive.len() <= 1 {
        world.phase = Phase::Finished;
        world.winner_ids = alive;
        world.reason = Some(TerminationReason::Elimination);
        return;
    }

    if world.remaining_ms <= 0.0 {
        let best_hp = world
            .player_order
            .iter()
            .filter_map(|uid| world.players.get(uid).map(|s| s.hp))
            .fold(f64::MIN, f64::max);
        let winners: Vec<UserId> = world
            .player_order
            .iter()
            .filter(|uid| {
                world
                    .players
                    .get(*uid)
                    .map(|s| (s.hp - best_hp).abs() <= HP_TIE_TOLERANCE)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        world.phase = Phase::Finished;
        world.winner_ids = winners;
        world.reason = Some(TerminationReason::Timeout);
    }
}

/// Query-only projection of the world's current termination state.
pub fn is_terminal(world: &World) -> TerminalStatus {
    TerminalStatus {
        terminal: world.phase == Phase::Finished,
        winner_ids: world.winner_ids.clone(),
        reason: world.reason,
        final_tick: world.tick,
        remaining_ms: world.remaining_ms.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usion_types::Ship;

    fn world_with(a_alive: bool, b_alive: bool) -> World {
        let mut world = World::new(1);
        world.player_order = vec![UserId::new("a"), UserId::new("b")];
        let mut a = Ship::new(UserId::new("a"), 18.0, 50.0, 0.0);
        a.alive = a_alive;
        let mut b = Ship::new(UserId::new("b"), 82.0, 50.0, std::f64::consts::PI);
        b.alive = b_alive;
        world.players.insert(UserId::new("a"), a);
        world.players.insert(UserId::new("b"), b);
        world
    }

    #[test]
    fn elimination_ends_match_with_sole_survivor() {
        let mut world = world_with(true, false);
        resolve_terminal(&mut world);
        let status = is_terminal(&world);
        assert!(status.terminal);
        assert_eq!(status.reason, Some(TerminationReason::Elimination));
        assert_eq!(status.winner_ids, vec![UserId::new("a")]);
    }

    #[test]
    fn mutual_destruction_has_no_winners() {
        let mut world = world_with(false, false);
        resolve_terminal(&mut world);
        let status = is_terminal(&world);
        assert!(status.terminal);
        assert!(status.winner_ids.is_empty());
    }

    #[test]
    fn timeout_ranks_by_hp_with_tie_tolerance() {
        let mut world = world_with(true, true);
        world.remaining_ms = 0.0;
        if let Some(a) = world.players.get_mut(&UserId::new("a")) {
            a.hp = 40.0;
        }
        if let Some(b) = world.players.get_mut(&UserId::new("b")) {
            b.hp = 60.0;
        }
        resolve_terminal(&mut world);
        let status = is_terminal(&world);
        assert_eq!(status.reason, Some(TerminationReason::Timeout));
        assert_eq!(status.winner_ids, vec![UserId::new("b")]);
    }

    #[test]
    fn timeout_tie_within_tolerance_has_both_winners() {
        let mut world = world_with(true, true);
        world.remaining_ms = 0.0;
        if let Some(a) = world.players.get_mut(&UserId::new("a")) {
            a.hp = 50.0;
        }
        if let Some(b) = world.players.get_mut(&UserId::new("b")) {
            b.hp = 50.0 + 1e-5;
        }
        resolve_terminal(&mut world);
        let status = is_terminal(&world);
        assert_eq!(status.winner_ids.len(), 2);
    }

    #[test]
    fn not_terminal_while_both_alive_and_time_remains() {
        let mut world = world_with(true, true);
        resolve_terminal(&mut world);
        assert!(!is_terminal(&world).terminal);
    }
}
