//! Deterministic fixed-step simulation core for the Usion arena (§4.3).
//!
//! Four synchronous operations mutate a [`World`] in place: [`init`],
//! [`apply_input`], [`tick`], and the read-only [`is_terminal`] query. A
//! `Room` owns exactly one `World` for the lifetime of a match and is the
//! only caller of this crate.

pub mod constants;
pub mod error;
pub mod movement;
pub mod pickups;
pub mod prng;
pub mod quantize;
pub mod terminal;
pub mod weapons;

pub use error::{SimError, SimResult};
pub use terminal::{is_terminal, TerminalStatus};
pub use usion_types::{
    seed_from_room_id, Arena, Effect, EffectKind, InputSnapshot, Phase, Pickup, PickupId,
    PickupType, PlayerStats, Projectile, ProjectileId, ProjectileKind, Ship, SpecialWeapon,
    TerminationReason, UserId, World, ARENA_EXTENT, ROUND_DURATION_MS,
};

use constants::SPAWN_LEFT;
use constants::SPAWN_RIGHT;

/// Builds a fresh world with two ships at the symmetric spawn points. Only
/// the first two ids in `player_ids` are assigned; callers are expected to
/// have already validated there are exactly two.
pub fn init(player_ids: &[UserId], seed: u64) -> World {
    let mut world = World::new(seed);
    let spawns = [SPAWN_LEFT, SPAWN_RIGHT];
    for (uid, (x, y, angle)) in player_ids.iter().take(2).zip(spawns) {
        world.player_order.push(uid.clone());
        world.players.insert(uid.clone(), Ship::new(uid.clone(), x, y, angle));
    }
    world
}

/// Applies one input snapshot to a ship's input slot. A no-op if the ship is
/// absent or dead — stale input from a socket racing a death/disconnect must
/// not resurrect a ship's controls.
pub fn apply_input(world: &mut World, user_id: &UserId, payload: InputSnapshot) {
    let Some(ship) = world.players.get_mut(user_id) else {
        return;
    };
    if !ship.alive {
        return;
    }
    ship.input = payload.clamped();
}

/// Advances the simulation by one fixed step of `dt_ms` (§4.3.2).
pub fn tick(world: &mut World, dt_ms: f64) {
    world.remaining_ms = (world.remaining_ms - dt_ms).max(0.0);
    world.tick += 1;

    world.effects.retain_mut(|effect| {
        effect.ttl_ms -= dt_ms;
        effect.ttl_ms > 0.0
    });

    let order = world.player_order.clone();
    for uid in &order {
        let alive = world.players.get(uid).map(|s| s.alive).unwrap_or(false);
        if !alive {
            continue;
        }

        {
            let arena = world.arena;
            let Some(ship) = world.players.get_mut(uid) else {
                continue;
            };
            movement::integrate_ship_motion(ship, &arena, dt_ms);
        }

        let fire_pressed = world.players.get(uid).map(|s| s.input.fire_pressed).unwrap_or(false);
        let cooldown_ready = world.players.get(uid).map(|s| s.fire_cooldown_ms <= 0.0).unwrap_or(false);
        if fire_pressed && cooldown_ready {
            weapons::dispatch_fire(world, uid);
        }
        if let Some(ship) = world.players.get_mut(uid) {
            ship.input.fire_pressed = false;
        }

        weapons::apply_laser(world, uid, dt_ms);
    }

    weapons::update_projectiles(world, dt_ms);
    pickups::maybe_spawn_pickup(world);
    pickups::collect_pickups(world);
    terminal::resolve_terminal(world);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_ids() -> Vec<UserId> {
        vec![UserId::new("a"), UserId::new("b")]
    }

    #[test]
    fn init_places_ships_at_symmetric_spawns() {
        let world = init(&two_ids(), 1);
        let a = &world.players[&UserId::new("a")];
        let b = &world.players[&UserId::new("b")];
        assert_eq!((a.x, a.y, a.angle), constants::SPAWN_LEFT);
        assert_eq!((b.x, b.y, b.angle), constants::SPAWN_RIGHT);
        assert_eq!(a.hp, constants::MAX_HP);
        assert!(a.alive && b.alive);
    }

    #[test]
    fn apply_input_is_noop_on_dead_ship() {
        let mut world = init(&two_ids(), 1);
        if let Some(a) = world.players.get_mut(&UserId::new("a")) {
            a.alive = false;
        }
        apply_input(&mut world, &UserId::new("a"), InputSnapshot { thrust: 1.0, ..Default::default() });
        assert_eq!(world.players[&UserId::new("a")].input.thrust, 0.0);
    }

    #[test]
    fn tick_advances_clock_and_decrements_remaining_time() {
        let mut world = init(&two_ids(), 1);
        tick(&mut world, 16.0);
        assert_eq!(world.tick, 1);
        assert_eq!(world.remaining_ms, ROUND_DURATION_MS - 16.0);
    }

    #[test]
    fn elimination_resolves_terminal_after_tick() {
        let mut world = init(&two_ids(), 1);
        if let Some(b) = world.players.get_mut(&UserId::new("b")) {
            b.alive = false;
            b.hp = 0.0;
        }
        tick(&mut world, 16.0);
        let status = is_terminal(&world);
        assert!(status.terminal);
        assert_eq!(status.winner_ids, vec![UserId::new("a")]);
    }

    #[test]
    fn timeout_resolves_when_clock_expires() {
        let mut world = init(&two_ids(), 1);
        world.remaining_ms = 10.0;
        tick(&mut world, 16.0);
        assert!(is_terminal(&world).terminal);
    }

    #[test]
    fn repeated_ticks_are_deterministic_given_same_inputs() {
        let mut world_a = init(&two_ids(), 42);
        let mut world_b = init(&two_ids(), 42);
        apply_input(&mut world_a, &UserId::new("a"), InputSnapshot { turn: 0.5, thrust: 1.0, ..Default::default() });
        apply_input(&mut world_b, &UserId::new("a"), InputSnapshot { turn: 0.5, thrust: 1.0, ..Default::default() });
        for _ in 0..50 {
            tick(&mut world_a, 16.0);
            tick(&mut world_b, 16.0);
        }
        let a1 = &world_a.players[&UserId::new("a")];
        let a2 = &world_b.players[&UserId::new("a")];
        assert_eq!(a1.x, a2.x);
        assert_eq!(a1.y, a2.y);
        assert_eq!(a1.angle, a2.angle);
    }
}
