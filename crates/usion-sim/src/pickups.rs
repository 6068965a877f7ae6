//! Pickup spawning and collection (§4.3.5).

use usion_types::{Pickup, PickupId, PickupType, World};

use crate::constants::*;
use crate::prng::pickup_draws;
use crate::quantize::quantize;

/// Spawn gate: every 120 ticks, while fewer than 3 pickups are live.
pub fn maybe_spawn_pickup(world: &mut World) {
    if world.tick % PICKUP_SPAWN_PERIOD_TICKS != 0 || world.pickups.len() >= MAX_PICKUPS {
        return;
    }
    let (a, b, c) = pickup_draws(world.seed, world.tick);
    let inset = PICKUP_RADIUS + 5.0;
    let extent = world.arena.width;
    let x = quantize(inset + a * (extent - 2.0 * inset));
    let y = quantize(inset + b * (extent - 2.0 * inset));
    let kind = match (c * 3.0) as u32 {
        0 => PickupType::Laser,
        1 => PickupType::Bomb,
        _ => PickupType::Nova,
    };
    world.pickups.push(Pickup {
        id: PickupId(world.next_id()),
        x,
        y,
        kind,
        value: PICKUP_USES,
    });
}

/// Grants the pickup's weapon to the first alive ship whose circle overlaps it.
pub fn collect_pickups(world: &mut World) {
    if world.pickups.is_empty() {
        return;
    }
    let pickups = std::mem::take(&mut world.pickups);
    let mut remaining = Vec::with_capacity(pickups.len());
    let reach = PLAYER_RADIUS + PICKUP_RADIUS;

    'pickup: for pickup in pickups {
        for uid in world.player_order.clone() {
            let Some(ship) = world.players.get_mut(&uid) else {
                continue;
            };
            if !ship.alive {
                continue;
            }
            let dist = (ship.x - pickup.x).hypot(ship.y - pickup.y);
            if dist <= reach {
                ship.special_weapon = pickup.kind.grants();
                ship.special_uses = pickup.value;
                ship.laser_active_ms = 0.0;
                ship.stats.pickups_collected += 1;
                continue 'pickup;
            }
        }
        remaining.push(pickup);
    }
    world.pickups = remaining;
}

#[cfg(test)]
mod tests {
    use super::*;
    use usion_types::{Arena, Ship, SpecialWeapon, UserId};

    fn two_player_world() -> World {
        let mut world = World::new(7);
        world.arena = Arena::default();
        world.player_order = vec![UserId::new("a"), UserId::new("b")];
        world.players.insert(UserId::new("a"), Ship::new(UserId::new("a"), 18.0, 50.0, 0.0));
        world.players.insert(UserId::new("b"), Ship::new(UserId::new("b"), 82.0, 50.0, std::f64::consts::PI));
        world
    }

    #[test]
    fn spawns_only_on_gate_tick() {
        let mut world = two_player_world();
        world.tick = 119;
        maybe_spawn_pickup(&mut world);
        assert!(world.pickups.is_empty());
        world.tick = 120;
        maybe_spawn_pickup(&mut world);
        assert_eq!(world.pickups.len(), 1);
    }

    #[test]
    fn stops_spawning_once_cap_reached() {
        let mut world = two_player_world();
        for t in [120, 240, 360, 480] {
            world.tick = t;
            maybe_spawn_pickup(&mut world);
        }
        assert_eq!(world.pickups.len(), MAX_PICKUPS);
    }

    #[test]
    fn collection_grants_weapon_and_clears_pickup() {
        let mut world = two_player_world();
        world.tick = 120;
        maybe_spawn_pickup(&mut world);
        let pickup = world.pickups[0].clone();
        if let Some(a) = world.players.get_mut(&UserId::new("a")) {
            a.x = pickup.x;
            a.y = pickup.y;
        }
        collect_pickups(&mut world);
        assert!(world.pickups.is_empty());
        let a = &world.players[&UserId::new("a")];
        assert_eq!(a.special_uses, PICKUP_USES);
        assert_ne!(a.special_weapon, SpecialWeapon::None);
    }

    #[test]
    fn uncollected_pickup_stays_in_world() {
        let mut world = two_player_world();
        world.tick = 120;
        maybe_spawn_pickup(&mut world);
        collect_pickups(&mut world);
        assert_eq!(world.pickups.len(), 1);
    }
}
