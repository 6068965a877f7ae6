//! Network projection of `World`: the shape actually put on the wire.
//!
//! Strips server-only data — position history and per-input transient
//! fields — per §4.4. The delta builder diffs this shape, not `World`
//! itself, so an internal-only field changing (e.g. a ship's position
//! history gaining a sample every tick) never produces wire traffic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use usion_types::{
    Arena, Effect, Phase, Pickup, PickupId, Projectile, ProjectileId, SpecialWeapon, TerminationReason,
    UserId, World,
};

/// Ship fields visible to clients. Compared shallowly by the delta builder —
/// two ships with identical projected fields are considered unchanged even
/// if, say, their position history diverges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetShip {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub angle: f64,
    pub hp: f64,
    pub fire_cooldown_ms: f64,
    pub alive: bool,
    pub special_weapon: SpecialWeapon,
    pub special_uses: u32,
    pub laser_active_ms: f64,
    pub nova_cooldown_ms: f64,
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: f64,
    pub pickups_collected: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetProjectile {
    pub id: ProjectileId,
    pub owner: UserId,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub ttl_ms: f64,
    pub damage: f64,
    pub kind: usion_types::ProjectileKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetPickup {
    pub id: PickupId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: usion_types::PickupType,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetEffect {
    pub kind: usion_types::EffectKind,
    pub x: f64,
    pub y: f64,
    pub ttl_ms: f64,
}

/// The full projected world, as sent in `state_snapshot.full_state` and used
/// as the delta builder's input on both sides of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorldState {
    pub phase: Phase,
    pub tick: u64,
    pub remaining_ms: f64,
    pub arena: Arena,
    pub players: HashMap<UserId, NetShip>,
    pub projectiles: Vec<NetProjectile>,
    pub pickups: Vec<NetPickup>,
    /// Not id-keyed — effects carry no identity, so every frame that reaches
    /// the delta builder includes the full current list rather than a diff.
    pub effects: Vec<NetEffect>,
    pub winner_ids: Vec<UserId>,
    pub reason: Option<TerminationReason>,
}

impl From<&Projectile> for NetProjectile {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner: p.owner.clone(),
            x: p.x,
            y: p.y,
            vx: p.vx,
            vy: p.vy,
            ttl_ms: p.ttl_ms,
            damage: p.damage,
            kind: p.kind,
        }
    }
}

impl From<&Pickup> for NetPickup {
    fn from(p: &Pickup) -> Self {
        Self {
            id: p.id,
            x: p.x,
            y: p.y,
            kind: p.kind,
            value: p.value,
        }
    }
}

impl From<&Effect> for NetEffect {
    fn from(e: &Effect) -> Self {
        Self {
            kind: e.kind,
            x: e.x,
            y: e.y,
            ttl_ms: e.ttl_ms,
        }
    }
}

/// Projects the authoritative `World` onto the wire shape (§4.4, §9).
pub fn project(world: &World) -> NetWorldState {
    let players = world
        .players
        .iter()
        .map(|(uid, ship)| {
            (
                uid.clone(),
                NetShip {
                    x: ship.x,
                    y: ship.y,
                    vx: ship.vx,
                    vy: ship.vy,
                    angle: ship.angle,
                    hp: ship.hp,
                    fire_cooldown_ms: ship.fire_cooldown_ms,
                    alive: ship.alive,
                    special_weapon: ship.special_weapon,
                    special_uses: ship.special_uses,
                    laser_active_ms: ship.laser_active_ms,
                    nova_cooldown_ms: ship.nova_cooldown_ms,
                    kills: ship.stats.kills,
                    deaths: ship.stats.deaths,
                    damage_dealt: ship.stats.damage_dealt,
                    pickups_collected: ship.stats.pickups_collected,
                },
            )
        })
        .collect();

    NetWorldState {
        phase: world.phase,
        tick: world.tick,
        remaining_ms: world.remaining_ms,
        arena: world.arena,
        players,
        projectiles: world.projectiles.iter().map(NetProjectile::from).collect(),
        pickups: world.pickups.iter().map(NetPickup::from).collect(),
        effects: world.effects.iter().map(NetEffect::from).collect(),
        winner_ids: world.winner_ids.clone(),
        reason: world.reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usion_types::Ship;

    fn two_player_world() -> World {
        let mut world = World::new(1);
        world.player_order = vec![UserId::new("a"), UserId::new("b")];
        world.players.insert(UserId::new("a"), Ship::new(UserId::new("a"), 18.0, 50.0, 0.0));
        world.players.insert(UserId::new("b"), Ship::new(UserId::new("b"), 82.0, 50.0, std::f64::consts::PI));
        world
    }

    #[test]
    fn projection_drops_position_history_and_input() {
        let world = two_player_world();
        let net = project(&world);
        assert_eq!(net.players.len(), 2);
        // NetShip has no position_history/input fields at all; this is a
        // compile-time guarantee, exercised here only to keep the test
        // non-trivial.
        let a = &net.players[&UserId::new("a")];
        assert_eq!(a.hp, 100.0);
        assert!(a.alive);
    }
}
