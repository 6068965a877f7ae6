//! Firing, projectile lifecycle, and the three special weapons (§4.3.3, §4.3.4).

use usion_types::{Effect, EffectKind, Projectile, ProjectileId, ProjectileKind, SpecialWeapon, UserId, World};

use crate::constants::*;
use crate::quantize::quantize;

fn clamp_into_arena(x: f64, y: f64, extent: f64) -> (f64, f64) {
    (x.clamp(0.0, extent), y.clamp(0.0, extent))
}

fn sum_of_radii() -> f64 {
    PLAYER_RADIUS + PROJECTILE_RADIUS
}

/// A shot's spawn point is at the ship's nose: `playerRadius + 0.5` along facing.
fn nose_position(x: f64, y: f64, angle: f64, arena_extent: f64) -> (f64, f64) {
    let nx = x + angle.cos() * SPAWN_NOSE_OFFSET;
    let ny = y + angle.sin() * SPAWN_NOSE_OFFSET;
    clamp_into_arena(nx, ny, arena_extent)
}

/// Credits damage dealt to the owner's stats and deaths/kill bookkeeping for
/// the hit ship. Call after mutating the victim's hp and alive flag.
fn credit_hit(world: &mut World, owner: &UserId, victim: &UserId, damage: f64, victim_died: bool) {
    if victim_died {
        if let Some(v) = world.players.get_mut(victim) {
            v.stats.deaths += 1;
        }
    }
    if let Some(o) = world.players.get_mut(owner) {
        o.stats.damage_dealt = quantize(o.stats.damage_dealt + damage);
        if victim_died && victim != owner {
            o.stats.kills += 1;
        }
    }
}

fn apply_damage(world: &mut World, target: &UserId, damage: f64) -> bool {
    let Some(ship) = world.players.get_mut(target) else {
        return false;
    };
    ship.hp = quantize((ship.hp - damage).max(0.0));
    let died = ship.hp <= 0.0 && ship.alive;
    if ship.hp <= 0.0 {
        ship.alive = false;
    }
    died
}

/// Dispatches a fire-press (step 3i): standard bullet, bomb, or nova. Laser
/// is excluded here — it fires continuously while held (step 3j,
/// [`apply_laser`]), not on the press edge.
pub fn dispatch_fire(world: &mut World, owner: &UserId) {
    let Some(ship) = world.players.get(owner) else {
        return;
    };
    let weapon = ship.special_weapon;
    match weapon {
        SpecialWeapon::None => spawn_bullet(world, owner),
        SpecialWeapon::Bomb => fire_bomb(world, owner),
        SpecialWeapon::Nova => fire_nova(world, owner),
        SpecialWeapon::Laser => {}
    }
}

fn spawn_bullet(world: &mut World, owner: &UserId) {
    let arena_extent = world.arena.width;
    let Some(ship) = world.players.get(owner) else {
        return;
    };
    let (x, y, angle) = (ship.x, ship.y, ship.angle);
    let lag_comp_ms = ship.input.lag_comp_ms.clamp(0.0, MAX_LAG_COMP_MS);
    let (spawn_x, spawn_y) = nose_position(x, y, angle, arena_extent);
    let vx = angle.cos() * PROJECTILE_SPEED;
    let vy = angle.sin() * PROJECTILE_SPEED;

    if let Some(ship) = world.players.get_mut(owner) {
        ship.fire_cooldown_ms = FIRE_COOLDOWN_MS;
    }

    if lag_comp_ms > 0.0 {
        if let Some(hit) = rewind_hit_scan(world, owner, spawn_x, spawn_y, vx, vy, lag_comp_ms) {
            let (victim, impact_x, impact_y) = hit;
            let died = apply_damage(world, &victim, PROJECTILE_DAMAGE);
            credit_hit(world, owner, &victim, PROJECTILE_DAMAGE, died);
            let visual = Projectile {
                id: ProjectileId(world.next_id()),
                owner: owner.clone(),
                x: impact_x,
                y: impact_y,
                vx: 0.0,
                vy: 0.0,
                ttl_ms: 50.0,
                damage: 0.0,
                kind: ProjectileKind::Bullet,
                lag_comp_ms: 0.0,
            };
            world.projectiles.push(visual);
            return;
        }
        // no rewind hit: advance the spawn point forward by the full lag window
        let dt = lag_comp_ms / 1000.0;
        let (adv_x, adv_y) = clamp_into_arena(spawn_x + vx * dt, spawn_y + vy * dt, arena_extent);
        world.projectiles.push(Projectile {
            id: ProjectileId(world.next_id()),
            owner: owner.clone(),
            x: quantize(adv_x),
            y: quantize(adv_y),
            vx: quantize(vx),
            vy: quantize(vy),
            ttl_ms: PROJECTILE_TTL_MS - lag_comp_ms,
            damage: PROJECTILE_DAMAGE,
            kind: ProjectileKind::Bullet,
            lag_comp_ms,
        });
        return;
    }

    world.projectiles.push(Projectile {
        id: ProjectileId(world.next_id()),
        owner: owner.clone(),
        x: quantize(spawn_x),
        y: quantize(spawn_y),
        vx: quantize(vx),
        vy: quantize(vy),
        ttl_ms: PROJECTILE_TTL_MS,
        damage: PROJECTILE_DAMAGE,
        kind: ProjectileKind::Bullet,
        lag_comp_ms: 0.0,
    });
}

/// Instant rewind hit-scan performed when a shot is spawned with lag
/// compensation (§4.3.3). Returns the victim and the impact point on the
/// first substep where a rewound ship position lies within hit range.
fn rewind_hit_scan(
    world: &World,
    owner: &UserId,
    spawn_x: f64,
    spawn_y: f64,
    vx: f64,
    vy: f64,
    lag_ms: f64,
) -> Option<(UserId, f64, f64)> {
    let substeps = (lag_ms / TICK_HISTORY_STEP_MS).ceil() as u32;
    let radius = sum_of_radii();
    for s in 0..substeps {
        let elapsed_ms = ((s + 1) as f64 * TICK_HISTORY_STEP_MS).min(lag_ms);
        let proj_x = spawn_x + vx * (elapsed_ms / 1000.0);
        let proj_y = spawn_y + vy * (elapsed_ms / 1000.0);
        let ago_ms = (lag_ms - elapsed_ms).max(0.0);
        let ticks_back = (ago_ms / TICK_HISTORY_STEP_MS).round() as usize;

        for uid in &world.player_order {
            if uid == owner {
                continue;
            }
            let Some(ship) = world.players.get(uid) else {
                continue;
            };
            if !ship.alive {
                continue;
            }
            let (rx, ry) = ship
                .position_history
                .rewind(ticks_back)
                .unwrap_or((ship.x, ship.y));
            let dist = (rx - proj_x).hypot(ry - proj_y);
            if dist <= radius {
                return Some((uid.clone(), proj_x, proj_y));
            }
        }
    }
    None
}

fn fire_bomb(world: &mut World, owner: &UserId) {
    let arena_extent = world.arena.width;
    let Some(ship) = world.players.get_mut(owner) else {
        return;
    };
    let (x, y, angle) = (ship.x, ship.y, ship.angle);
    ship.consume_special_use();
    ship.fire_cooldown_ms = FIRE_COOLDOWN_MS * 2.0;

    let (spawn_x, spawn_y) = nose_position(x, y, angle, arena_extent);
    let vx = angle.cos() * BOMB_SPEED;
    let vy = angle.sin() * BOMB_SPEED;
    world.projectiles.push(Projectile {
        id: ProjectileId(world.next_id()),
        owner: owner.clone(),
        x: quantize(spawn_x),
        y: quantize(spawn_y),
        vx: quantize(vx),
        vy: quantize(vy),
        ttl_ms: BOMB_TTL_MS,
        damage: BOMB_DAMAGE,
        kind: ProjectileKind::Bomb,
        lag_comp_ms: 0.0,
    });
}

/// Detonates a bomb: AoE damage with linear falloff, owner self-damage at
/// half rate, and a cosmetic explosion effect. Called whenever a bomb
/// leaves the projectile list, regardless of why (§4.3.4).
pub fn detonate_bomb(world: &mut World, bomb: &Projectile) {
    let (bx, by, owner) = (bomb.x, bomb.y, bomb.owner.clone());
    let mut owner_damage_total = 0.0;
    let mut owner_kills = 0u32;

    let ids = world.player_order.clone();
    for uid in ids {
        let Some(ship) = world.players.get_mut(&uid) else {
            continue;
        };
        if !ship.alive {
            continue;
        }
        let dist = (ship.x - bx).hypot(ship.y - by);
        if dist > BOMB_RADIUS {
            continue;
        }
        let t = (dist / BOMB_RADIUS).min(1.0);
        let falloff = 1.0 - (1.0 - BOMB_EDGE_FALLOFF) * t;
        let mut dmg = BOMB_DAMAGE * falloff;
        if uid == owner {
            dmg *= BOMB_SELF_DAMAGE_FACTOR;
        }
        ship.hp = quantize((ship.hp - dmg).max(0.0));
        let died = ship.hp <= 0.0 && ship.alive;
        if ship.hp <= 0.0 {
            ship.alive = false;
        }
        if died {
            ship.stats.deaths += 1;
            if uid != owner {
                owner_kills += 1;
            }
        }
        owner_damage_total += dmg;
    }

    if let Some(owner_ship) = world.players.get_mut(&owner) {
        owner_ship.stats.damage_dealt = quantize(owner_ship.stats.damage_dealt + owner_damage_total);
        owner_ship.stats.kills += owner_kills;
    }

    world.effects.push(Effect {
        kind: EffectKind::Explosion,
        x: bx,
        y: by,
        ttl_ms: BOMB_EFFECT_TTL_MS,
    });
}

fn fire_nova(world: &mut World, owner: &UserId) {
    let Some(ship) = world.players.get(owner) else {
        return;
    };
    if ship.nova_cooldown_ms > 0.0 {
        return;
    }
    let (x, y) = (ship.x, ship.y);

    if let Some(ship) = world.players.get_mut(owner) {
        ship.consume_special_use();
        ship.fire_cooldown_ms = FIRE_COOLDOWN_MS;
        ship.nova_cooldown_ms = FIRE_COOLDOWN_MS * 3.0;
    }

    let mut owner_damage_total = 0.0;
    let mut owner_kills = 0u32;
    let ids = world.player_order.clone();
    for uid in ids {
        if uid == *owner {
            continue;
        }
        let lag_ms = world
            .players
            .get(owner)
            .map(|s| s.input.lag_comp_ms)
            .unwrap_or(0.0);
        let ticks_back = (lag_ms / TICK_HISTORY_STEP_MS).round() as usize;
        let Some(ship) = world.players.get_mut(&uid) else {
            continue;
        };
        if !ship.alive {
            continue;
        }
        let (rx, ry) = ship.position_history.rewind(ticks_back).unwrap_or((ship.x, ship.y));
        let dist = (rx - x).hypot(ry - y);
        if dist > NOVA_RADIUS {
            continue;
        }
        let t = (dist / NOVA_RADIUS).min(1.0);
        let falloff = 1.0 - (1.0 - NOVA_EDGE_FALLOFF) * t;
        let dmg = NOVA_DAMAGE * falloff;
        ship.hp = quantize((ship.hp - dmg).max(0.0));
        let died = ship.hp <= 0.0 && ship.alive;
        if ship.hp <= 0.0 {
            ship.alive = false;
        }
        if died {
            ship.stats.deaths += 1;
            owner_kills += 1;
        }
        owner_damage_total += dmg;
    }

    if let Some(owner_ship) = world.players.get_mut(owner) {
        owner_ship.stats.damage_dealt = quantize(owner_ship.stats.damage_dealt + owner_damage_total);
        owner_ship.stats.kills += owner_kills;
    }

    world.effects.push(Effect {
        kind: EffectKind::Nova,
        x,
        y,
        ttl_ms: NOVA_EFFECT_TTL_MS,
    });
}

/// Step 3j: continuous laser beam while held. Independent of `fire_cooldown`.
pub fn apply_laser(world: &mut World, owner: &UserId, dt_ms: f64) {
    let Some(ship) = world.players.get(owner) else {
        return;
    };
    if ship.special_weapon != SpecialWeapon::Laser || ship.special_uses == 0 || !ship.input.fire {
        return;
    }
    let (x, y, angle) = (ship.x, ship.y, ship.angle);
    let dt = dt_ms / 1000.0;
    let damage_per_target = LASER_DPS * dt;
    let half_width = LASER_HALF_WIDTH + PLAYER_RADIUS;

    let mut owner_damage_total = 0.0;
    let ids = world.player_order.clone();
    for uid in ids {
        if uid == *owner {
            continue;
        }
        let lag_ms = world
            .players
            .get(owner)
            .map(|s| s.input.lag_comp_ms)
            .unwrap_or(0.0);
        let ticks_back = (lag_ms / TICK_HISTORY_STEP_MS).round() as usize;
        let Some(target) = world.players.get_mut(&uid) else {
            continue;
        };
        if !target.alive {
            continue;
        }
        let (rx, ry) = target.position_history.rewind(ticks_back).unwrap_or((target.x, target.y));
        let dx = rx - x;
        let dy = ry - y;
        let along = dx * angle.cos() + dy * angle.sin();
        if !(0.0..=LASER_RANGE).contains(&along) {
            continue;
        }
        let perp = (dx * -angle.sin() + dy * angle.cos()).abs();
        if perp > half_width {
            continue;
        }
        target.hp = quantize((target.hp - damage_per_target).max(0.0));
        let died = target.hp <= 0.0 && target.alive;
        if target.hp <= 0.0 {
            target.alive = false;
        }
        if died {
            target.stats.deaths += 1;
        }
        owner_damage_total += damage_per_target;
        if died {
            if let Some(o) = world.players.get_mut(owner) {
                o.stats.kills += 1;
            }
        }
    }

    if let Some(owner_ship) = world.players.get_mut(owner) {
        owner_ship.stats.damage_dealt = quantize(owner_ship.stats.damage_dealt + owner_damage_total);
        owner_ship.laser_active_ms += dt_ms;
        if owner_ship.laser_active_ms >= LASER_BURN_DURATION_MS {
            owner_ship.consume_special_use();
        }
    }
}

enum ProjectileOutcome {
    Keep(Projectile),
    Remove,
}

/// Step 4: ttl decay, motion integration, arena-exit and collision checks
/// for every in-flight projectile (§4.3.3 Update).
pub fn update_projectiles(world: &mut World, dt_ms: f64) {
    let mut projectiles = std::mem::take(&mut world.projectiles);
    let dt = dt_ms / 1000.0;
    let extent = world.arena.width;
    let radius = sum_of_radii();

    let mut survivors = Vec::with_capacity(projectiles.len());
    for mut proj in projectiles.drain(..) {
        proj.ttl_ms -= dt_ms;
        if proj.ttl_ms <= 0.0 {
            if proj.kind == ProjectileKind::Bomb {
                detonate_bomb(world, &proj);
            }
            continue;
        }

        proj.x = quantize(proj.x + proj.vx * dt);
        proj.y = quantize(proj.y + proj.vy * dt);

        let min = -PROJECTILE_RADIUS;
        let max = extent + PROJECTILE_RADIUS;
        if proj.x < min || proj.x > max || proj.y < min || proj.y > max {
            if proj.kind == ProjectileKind::Bomb {
                detonate_bomb(world, &proj);
            }
            continue;
        }

        let mut hit_target: Option<UserId> = None;
        for uid in &world.player_order {
            if *uid == proj.owner {
                continue;
            }
            let Some(ship) = world.players.get(uid) else {
                continue;
            };
            if !ship.alive {
                continue;
            }
            let current_dist = (ship.x - proj.x).hypot(ship.y - proj.y);
            let mut hit = current_dist <= radius;
            if !hit && proj.lag_comp_ms > 0.0 {
                let ticks_back = (proj.lag_comp_ms / TICK_HISTORY_STEP_MS).round() as usize;
                if let Some((rx, ry)) = ship.position_history.rewind(ticks_back) {
                    hit = (rx - proj.x).hypot(ry - proj.y) <= radius;
                }
            }
            if hit {
                hit_target = Some(uid.clone());
                break;
            }
        }

        if let Some(victim) = hit_target {
            if proj.kind == ProjectileKind::Bomb {
                detonate_bomb(world, &proj);
            } else {
                let died = apply_damage(world, &victim, proj.damage);
                credit_hit(world, &proj.owner, &victim, proj.damage, died);
            }
            continue;
        }

        survivors.push(proj);
    }

    world.projectiles = survivors;
}

#[cfg(test)]
mod tests {
    use super::*;
    use usion_types::{Arena, Ship};

    fn two_player_world() -> World {
        let mut world = World::new(1);
        world.arena = Arena::default();
        world.player_order = vec![UserId::new("a"), UserId::new("b")];
        world.players.insert(UserId::new("a"), Ship::new(UserId::new("a"), 18.0, 50.0, 0.0));
        world.players.insert(UserId::new("b"), Ship::new(UserId::new("b"), 82.0, 50.0, std::f64::consts::PI));
        world
    }

    #[test]
    fn standard_bullet_spawns_without_lag_comp() {
        let mut world = two_player_world();
        dispatch_fire(&mut world, &UserId::new("a"));
        assert_eq!(world.projectiles.len(), 1);
        assert_eq!(world.projectiles[0].kind, ProjectileKind::Bullet);
        assert_eq!(world.players[&UserId::new("a")].fire_cooldown_ms, FIRE_COOLDOWN_MS);
    }

    #[test]
    fn point_blank_lag_comp_hits_immediately() {
        let mut world = two_player_world();
        // move B right next to A's nose and give it position history to rewind into
        if let Some(b) = world.players.get_mut(&UserId::new("b")) {
            b.x = 21.0;
            b.y = 50.0;
            b.position_history.push((21.0, 50.0));
        }
        if let Some(a) = world.players.get_mut(&UserId::new("a")) {
            a.input.lag_comp_ms = 80.0;
        }
        dispatch_fire(&mut world, &UserId::new("a"));
        let b_hp = world.players[&UserId::new("b")].hp;
        assert!(b_hp < MAX_HP, "point-blank lag-compensated shot should land immediately");
    }

    #[test]
    fn bomb_detonation_damages_and_self_damages_owner() {
        let mut world = two_player_world();
        if let Some(a) = world.players.get_mut(&UserId::new("a")) {
            a.special_weapon = SpecialWeapon::Bomb;
            a.special_uses = 1;
        }
        if let Some(b) = world.players.get_mut(&UserId::new("b")) {
            b.x = 20.0;
            b.y = 50.0;
        }
        dispatch_fire(&mut world, &UserId::new("a"));
        let bomb = world.projectiles[0].clone();
        detonate_bomb(&mut world, &bomb);
        assert!(world.players[&UserId::new("a")].hp < MAX_HP);
        assert!(world.players[&UserId::new("b")].hp < MAX_HP);
    }

}
