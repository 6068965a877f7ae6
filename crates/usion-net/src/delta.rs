//! Per-tick delta builder (§4.4).
//!
//! `build_delta` diffs two projected network states; `apply_delta` is its
//! inverse, used only by tests to exercise the round-trip law from §8.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use usion_types::{PickupId, ProjectileId, TerminationReason, UserId};

use crate::projection::{NetEffect, NetPickup, NetProjectile, NetShip, NetWorldState};

/// Entities present (new or changed) between `prev` and `next`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangedEntities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<usion_types::Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_ids: Option<Vec<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Option<TerminationReason>>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub players: HashMap<UserId, NetShip>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub projectiles: HashMap<ProjectileId, NetProjectile>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub pickups: HashMap<PickupId, NetPickup>,
    /// Always the full current list — effects have no stable identity to
    /// diff against (see `NetWorldState::effects`).
    #[serde(default)]
    pub effects: Vec<NetEffect>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemovedEntities {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub projectiles: Vec<ProjectileId>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub pickups: Vec<PickupId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub changed_entities: ChangedEntities,
    pub removed_entities: RemovedEntities,
}

/// Diffs `next` against `prev`. If `prev` is absent, every entity is emitted
/// as changed and `removed_entities` is empty (§4.4).
pub fn build_delta(prev: Option<&NetWorldState>, next: &NetWorldState) -> Delta {
    let Some(prev) = prev else {
        return Delta {
            changed_entities: ChangedEntities {
                phase: Some(next.phase),
                tick: Some(next.tick),
                remaining_ms: Some(next.remaining_ms),
                winner_ids: Some(next.winner_ids.clone()),
                reason: Some(next.reason),
                players: next.players.clone(),
                projectiles: next
                    .projectiles
                    .iter()
                    .map(|p| (p.id, p.clone()))
                    .collect(),
                pickups: next.pickups.iter().map(|p| (p.id, p.clone())).collect(),
                effects: next.effects.clone(),
            },
            removed_entities: RemovedEntities::default(),
        };
    };

    let mut changed = ChangedEntities {
        effects: next.effects.clone(),
        ..Default::default()
    };

    if prev.phase != next.phase {
        changed.phase = Some(next.phase);
    }
    if prev.tick != next.tick {
        changed.tick = Some(next.tick);
    }
    if prev.remaining_ms != next.remaining_ms {
        changed.remaining_ms = Some(next.remaining_ms);
    }
    if prev.winner_ids != next.winner_ids {
        changed.winner_ids = Some(next.winner_ids.clone());
    }
    if prev.reason != next.reason {
        changed.reason = Some(next.reason);
    }

    for (uid, ship) in &next.players {
        if prev.players.get(uid) != Some(ship) {
            changed.players.insert(uid.clone(), ship.clone());
        }
    }

    let prev_projectiles: HashMap<ProjectileId, &NetProjectile> =
        prev.projectiles.iter().map(|p| (p.id, p)).collect();
    for proj in &next.projectiles {
        if prev_projectiles.get(&proj.id).copied() != Some(proj) {
            changed.projectiles.insert(proj.id, proj.clone());
        }
    }
    let next_ids: std::collections::HashSet<ProjectileId> =
        next.projectiles.iter().map(|p| p.id).collect();
    let removed_projectiles: Vec<ProjectileId> = prev
        .projectiles
        .iter()
        .map(|p| p.id)
        .filter(|id| !next_ids.contains(id))
        .collect();

    let prev_pickups: HashMap<PickupId, &NetPickup> = prev.pickups.iter().map(|p| (p.id, p)).collect();
    for pickup in &next.pickups {
        if prev_pickups.get(&pickup.id).copied() != Some(pickup) {
            changed.pickups.insert(pickup.id, pickup.clone());
        }
    }
    let next_pickup_ids: std::collections::HashSet<PickupId> =
        next.pickups.iter().map(|p| p.id).collect();
    let removed_pickups: Vec<PickupId> = prev
        .pickups
        .iter()
        .map(|p| p.id)
        .filter(|id| !next_pickup_ids.contains(id))
        .collect();

    Delta {
        changed_entities: changed,
        removed_entities: RemovedEntities {
            projectiles: removed_projectiles,
            pickups: removed_pickups,
        },
    }
}

/// Applies a delta onto a previous projected state, reconstructing `next`.
/// Used to check the round-trip law in tests; not part of the production
/// wire path (clients apply deltas themselves).
pub fn apply_delta(prev: &NetWorldState, delta: &Delta) -> NetWorldState {
    let mut out = prev.clone();
    let c = &delta.changed_entities;
    if let Some(phase) = c.phase {
        out.phase = phase;
    }
    if let Some(tick) = c.tick {
        out.tick = tick;
    }
    if let Some(remaining_ms) = c.remaining_ms {
        out.remaining_ms = remaining_ms;
    }
    if let Some(winner_ids) = &c.winner_ids {
        out.winner_ids = winner_ids.clone();
    }
    if let Some(reason) = c.reason {
        out.reason = reason;
    }
    for (uid, ship) in &c.players {
        out.players.insert(uid.clone(), ship.clone());
    }

    let mut projectiles: HashMap<ProjectileId, NetProjectile> =
        out.projectiles.into_iter().map(|p| (p.id, p)).collect();
    for (id, proj) in &c.projectiles {
        projectiles.insert(*id, proj.clone());
    }
    for id in &delta.removed_entities.projectiles {
        projectiles.remove(id);
    }
    out.projectiles = projectiles.into_values().collect();
    out.projectiles.sort_by_key(|p| p.id.0);

    let mut pickups: HashMap<PickupId, NetPickup> = out.pickups.into_iter().map(|p| (p.id, p)).collect();
    for (id, pickup) in &c.pickups {
        pickups.insert(*id, pickup.clone());
    }
    for id in &delta.removed_entities.pickups {
        pickups.remove(id);
    }
    out.pickups = pickups.into_values().collect();
    out.pickups.sort_by_key(|p| p.id.0);

    out.effects = c.effects.clone();

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use usion_types::{PickupType, Phase, ProjectileKind};

    fn base_state() -> NetWorldState {
        NetWorldState {
            phase: Phase::Playing,
            tick: 1,
            remaining_ms: 180_000.0,
            arena: usion_types::Arena::default(),
            players: HashMap::new(),
            projectiles: vec![],
            pickups: vec![],
            effects: vec![],
            winner_ids: vec![],
            reason: None,
        }
    }

    #[test]
    fn absent_prev_emits_everything_as_changed() {
        let next = base_state();
        let delta = build_delta(None, &next);
        assert_eq!(delta.changed_entities.tick, Some(1));
        assert!(delta.removed_entities.projectiles.is_empty());
    }

    #[test]
    fn unchanged_scalars_are_omitted() {
        let prev = base_state();
        let next = base_state();
        let delta = build_delta(Some(&prev), &next);
        assert!(delta.changed_entities.tick.is_none());
        assert!(delta.changed_entities.remaining_ms.is_none());
    }

    #[test]
    fn projectile_removed_between_frames_is_reported() {
        let mut prev = base_state();
        prev.projectiles.push(NetProjectile {
            id: ProjectileId(1),
            owner: UserId::new("a"),
            x: 0.0,
            y: 0.0,
            vx: 1.0,
            vy: 0.0,
            ttl_ms: 100.0,
            damage: 30.0,
            kind: ProjectileKind::Bullet,
        });
        let next = base_state();
        let delta = build_delta(Some(&prev), &next);
        assert_eq!(delta.removed_entities.projectiles, vec![ProjectileId(1)]);
        assert!(delta.changed_entities.projectiles.is_empty());
    }

    #[test]
    fn pickup_added_between_frames_is_changed() {
        let prev = base_state();
        let mut next = base_state();
        next.pickups.push(NetPickup {
            id: PickupId(1),
            x: 10.0,
            y: 10.0,
            kind: PickupType::Bomb,
            value: 3,
        });
        let delta = build_delta(Some(&prev), &next);
        assert!(delta.changed_entities.pickups.contains_key(&PickupId(1)));
    }

    #[test]
    fn round_trip_law_holds_across_consecutive_frames() {
        let prev = base_state();
        let mut next = base_state();
        next.tick = 2;
        next.remaining_ms = 179_984.0;
        next.projectiles.push(NetProjectile {
            id: ProjectileId(7),
            owner: UserId::new("a"),
            x: 20.0,
            y: 50.0,
            vx: 70.0,
            vy: 0.0,
            ttl_ms: 1200.0,
            damage: 30.0,
            kind: ProjectileKind::Bullet,
        });
        let delta = build_delta(Some(&prev), &next);
        let rebuilt = apply_delta(&prev, &delta);
        assert_eq!(rebuilt, next);
    }
}
