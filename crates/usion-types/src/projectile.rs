//! Projectiles: standard bullets and bombs.

use serde::{Deserialize, Serialize};

use crate::ids::{ProjectileId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Bullet,
    Bomb,
}

/// A single in-flight projectile. Owned by its room's projectile list; never
/// referenced from elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner: UserId,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Remaining time-to-live, ms. Strictly positive while in the list.
    pub ttl_ms: f64,
    pub damage: f64,
    pub kind: ProjectileKind,
    /// Lag-compensation budget captured at spawn time, ms.
    pub lag_comp_ms: f64,
}
