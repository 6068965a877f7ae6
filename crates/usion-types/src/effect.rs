//! Short-lived visual markers broadcast to clients; purely cosmetic.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Explosion,
    Nova,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub x: f64,
    pub y: f64,
    /// Remaining time-to-live, ms.
    pub ttl_ms: f64,
}
