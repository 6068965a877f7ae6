//! The Ship entity and its special-weapon state machine.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::input::InputSnapshot;

/// Maximum number of position samples retained for lag-compensated rewind.
pub const POSITION_HISTORY_CAPACITY: usize = 30;

/// The special weapon a ship currently holds, granted by collecting a [`crate::pickup::Pickup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialWeapon {
    None,
    Laser,
    Bomb,
    Nova,
}

impl Default for SpecialWeapon {
    fn default() -> Self {
        SpecialWeapon::None
    }
}

/// Per-player accumulated statistics, echoed in `match_end.final_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: f64,
    pub pickups_collected: u32,
}

/// A bounded ring of recent `(x, y)` samples, one pushed per simulation tick,
/// used for lag-compensated hit-scan rewind. Oldest sample is dropped once
/// the ring exceeds [`POSITION_HISTORY_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionHistory(VecDeque<(f64, f64)>);

impl PositionHistory {
    pub fn push(&mut self, sample: (f64, f64)) {
        self.0.push_back(sample);
        if self.0.len() > POSITION_HISTORY_CAPACITY {
            self.0.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position `ticks_back` simulation ticks before the most recent sample.
    /// Clamps at the oldest retained sample; returns `None` if empty (caller
    /// should then fall back to the ship's current position).
    pub fn rewind(&self, ticks_back: usize) -> Option<(f64, f64)> {
        if self.0.is_empty() {
            return None;
        }
        let last = self.0.len() - 1;
        let idx = last.saturating_sub(ticks_back);
        self.0.get(idx).copied()
    }
}

/// A player's ship. Owned exclusively by the [`crate::world::World`] it lives in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub owner: UserId,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Facing angle in radians.
    pub angle: f64,
    pub hp: f64,
    /// Remaining fire cooldown, ms.
    pub fire_cooldown_ms: f64,
    pub alive: bool,
    pub special_weapon: SpecialWeapon,
    pub special_uses: u32,
    /// Accumulated active-laser duration for the current use, ms.
    pub laser_active_ms: f64,
    /// Remaining nova cooldown, ms.
    pub nova_cooldown_ms: f64,
    #[serde(skip)]
    pub position_history: PositionHistory,
    pub input: InputSnapshot,
    pub stats: PlayerStats,
}

impl Ship {
    pub fn new(owner: UserId, x: f64, y: f64, angle: f64) -> Self {
        Self {
            owner,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            angle,
            hp: 100.0,
            fire_cooldown_ms: 0.0,
            alive: true,
            special_weapon: SpecialWeapon::None,
            special_uses: 0,
            laser_active_ms: 0.0,
            nova_cooldown_ms: 0.0,
            position_history: PositionHistory::default(),
            input: InputSnapshot::default(),
            stats: PlayerStats::default(),
        }
    }

    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Clears the special weapon once its uses are exhausted.
    pub fn consume_special_use(&mut self) {
        if self.special_uses > 0 {
            self.special_uses -= 1;
        }
        if self.special_uses == 0 {
            self.special_weapon = SpecialWeapon::None;
            self.laser_active_ms = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_history_drops_oldest_past_capacity() {
        let mut hist = PositionHistory::default();
        for i in 0..40 {
            hist.push((i as f64, 0.0));
        }
        assert_eq!(hist.len(), POSITION_HISTORY_CAPACITY);
        // oldest retained sample should be i = 40 - 30 = 10
        assert_eq!(hist.rewind(POSITION_HISTORY_CAPACITY - 1), Some((10.0, 0.0)));
    }

    #[test]
    fn rewind_clamps_at_oldest_sample() {
        let mut hist = PositionHistory::default();
        hist.push((1.0, 1.0));
        hist.push((2.0, 2.0));
        assert_eq!(hist.rewind(100), Some((1.0, 1.0)));
        assert_eq!(hist.rewind(0), Some((2.0, 2.0)));
    }

    #[test]
    fn consume_special_use_clears_at_zero() {
        let mut ship = Ship::new(UserId::new("a"), 0.0, 0.0, 0.0);
        ship.special_weapon = SpecialWeapon::Bomb;
        ship.special_uses = 1;
        ship.consume_special_use();
        assert_eq!(ship.special_weapon, SpecialWeapon::None);
        assert_eq!(ship.special_uses, 0);
    }
}
