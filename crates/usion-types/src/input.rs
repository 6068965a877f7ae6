//! Per-tick input snapshot. Not persisted beyond the tick it is consumed in.

use serde::{Deserialize, Serialize};

/// The latest control intent for one ship. Overwritten wholesale by
/// `Room::enqueue_input`; never queued. Values here are as received from the
/// client — clamping to the ranges in §4.3 happens when the simulation core
/// consumes them via `apply_input`, not at admission time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Desired turn rate fraction, nominally in [-1, 1].
    pub turn: f64,
    /// Desired thrust fraction, nominally in [-1, 1]; negative is reverse.
    pub thrust: f64,
    /// Trigger held down.
    #[serde(default)]
    pub fire: bool,
    /// Edge-triggered: true only on the tick a new press is reported.
    #[serde(default)]
    pub fire_pressed: bool,
    /// Client-assigned monotone counter, used to correlate predicted
    /// projectiles with the server's authoritative spawn.
    #[serde(default)]
    pub fire_seq: u64,
    /// Lag-compensation budget in ms, nominally in [0, 120]; smoothed
    /// server-side and attached by the room admission path, not the client.
    #[serde(default)]
    pub lag_comp_ms: f64,
}

impl InputSnapshot {
    /// Clamp turn/thrust/lag_comp to the ranges the simulation core accepts.
    /// Applied once per tick by `usion_sim::apply_input`.
    pub fn clamped(mut self) -> Self {
        self.turn = self.turn.clamp(-1.0, 1.0);
        self.thrust = self.thrust.clamp(-1.0, 1.0);
        self.lag_comp_ms = self.lag_comp_ms.clamp(0.0, 120.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_fields() {
        let snap = InputSnapshot {
            turn: 4.0,
            thrust: -9.0,
            lag_comp_ms: 500.0,
            ..Default::default()
        }
        .clamped();
        assert_eq!(snap.turn, 1.0);
        assert_eq!(snap.thrust, -1.0);
        assert_eq!(snap.lag_comp_ms, 120.0);
    }

    #[test]
    fn default_is_idle() {
        let snap = InputSnapshot::default();
        assert_eq!(snap.turn, 0.0);
        assert!(!snap.fire);
        assert!(!snap.fire_pressed);
    }
}
