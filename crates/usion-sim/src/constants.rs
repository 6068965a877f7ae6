//! Exact tuning constants from §4.3.1. Keep these as the single source of
//! truth — scenario expectations in tests and in the client predictor both
//! depend on these exact values.

pub const TURN_RATE_RAD_PER_S: f64 = 3.8;
pub const FORWARD_ACCEL: f64 = 55.0;
pub const REVERSE_ACCEL: f64 = 28.0;
pub const DRAG_PER_S: f64 = 0.18;
pub const MAX_SPEED: f64 = 32.0;

pub const PLAYER_RADIUS: f64 = 2.5;
pub const PROJECTILE_RADIUS: f64 = 0.8;
pub const PICKUP_RADIUS: f64 = 2.8;

pub const PROJECTILE_SPEED: f64 = 70.0;
pub const PROJECTILE_TTL_MS: f64 = 1200.0;
pub const PROJECTILE_DAMAGE: f64 = 30.0;
pub const FIRE_COOLDOWN_MS: f64 = 160.0;

pub const MAX_LAG_COMP_MS: f64 = 120.0;
pub const MAX_HP: f64 = 100.0;

pub const PICKUP_SPAWN_PERIOD_TICKS: u64 = 120;
pub const MAX_PICKUPS: usize = 3;
pub const PICKUP_USES: u32 = 3;

pub const LASER_DPS: f64 = 80.0;
pub const LASER_RANGE: f64 = 55.0;
pub const LASER_HALF_WIDTH: f64 = 0.6;
pub const LASER_BURN_DURATION_MS: f64 = 2000.0;

pub const BOMB_SPEED: f64 = 50.0;
pub const BOMB_DAMAGE: f64 = 60.0;
pub const BOMB_RADIUS: f64 = 8.0;
pub const BOMB_TTL_MS: f64 = 1600.0;
pub const BOMB_SELF_DAMAGE_FACTOR: f64 = 0.5;
pub const BOMB_EDGE_FALLOFF: f64 = 0.4;
pub const BOMB_EFFECT_TTL_MS: f64 = 500.0;

pub const NOVA_DAMAGE: f64 = 50.0;
pub const NOVA_RADIUS: f64 = 15.0;
pub const NOVA_EDGE_FALLOFF: f64 = 0.5;
pub const NOVA_EFFECT_TTL_MS: f64 = 400.0;

pub const SPAWN_NOSE_OFFSET: f64 = PLAYER_RADIUS + 0.5;

pub const TICK_HISTORY_STEP_MS: f64 = 16.0;

pub const QUANTIZE_STEPS: f64 = 10_000.0;

pub const HP_TIE_TOLERANCE: f64 = 1e-4;

/// Left spawn: position and facing (0 rad, facing +x).
pub const SPAWN_LEFT: (f64, f64, f64) = (18.0, 50.0, 0.0);
/// Right spawn: position and facing (pi rad, facing -x).
pub const SPAWN_RIGHT: (f64, f64, f64) = (82.0, 50.0, std::f64::consts::PI);
