//! Ship motion integration: steps 3a-3h of the tick algorithm (§4.3.2).

use usion_types::{Arena, Ship};

use crate::constants::*;
use crate::quantize::quantize;

fn normalize_angle(angle: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let mut a = (angle + std::f64::consts::PI) % two_pi;
    if a < 0.0 {
        a += two_pi;
    }
    a - std::f64::consts::PI
}

/// Advances one ship's position, velocity and facing by `dt_ms`. Does not
/// touch firing, lasers, or cooldown bookkeeping beyond decrementing the
/// timers — those stay in `weapons.rs` since they need sibling-ship context.
pub fn integrate_ship_motion(ship: &mut Ship, arena: &Arena, dt_ms: f64) {
    let dt = dt_ms / 1000.0;
    let input = ship.input;

    // 3a: turn
    ship.angle = normalize_angle(ship.angle + input.turn * TURN_RATE_RAD_PER_S * dt);

    // 3b: forward/reverse acceleration along the new facing
    let accel_mag = if input.thrust >= 0.0 {
        FORWARD_ACCEL * input.thrust
    } else {
        REVERSE_ACCEL * input.thrust
    };
    ship.vx += ship.angle.cos() * accel_mag * dt;
    ship.vy += ship.angle.sin() * accel_mag * dt;

    // 3c: drag
    let drag = (-DRAG_PER_S * dt).exp();
    ship.vx *= drag;
    ship.vy *= drag;

    // 3d: clamp speed
    let speed = ship.vx.hypot(ship.vy);
    if speed > MAX_SPEED {
        let scale = MAX_SPEED / speed;
        ship.vx *= scale;
        ship.vy *= scale;
    }

    // 3e: integrate position, clamp into bounds, zero the offending velocity component
    ship.x += ship.vx * dt;
    ship.y += ship.vy * dt;

    let min = PLAYER_RADIUS;
    let max = arena.width - PLAYER_RADIUS;
    if ship.x < min {
        ship.x = min;
        if ship.vx < 0.0 {
            ship.vx = 0.0;
        }
    } else if ship.x > max {
        ship.x = max;
        if ship.vx > 0.0 {
            ship.vx = 0.0;
        }
    }

    let min_y = PLAYER_RADIUS;
    let max_y = arena.height - PLAYER_RADIUS;
    if ship.y < min_y {
        ship.y = min_y;
        if ship.vy < 0.0 {
            ship.vy = 0.0;
        }
    } else if ship.y > max_y {
        ship.y = max_y;
        if ship.vy > 0.0 {
            ship.vy = 0.0;
        }
    }

    // 3f: quantize
    ship.x = quantize(ship.x);
    ship.y = quantize(ship.y);
    ship.vx = quantize(ship.vx);
    ship.vy = quantize(ship.vy);
    ship.angle = quantize(ship.angle);

    // 3g: position history
    ship.position_history.push((ship.x, ship.y));

    // 3h: cooldown timers
    ship.fire_cooldown_ms = (ship.fire_cooldown_ms - dt_ms).max(0.0);
    ship.nova_cooldown_ms = (ship.nova_cooldown_ms - dt_ms).max(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use usion_types::UserId;

    #[test]
    fn thrust_accelerates_along_facing() {
        let mut ship = Ship::new(UserId::new("a"), 50.0, 50.0, 0.0);
        ship.input.thrust = 1.0;
        integrate_ship_motion(&mut ship, &Arena::default(), 16.0);
        assert!(ship.vx > 0.0);
        assert_eq!(ship.vy, 0.0);
    }

    #[test]
    fn speed_is_clamped_to_max() {
        let mut ship = Ship::new(UserId::new("a"), 50.0, 50.0, 0.0);
        ship.vx = 1000.0;
        integrate_ship_motion(&mut ship, &Arena::default(), 16.0);
        assert!(ship.speed() <= MAX_SPEED + 1e-6);
    }

    #[test]
    fn wall_clamp_zeroes_offending_velocity() {
        let mut ship = Ship::new(UserId::new("a"), 1.0, 50.0, std::f64::consts::PI);
        ship.vx = -50.0;
        integrate_ship_motion(&mut ship, &Arena::default(), 16.0);
        assert_eq!(ship.x, PLAYER_RADIUS);
        assert_eq!(ship.vx, 0.0);
    }

    #[test]
    fn angle_stays_normalized() {
        let mut ship = Ship::new(UserId::new("a"), 50.0, 50.0, 3.0);
        ship.input.turn = 1.0;
        for _ in 0..1000 {
            integrate_ship_motion(&mut ship, &Arena::default(), 16.0);
        }
        assert!(ship.angle >= -std::f64::consts::PI && ship.angle <= std::f64::consts::PI);
    }
}
