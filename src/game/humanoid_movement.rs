use nalgebra::Vector3;
use std::f32::consts::{PI, TAU};

use super::constants::physics as consts;
use super::input::FrameInput;

/// Clamps a wall-clock frame delta to `[0, max_dt]`; non-finite deltas become 0.
pub fn clamp_frame_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, max_dt)
    } else {
        0.0
    }
}

/// Wraps an angle into (-PI, PI].
pub fn wrap_angle(angle: f32) -> f32 {
    let a = angle % TAU;
    if a <= -PI {
        a + TAU
    } else if a > PI {
        a - TAU
    } else {
        a
    }
}

/// Signed delta from `from` to `to` along the shorter arc.
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    let mut delta = wrap_angle(to) - wrap_angle(from);
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    delta
}

/// Advances `current` toward `target` by `turn_speed * dt` of the remaining
/// arc, never past the target.
pub fn step_facing(current: f32, target: f32, turn_speed: f32, dt: f32) -> f32 {
    let t = (turn_speed * dt).clamp(0.0, 1.0);
    wrap_angle(current + shortest_arc(current, target) * t)
}

/// Yaw that points the model's +Z axis along `direction`.
pub fn heading_of(direction: &Vector3<f32>) -> f32 {
    direction.x.atan2(direction.z)
}

/// Moves `current` toward `target`, accelerating and decelerating at separate
/// rates, clamped to `[0, max_speed]`.
pub fn ramp_speed(
    current: f32,
    target: f32,
    acceleration: f32,
    deceleration: f32,
    max_speed: f32,
    dt: f32,
) -> f32 {
    let next = if current < target {
        (current + acceleration * dt).min(target)
    } else {
        (current - deceleration * dt).max(target)
    };
    next.clamp(0.0, max_speed)
}

/// Flattens a vector onto the ground plane and normalizes it.
/// Returns `None` for non-finite or near-vertical input.
pub fn ground_plane(v: [f32; 3]) -> Option<Vector3<f32>> {
    if !v.iter().all(|c| c.is_finite()) {
        return None;
    }
    let flat = Vector3::new(v[0], 0.0, v[2]);
    let len = flat.magnitude();
    if len < consts::EPSILON {
        None
    } else {
        Some(flat / len)
    }
}

/// Camera forward/right projected onto the ground plane.
///
/// A single degenerate axis is rebuilt from the other one; when both are
/// unusable there is no camera-relative frame and `None` is returned.
pub fn ground_basis(forward: [f32; 3], right: [f32; 3]) -> Option<(Vector3<f32>, Vector3<f32>)> {
    match (ground_plane(forward), ground_plane(right)) {
        (Some(f), Some(r)) => Some((f, r)),
        (Some(f), None) => Some((f, Vector3::new(-f.z, 0.0, f.x))),
        (None, Some(r)) => Some((Vector3::new(r.z, 0.0, -r.x), r)),
        (None, None) => None,
    }
}

/// Unit move direction for the held keys, or `None` when they cancel out.
pub fn desired_direction(
    input: &FrameInput,
    forward: &Vector3<f32>,
    right: &Vector3<f32>,
) -> Option<Vector3<f32>> {
    let mut sum = Vector3::zeros();
    if input.forward {
        sum += forward;
    }
    if input.backward {
        sum -= forward;
    }
    if input.right {
        sum += right;
    }
    if input.left {
        sum -= right;
    }
    let len = sum.magnitude();
    if len < consts::EPSILON {
        None
    } else {
        Some(sum / len)
    }
}

/// Horizontal motion from locomotion, vertical from the physics body.
pub fn compose_velocity(direction: &Vector3<f32>, speed: f32, vertical: f32) -> [f32; 3] {
    [direction.x * speed, vertical, direction.z * speed]
}
