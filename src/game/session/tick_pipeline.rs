use super::{FrameSnapshot, Session};
use crate::game::humanoid_movement::clamp_frame_dt;
use crate::game::physics::PhysicsBackend;

/// Executes the phases of one frame:
/// physics -> query refresh -> input -> camera -> locomotion -> camera follow.
pub(super) fn run_frame_phases(session: &mut Session, raw_dt: f32) -> FrameSnapshot {
    let dt = clamp_frame_dt(raw_dt, session.tuning.physics.max_frame_dt);
    session.frame += 1;

    // Integrate the velocity written by the previous locomotion tick.
    session.physics.step(dt);

    // Ray casts must see this frame's body positions.
    session.physics.refresh_queries();

    let sample = session.input.sample();
    session.camera.apply_look(sample.mouse_delta);
    let basis = session.camera.basis();

    let outcome = session.controller.tick(
        &mut session.physics,
        &mut session.visual,
        &sample.input,
        &basis,
        dt,
    );

    let body = session.controller.body();
    let position = session
        .physics
        .translation(body)
        .unwrap_or_else(|_| session.visual.position());
    let velocity = session.physics.linear_velocity(body).unwrap_or([0.0; 3]);
    session.camera.follow(position);

    let state = session.controller.state();
    FrameSnapshot {
        frame: session.frame,
        dt,
        position,
        velocity,
        speed: state.current_speed,
        facing: state.facing_angle,
        grounded: state.is_grounded,
        clip: session.controller.animation_clip(),
        outcome,
    }
}
