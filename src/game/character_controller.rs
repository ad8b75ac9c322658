//! Character locomotion: ground probe, jump arbitration, speed ramp and
//! velocity composition for one physics-driven capsule.
//!
//! Vertical velocity is never cached here. It is read from the physics body
//! every tick and written back together with the horizontal components, so
//! the engine's gravity integration stays authoritative.
//!
//! Jump policy: direct velocity-set (ignores body mass), edge-triggered. A
//! jump re-arms only after the jump input is released.
//!
//! The ground probe is a single downward ray from just inside the capsule
//! bottom. It cannot see ledges the ray misses, steep slopes or gaps
//! narrower than the capsule.

use nalgebra::Vector3;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use super::camera::CameraBasis;
use super::constants::locomotion as consts;
use super::constants::physics as physics_consts;
use super::humanoid_movement::{
    clamp_frame_dt, compose_velocity, desired_direction, ground_basis, heading_of, ramp_speed,
    step_facing,
};
use super::input::FrameInput;
use super::physics::{PhysicsBackend, PhysicsError};
use super::visual::{AnimationClip, VisualSink};
use crate::config::{InvalidTunable, LocomotionConfig};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocomotionError {
    #[error("physics query failed: {0}")]
    PhysicsQueryFailure(#[from] PhysicsError),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] InvalidTunable),
}

impl LocomotionError {
    /// Stable label used to log each kind of failure once.
    pub fn kind(&self) -> &'static str {
        match self {
            LocomotionError::PhysicsQueryFailure(PhysicsError::UnknownBody(_)) => "unknown_body",
            LocomotionError::PhysicsQueryFailure(PhysicsError::MalformedData { .. }) => {
                "malformed_data"
            }
            LocomotionError::PhysicsQueryFailure(PhysicsError::InvalidShape(_)) => "invalid_shape",
            LocomotionError::InvalidConfiguration(_) => "invalid_configuration",
        }
    }
}

/// Capsule dimensions. `height` includes both caps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleShape {
    pub radius: f32,
    pub height: f32,
}

impl CapsuleShape {
    pub fn new(radius: f32, height: f32) -> Self {
        Self { radius, height }
    }

    /// Half length of the cylindrical section (zero for a sphere-like capsule).
    pub fn half_height(&self) -> f32 {
        (self.height - 2.0 * self.radius).max(0.0) / 2.0
    }

    /// Distance from the body center to the collider's lowest point.
    /// Equals `height / 2` unless the capsule is shorter than its diameter.
    pub fn half_extent(&self) -> f32 {
        self.half_height() + self.radius
    }

    fn validate(&self) -> Result<(), InvalidTunable> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(InvalidTunable::new("character.radius", self.radius));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(InvalidTunable::new("character.height", self.height));
        }
        Ok(())
    }
}

/// Per-character locomotion state, mutated once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionState {
    /// Unit vector in the ground plane, or zero before the first move
    pub horizontal_direction: Vector3<f32>,
    pub current_speed: f32,
    /// Yaw in (-PI, PI]
    pub facing_angle: f32,
    pub is_grounded: bool,
    pub is_moving: bool,
    /// Set by a jump, cleared once the jump input is released
    pub jump_cooldown_active: bool,
    /// Set by a jump, cleared once the character is back on the ground
    pub airborne_from_jump: bool,
}

impl Default for LocomotionState {
    fn default() -> Self {
        Self {
            horizontal_direction: Vector3::zeros(),
            current_speed: 0.0,
            facing_angle: 0.0,
            is_grounded: false,
            is_moving: false,
            jump_cooldown_active: false,
            airborne_from_jump: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickOutcome {
    Applied,
    /// A physics query failed; the character held its previous state.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocomotionStats {
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub jumps: u64,
    pub landings: u64,
}

struct TickReport {
    translation: [f32; 3],
    landed: bool,
    jumped: bool,
    no_camera_frame: bool,
}

/// Grounded and re-armed since the last jump.
fn jump_allowed(state: &LocomotionState) -> bool {
    state.is_grounded && !state.jump_cooldown_active
}

pub struct LocomotionController<B> {
    body: B,
    shape: CapsuleShape,
    config: LocomotionConfig,
    max_frame_dt: f32,
    state: LocomotionState,
    playing: Option<AnimationClip>,
    failing: Option<&'static str>,
    stats: LocomotionStats,
}

impl<B: Copy + fmt::Debug> LocomotionController<B> {
    /// Validates the tunables and creates the character's body and capsule.
    pub fn spawn<P>(
        physics: &mut P,
        position: [f32; 3],
        shape: CapsuleShape,
        config: LocomotionConfig,
    ) -> Result<Self, LocomotionError>
    where
        P: PhysicsBackend<Body = B>,
    {
        config.validate()?;
        shape.validate()?;

        let body = physics.create_body(position)?;
        physics.create_capsule_collider(body, shape.radius, shape.half_height())?;

        info!(
            ?body,
            ?position,
            radius = shape.radius,
            height = shape.height,
            "Character controller created"
        );

        Ok(Self {
            body,
            shape,
            config,
            max_frame_dt: physics_consts::MAX_FRAME_DT,
            state: LocomotionState::default(),
            playing: None,
            failing: None,
            stats: LocomotionStats::default(),
        })
    }

    pub fn body(&self) -> B {
        self.body
    }

    pub fn shape(&self) -> CapsuleShape {
        self.shape
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn stats(&self) -> LocomotionStats {
        self.stats
    }

    pub fn is_grounded(&self) -> bool {
        self.state.is_grounded
    }

    pub fn current_speed(&self) -> f32 {
        self.state.current_speed
    }

    pub fn facing_angle(&self) -> f32 {
        self.state.facing_angle
    }

    /// Whether the last tick was skipped and the failure has not cleared yet.
    pub fn is_failing(&self) -> bool {
        self.failing.is_some()
    }

    /// Replaces the movement tunables. The current speed is pulled under a
    /// lowered cap immediately.
    pub fn set_config(&mut self, config: LocomotionConfig) -> Result<(), LocomotionError> {
        config.validate()?;
        self.config = config;
        self.state.current_speed = self.state.current_speed.min(config.max_speed);
        debug!(?config, "Locomotion config updated");
        Ok(())
    }

    pub fn set_max_frame_dt(&mut self, max_frame_dt: f32) -> Result<(), LocomotionError> {
        if !(max_frame_dt.is_finite() && max_frame_dt > 0.0) {
            let err = InvalidTunable::new("physics.max_frame_dt", max_frame_dt);
            return Err(err.into());
        }
        self.max_frame_dt = max_frame_dt;
        Ok(())
    }

    /// Probes for ground below the capsule and stores the result.
    pub fn probe_ground<P>(&mut self, physics: &P) -> Result<bool, LocomotionError>
    where
        P: PhysicsBackend<Body = B>,
    {
        let translation = physics.translation(self.body)?;
        let grounded = self.probe_from(physics, translation)?;
        self.state.is_grounded = grounded;
        Ok(grounded)
    }

    fn probe_from<P>(&self, physics: &P, translation: [f32; 3]) -> Result<bool, LocomotionError>
    where
        P: PhysicsBackend<Body = B>,
    {
        let bottom = translation[1] - self.shape.half_extent();
        let origin = [
            translation[0],
            bottom + consts::PROBE_START_OFFSET,
            translation[2],
        ];
        let hit = physics.cast_ray(origin, [0.0, -1.0, 0.0], consts::PROBE_LENGTH, self.body)?;
        Ok(hit.is_some_and(|h| h.distance <= consts::PROBE_LENGTH))
    }

    pub fn can_jump(&self) -> bool {
        jump_allowed(&self.state)
    }

    /// Jumps if grounded and re-armed: overwrites vertical velocity with
    /// `jump_strength`, keeping horizontal velocity. Returns false, touching
    /// nothing, when the jump is not allowed.
    pub fn try_jump<P>(&mut self, physics: &mut P) -> Result<bool, LocomotionError>
    where
        P: PhysicsBackend<Body = B>,
    {
        if !self.can_jump() {
            return Ok(false);
        }
        let mut next = self.state;
        let velocity = self.launch(&mut next, physics.linear_velocity(self.body)?);
        physics.set_linear_velocity(self.body, velocity)?;
        self.state = next;
        self.record_jump();
        Ok(true)
    }

    /// Arms the cooldown on `state` and returns `velocity` with the jump
    /// applied to its vertical component.
    fn launch(&self, state: &mut LocomotionState, velocity: [f32; 3]) -> [f32; 3] {
        state.jump_cooldown_active = true;
        state.airborne_from_jump = true;
        [velocity[0], self.config.jump_strength, velocity[2]]
    }

    fn record_jump(&mut self) {
        self.stats.jumps += 1;
        debug!(jump_strength = self.config.jump_strength, "Jump executed");
    }

    /// Runs one locomotion step and presents the result.
    ///
    /// Physics failures are not propagated: the tick is skipped, the state
    /// left as it was, and the failure logged once until ticks recover.
    pub fn tick<P>(
        &mut self,
        physics: &mut P,
        visual: &mut dyn VisualSink,
        input: &FrameInput,
        camera: &CameraBasis,
        dt: f32,
    ) -> TickOutcome
    where
        P: PhysicsBackend<Body = B>,
    {
        let dt = clamp_frame_dt(dt, self.max_frame_dt);
        self.stats.ticks += 1;

        match self.advance(physics, input, camera, dt) {
            Ok((next, report)) => {
                let was_grounded = self.state.is_grounded;
                self.state = next;
                self.note_recovery();

                if was_grounded != next.is_grounded {
                    debug!(grounded = next.is_grounded, "Grounded state changed");
                }
                if report.landed {
                    self.stats.landings += 1;
                    debug!(position = ?report.translation, "Landed");
                }
                if report.jumped {
                    self.record_jump();
                }
                if report.no_camera_frame {
                    debug!(?camera, "Camera basis unusable, movement input ignored");
                }

                self.present(visual, report.translation);
                TickOutcome::Applied
            }
            Err(err) => {
                self.note_failure(&err);
                TickOutcome::Skipped
            }
        }
    }

    /// Computes the next state and writes the composed velocity. Nothing on
    /// `self` changes, so a failure part way leaves the state untouched.
    /// All reads happen before the single velocity write.
    fn advance<P>(
        &self,
        physics: &mut P,
        input: &FrameInput,
        camera: &CameraBasis,
        dt: f32,
    ) -> Result<(LocomotionState, TickReport), LocomotionError>
    where
        P: PhysicsBackend<Body = B>,
    {
        let mut next = self.state;

        let translation = physics.translation(self.body)?;
        next.is_grounded = self.probe_from(physics, translation)?;
        let landed = !self.state.is_grounded && next.is_grounded;

        let jumped = input.jump && jump_allowed(&next);
        if !input.jump {
            next.jump_cooldown_active = false;
        }

        let basis = ground_basis(camera.forward, camera.right);
        let desired = match basis {
            Some((forward, right)) => desired_direction(input, &forward, &right),
            None => None,
        };
        next.is_moving = desired.is_some();
        if let Some(direction) = desired {
            next.horizontal_direction = direction;
        }

        let target_speed = if next.is_moving { self.config.max_speed } else { 0.0 };
        next.current_speed = ramp_speed(
            next.current_speed,
            target_speed,
            self.config.acceleration,
            self.config.deceleration,
            self.config.max_speed,
            dt,
        );

        if next.is_moving {
            next.facing_angle = step_facing(
                next.facing_angle,
                heading_of(&next.horizontal_direction),
                self.config.turn_speed,
                dt,
            );
        }

        let mut velocity = physics.linear_velocity(self.body)?;
        if jumped {
            velocity = self.launch(&mut next, velocity);
        } else if landed || (next.is_grounded && velocity[1] <= consts::SETTLED_VERTICAL_SPEED) {
            next.airborne_from_jump = false;
        }
        let vertical = velocity[1];

        physics.set_linear_velocity(
            self.body,
            compose_velocity(&next.horizontal_direction, next.current_speed, vertical),
        )?;

        Ok((
            next,
            TickReport {
                translation,
                landed,
                jumped,
                no_camera_frame: basis.is_none() && input.any_movement(),
            },
        ))
    }

    /// Clip for the current state: jump while airborne after a jump, walk while moving.
    pub fn animation_clip(&self) -> AnimationClip {
        if self.state.airborne_from_jump {
            AnimationClip::Jump
        } else if self.state.is_moving {
            AnimationClip::Walk
        } else {
            AnimationClip::Idle
        }
    }

    fn present(&mut self, visual: &mut dyn VisualSink, translation: [f32; 3]) {
        visual.set_position(translation);
        visual.set_facing(self.state.facing_angle);

        if !visual.is_loaded() {
            return;
        }
        let clip = self.animation_clip();
        if self.playing != Some(clip) {
            debug!(clip = clip.name(), "Animation clip changed");
            visual.play_animation(clip);
            self.playing = Some(clip);
        }
    }

    fn note_failure(&mut self, err: &LocomotionError) {
        self.stats.skipped_ticks += 1;
        let kind = err.kind();
        if self.failing != Some(kind) {
            warn!(
                error = %err,
                kind,
                body = ?self.body,
                "Locomotion tick skipped, holding last state"
            );
            self.failing = Some(kind);
        }
    }

    fn note_recovery(&mut self) {
        if let Some(kind) = self.failing.take() {
            info!(
                kind,
                skipped_total = self.stats.skipped_ticks,
                "Locomotion ticks recovered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::PhysicsWorld;
    use crate::game::visual::TransformProbe;

    #[test]
    fn test_capsule_half_height() {
        assert!(
            (CapsuleShape::new(0.4, 1.8).half_height() - 0.5).abs() < 1e-6
        );
        assert_eq!(CapsuleShape::new(1.0, 1.5).half_height(), 0.0);
    }

    #[test]
    fn test_capsule_half_extent_follows_collider() {
        assert!(
            (CapsuleShape::new(0.4, 1.8).half_extent() - 0.9).abs() < 1e-6
        );
        // Shorter than its diameter: the collider is a sphere of the full radius.
        assert!(
            (CapsuleShape::new(0.7, 0.6).half_extent() - 0.7).abs() < 1e-6
        );
    }

    #[test]
    fn test_spawn_rejects_non_positive_tunables_before_touching_physics() {
        let mut world = PhysicsWorld::default();
        for field in 0..5 {
            let mut config = LocomotionConfig::default();
            match field {
                0 => config.max_speed = 0.0,
                1 => config.acceleration = -1.0,
                2 => config.deceleration = 0.0,
                3 => config.turn_speed = -0.5,
                _ => config.jump_strength = 0.0,
            }
            let result = LocomotionController::spawn(
                &mut world,
                [0.0, 3.0, 0.0],
                CapsuleShape::new(0.4, 1.8),
                config,
            );
            assert!(matches!(
                result,
                Err(LocomotionError::InvalidConfiguration(_))
            ));
        }
        assert_eq!(world.rigid_body_set.len(), 0);
    }

    #[test]
    fn test_spawn_rejects_bad_capsule() {
        let mut world = PhysicsWorld::default();
        let result = LocomotionController::spawn(
            &mut world,
            [0.0, 3.0, 0.0],
            CapsuleShape::new(0.0, 1.8),
            LocomotionConfig::default(),
        );
        let err = result.err().expect("zero radius must fail");
        assert_eq!(err.kind(), "invalid_configuration");
    }

    #[test]
    fn test_spawn_creates_body_at_position() {
        let mut world = PhysicsWorld::default();
        let controller = LocomotionController::spawn(
            &mut world,
            [1.0, 3.0, -2.0],
            CapsuleShape::new(0.4, 1.8),
            LocomotionConfig::default(),
        )
        .unwrap();
        assert_eq!(
            world.translation(controller.body()).unwrap(),
            [1.0, 3.0, -2.0]
        );
        assert_eq!(*controller.state(), LocomotionState::default());
        assert_eq!(controller.animation_clip(), AnimationClip::Idle);
    }

    #[test]
    fn test_set_config_validates_and_caps_speed() {
        let mut world = PhysicsWorld::default();
        let mut controller = LocomotionController::spawn(
            &mut world,
            [0.0, 3.0, 0.0],
            CapsuleShape::new(0.4, 1.8),
            LocomotionConfig::default(),
        )
        .unwrap();
        controller.state.current_speed = 5.0;

        let slower = LocomotionConfig {
            max_speed: 2.2,
            ..LocomotionConfig::default()
        };
        controller.set_config(slower).unwrap();
        assert_eq!(controller.current_speed(), 2.2);

        let broken = LocomotionConfig {
            turn_speed: 0.0,
            ..LocomotionConfig::default()
        };
        assert!(controller.set_config(broken).is_err());
        assert_eq!(controller.config().max_speed, 2.2);
        assert!(controller.set_max_frame_dt(0.0).is_err());
    }

    #[test]
    fn test_unloaded_model_gets_no_animation_until_ready() {
        let mut world = PhysicsWorld::default();
        let mut controller = LocomotionController::spawn(
            &mut world,
            [0.0, 3.0, 0.0],
            CapsuleShape::new(0.4, 1.8),
            LocomotionConfig::default(),
        )
        .unwrap();
        world.refresh_queries();

        let mut probe = TransformProbe::unloaded();
        let camera = CameraBasis::default();
        let outcome = controller.tick(
            &mut world,
            &mut probe,
            &FrameInput::default(),
            &camera,
            1.0 / 60.0,
        );
        assert_eq!(outcome, TickOutcome::Applied);
        assert_eq!(probe.clip(), None);
        assert_eq!(probe.position(), [0.0, 3.0, 0.0]);

        probe.set_loaded(true);
        let _ = controller.tick(
            &mut world,
            &mut probe,
            &FrameInput::default(),
            &camera,
            1.0 / 60.0,
        );
        assert_eq!(probe.clip(), Some(AnimationClip::Idle));
        let _ = controller.tick(
            &mut world,
            &mut probe,
            &FrameInput::default(),
            &camera,
            1.0 / 60.0,
        );
        assert_eq!(probe.clip_changes(), 1);
    }

    #[test]
    fn test_tick_on_removed_body_is_skipped() {
        let mut world = PhysicsWorld::default();
        let mut controller = LocomotionController::spawn(
            &mut world,
            [0.0, 3.0, 0.0],
            CapsuleShape::new(0.4, 1.8),
            LocomotionConfig::default(),
        )
        .unwrap();
        world.remove_body(controller.body());

        let mut probe = TransformProbe::new();
        let input = FrameInput {
            forward: true,
            ..FrameInput::default()
        };
        let outcome = controller.tick(
            &mut world,
            &mut probe,
            &input,
            &CameraBasis::default(),
            1.0 / 60.0,
        );
        assert_eq!(outcome, TickOutcome::Skipped);
        assert!(controller.is_failing());
        assert_eq!(controller.current_speed(), 0.0);
        assert_eq!(controller.stats().skipped_ticks, 1);
    }
}
