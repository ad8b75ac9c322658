use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;
use tracing::{debug, info};

use super::camera::FollowCamera;
use super::character_controller::{
    CapsuleShape, LocomotionController, LocomotionError, LocomotionStats, TickOutcome,
};
use super::input::{InputEvent, InputState};
use super::physics::PhysicsWorld;
use super::scene::{build_demo_scene, DemoScene};
use super::visual::{AnimationClip, TransformProbe};
use crate::config::TuningConfig;

mod tick_pipeline;

/// What one frame produced, in a form suitable for JSON-line output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    /// Clamped delta actually simulated
    pub dt: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub speed: f32,
    pub facing: f32,
    pub grounded: bool,
    pub clip: AnimationClip,
    pub outcome: TickOutcome,
}

/// A playable session: one character in the demo scene with a follow camera.
pub struct Session {
    pub(crate) physics: PhysicsWorld,
    scene: DemoScene,
    pub(crate) controller: LocomotionController<RigidBodyHandle>,
    pub(crate) camera: FollowCamera,
    pub(crate) input: InputState,
    pub(crate) visual: TransformProbe,
    pub(crate) tuning: TuningConfig,
    pub(crate) frame: u64,
}

impl Session {
    pub fn new(tuning: TuningConfig) -> Result<Self, LocomotionError> {
        tuning.validate()?;

        let mut physics = PhysicsWorld::new(tuning.physics.gravity);
        let scene = build_demo_scene(&mut physics)?;

        let shape = CapsuleShape::new(tuning.character.radius, tuning.character.height);
        let mut controller = LocomotionController::spawn(
            &mut physics,
            tuning.character.spawn,
            shape,
            tuning.movement,
        )?;
        controller.set_max_frame_dt(tuning.physics.max_frame_dt)?;
        physics.refresh_queries();

        let camera = FollowCamera::new(tuning.camera, tuning.character.spawn);

        info!(
            gravity = tuning.physics.gravity,
            spawn = ?tuning.character.spawn,
            "Session started"
        );

        Ok(Self {
            physics,
            scene,
            controller,
            camera,
            input: InputState::new(),
            visual: TransformProbe::new(),
            tuning,
            frame: 0,
        })
    }

    /// Queues a raw input event; it takes effect on the next frame.
    pub fn handle_input(&mut self, event: &InputEvent) {
        self.input.handle(event);
    }

    /// Runs one frame of `raw_dt` wall-clock seconds.
    pub fn frame(&mut self, raw_dt: f32) -> FrameSnapshot {
        tick_pipeline::run_frame_phases(self, raw_dt)
    }

    /// Applies new tunables to the running session. Character shape and
    /// spawn only take effect in a new session.
    pub fn apply_tuning(&mut self, tuning: TuningConfig) -> Result<(), LocomotionError> {
        tuning.validate()?;
        self.controller.set_config(tuning.movement)?;
        self.controller.set_max_frame_dt(tuning.physics.max_frame_dt)?;
        self.camera.set_config(tuning.camera);
        self.physics.set_gravity(tuning.physics.gravity);
        self.tuning = tuning;
        debug!(?tuning, "Tuning applied");
        Ok(())
    }

    pub fn tuning(&self) -> &TuningConfig {
        &self.tuning
    }

    pub fn scene(&self) -> &DemoScene {
        &self.scene
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn controller(&self) -> &LocomotionController<RigidBodyHandle> {
        &self.controller
    }

    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    pub fn visual(&self) -> &TransformProbe {
        &self.visual
    }

    pub fn stats(&self) -> LocomotionStats {
        self.controller.stats()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}
