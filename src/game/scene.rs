use rapier3d::prelude::RigidBodyHandle;
use tracing::info;

use super::constants::scene as consts;
use super::physics::{PhysicsError, PhysicsWorld};

/// Static geometry handles for the demo playground.
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub ground: RigidBodyHandle,
    pub obstacles: Vec<RigidBodyHandle>,
    pub ramp: RigidBodyHandle,
}

/// (center, full size) of the box obstacles
const OBSTACLES: [([f32; 3], [f32; 3]); 4] = [
    ([5.0, 1.0, 5.0], [2.0, 2.0, 2.0]),
    ([-5.0, 0.5, -5.0], [1.0, 1.0, 1.0]),
    ([0.0, 0.75, 8.0], [1.5, 1.5, 1.5]),
    ([-8.0, 0.75, 3.0], [1.5, 1.5, 1.5]),
];

const RAMP_SIZE: [f32; 3] = [4.0, 0.5, 8.0];
const RAMP_TILT: f32 = std::f32::consts::PI / 8.0;

/// Builds the ground slab, box obstacles and a tilted ramp.
pub fn build_demo_scene(world: &mut PhysicsWorld) -> Result<DemoScene, PhysicsError> {
    let half = consts::GROUND_SIZE / 2.0;
    let ground = world.add_fixed_box(
        [0.0, 0.0, 0.0],
        [half, consts::GROUND_HALF_THICKNESS, half],
        [0.0, 0.0, 0.0],
    )?;

    let mut obstacles = Vec::with_capacity(OBSTACLES.len());
    for (center, size) in OBSTACLES {
        let half_extents = [size[0] / 2.0, size[1] / 2.0, size[2] / 2.0];
        obstacles.push(world.add_fixed_box(center, half_extents, [0.0, 0.0, 0.0])?);
    }

    let ramp = world.add_fixed_box(
        [8.0, RAMP_SIZE[1] / 2.0, 0.0],
        [RAMP_SIZE[0] / 2.0, RAMP_SIZE[1] / 2.0, RAMP_SIZE[2] / 2.0],
        [RAMP_TILT, 0.0, 0.0],
    )?;

    world.refresh_queries();
    info!(obstacles = obstacles.len(), "Demo scene built");

    Ok(DemoScene {
        ground,
        obstacles,
        ramp,
    })
}
