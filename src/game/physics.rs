use nalgebra::UnitQuaternion;
use rapier3d::prelude::*;
use std::fmt;

use super::constants::physics as consts;

// Characters don't collide with each other, only with static geometry
// Note: rapier3d uses InteractionGroups (not CollisionGroups like bevy_rapier)
const GROUP_STATIC: Group = Group::GROUP_1; // Ground, obstacles, ramps
const GROUP_CHARACTER: Group = Group::GROUP_2; // Character capsules

/// Failures reported by the physics collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("unknown rigid body {0}")]
    UnknownBody(String),
    #[error("malformed {what} from physics world: {value:?}")]
    MalformedData { what: &'static str, value: [f32; 3] },
    #[error("invalid collider shape: {0}")]
    InvalidShape(String),
}

impl PhysicsError {
    pub fn unknown_body(handle: impl fmt::Debug) -> Self {
        Self::UnknownBody(format!("{handle:?}"))
    }
}

/// Closest hit reported by a ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: [f32; 3],
}

/// The narrow slice of a physics engine the locomotion controller talks to.
///
/// Every call is synchronous. The world is stepped once per frame by its
/// owner before any controller reads body state in that frame.
pub trait PhysicsBackend {
    type Body: Copy + fmt::Debug;

    /// Creates a dynamic body with locked rotations at `position`.
    fn create_body(&mut self, position: [f32; 3]) -> Result<Self::Body, PhysicsError>;

    /// Attaches a Y-aligned capsule. `half_height` is the half length of the
    /// cylindrical section only.
    fn create_capsule_collider(
        &mut self,
        body: Self::Body,
        radius: f32,
        half_height: f32,
    ) -> Result<(), PhysicsError>;

    /// Casts a ray, ignoring every collider attached to `exclude`.
    fn cast_ray(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        max_distance: f32,
        exclude: Self::Body,
    ) -> Result<Option<RayHit>, PhysicsError>;

    fn linear_velocity(&self, body: Self::Body) -> Result<[f32; 3], PhysicsError>;

    fn set_linear_velocity(
        &mut self,
        body: Self::Body,
        velocity: [f32; 3],
    ) -> Result<(), PhysicsError>;

    fn translation(&self, body: Self::Body) -> Result<[f32; 3], PhysicsError>;
}

/// Wrapper around Rapier3D physics world for the character simulation.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

fn finite(what: &'static str, value: [f32; 3]) -> Result<[f32; 3], PhysicsError> {
    if value.iter().all(|v| v.is_finite()) {
        Ok(value)
    } else {
        Err(PhysicsError::MalformedData { what, value })
    }
}

impl PhysicsWorld {
    /// Creates a new physics world with gravity of the given magnitude along -Y
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity: vector![0.0, -gravity, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Sets the gravity magnitude for the physics world
    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = vector![0.0, -gravity, 0.0];
    }

    /// Steps the physics simulation forward by dt seconds.
    /// A zero or negative dt leaves the world untouched.
    pub fn step(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Rebuilds the query pipeline so ray casts see colliders added since the last step.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Adds a fixed box to the static geometry.
    /// `rotation` is roll/pitch/yaw in radians.
    pub fn add_fixed_box(
        &mut self,
        position: [f32; 3],
        half_extents: [f32; 3],
        rotation: [f32; 3],
    ) -> Result<RigidBodyHandle, PhysicsError> {
        if half_extents.iter().any(|h| !(h.is_finite() && *h > 0.0)) {
            return Err(PhysicsError::InvalidShape(format!(
                "box half extents {half_extents:?}"
            )));
        }
        let quat = UnitQuaternion::from_euler_angles(rotation[0], rotation[1], rotation[2]);
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position[0], position[1], position[2]])
            .rotation(quat.scaled_axis())
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents[0], half_extents[1], half_extents[2])
            .collision_groups(InteractionGroups::new(GROUP_STATIC, Group::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        Ok(handle)
    }

    /// Removes a body and its colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    pub fn has_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    fn body(&self, handle: RigidBodyHandle) -> Result<&RigidBody, PhysicsError> {
        self.rigid_body_set
            .get(handle)
            .ok_or_else(|| PhysicsError::unknown_body(handle))
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(consts::DEFAULT_GRAVITY)
    }
}

impl PhysicsBackend for PhysicsWorld {
    type Body = RigidBodyHandle;

    fn create_body(&mut self, position: [f32; 3]) -> Result<RigidBodyHandle, PhysicsError> {
        let position = finite("spawn position", position)?;
        // Rotations stay locked so the capsule never tips; facing is tracked by the controller.
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .lock_rotations()
            .build();
        Ok(self.rigid_body_set.insert(body))
    }

    fn create_capsule_collider(
        &mut self,
        body: RigidBodyHandle,
        radius: f32,
        half_height: f32,
    ) -> Result<(), PhysicsError> {
        if !(radius.is_finite() && radius > 0.0 && half_height.is_finite() && half_height >= 0.0) {
            return Err(PhysicsError::InvalidShape(format!(
                "capsule radius {radius}, half height {half_height}"
            )));
        }
        self.body(body)?;
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .friction(consts::CHARACTER_FRICTION)
            .restitution(consts::CHARACTER_RESTITUTION)
            .collision_groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_STATIC))
            .build();
        self.collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        Ok(())
    }

    fn cast_ray(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        max_distance: f32,
        exclude: RigidBodyHandle,
    ) -> Result<Option<RayHit>, PhysicsError> {
        let origin = finite("ray origin", origin)?;
        let dir = vector![direction[0], direction[1], direction[2]];
        let len = dir.magnitude();
        if !len.is_finite() || len < consts::EPSILON {
            return Err(PhysicsError::MalformedData {
                what: "ray direction",
                value: direction,
            });
        }
        let ray = Ray::new(point![origin[0], origin[1], origin[2]], dir / len);

        let filter = QueryFilter::default()
            .exclude_rigid_body(exclude)
            .exclude_sensors();

        Ok(self
            .query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true, // solid
                filter,
            )
            .map(|(_, toi)| {
                let p = ray.point_at(toi);
                RayHit {
                    distance: toi,
                    point: [p.x, p.y, p.z],
                }
            }))
    }

    fn linear_velocity(&self, body: RigidBodyHandle) -> Result<[f32; 3], PhysicsError> {
        let v = self.body(body)?.linvel();
        finite("linear velocity", [v.x, v.y, v.z])
    }

    fn set_linear_velocity(
        &mut self,
        body: RigidBodyHandle,
        velocity: [f32; 3],
    ) -> Result<(), PhysicsError> {
        let velocity = finite("velocity write", velocity)?;
        let rb = self
            .rigid_body_set
            .get_mut(body)
            .ok_or_else(|| PhysicsError::unknown_body(body))?;
        rb.set_linvel(vector![velocity[0], velocity[1], velocity[2]], true);
        Ok(())
    }

    fn translation(&self, body: RigidBodyHandle) -> Result<[f32; 3], PhysicsError> {
        let t = self.body(body)?.translation();
        finite("translation", [t.x, t.y, t.z])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::default();
        world
            .add_fixed_box([0.0, 0.0, 0.0], [50.0, 0.5, 50.0], [0.0, 0.0, 0.0])
            .unwrap();
        world
    }

    #[test]
    fn test_physics_world_creation() {
        let world = PhysicsWorld::default();
        assert_eq!(world.gravity.y, -consts::DEFAULT_GRAVITY);
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = PhysicsWorld::default();
        let body = world.create_body([0.0, 10.0, 0.0]).unwrap();
        world.create_capsule_collider(body, 0.5, 0.5).unwrap();

        let initial = world.translation(body).unwrap();
        for _ in 0..10 {
            world.step(consts::TIMESTEP);
        }
        let after = world.translation(body).unwrap();

        assert!(after[1] < initial[1]);
        assert!(world.linear_velocity(body).unwrap()[1] < 0.0);
    }

    #[test]
    fn test_zero_dt_step_is_a_no_op() {
        let mut world = PhysicsWorld::default();
        let body = world.create_body([0.0, 10.0, 0.0]).unwrap();
        world.create_capsule_collider(body, 0.5, 0.5).unwrap();
        world.step(0.0);
        assert_eq!(world.translation(body).unwrap(), [0.0, 10.0, 0.0]);
    }

    #[test]
    fn test_raycast_finds_floor_top() {
        let mut world = world_with_floor();
        let body = world.create_body([0.0, 6.0, 0.0]).unwrap();
        world.create_capsule_collider(body, 1.0, 1.5).unwrap();
        world.refresh_queries();

        let hit = world
            .cast_ray([0.0, 6.0, 0.0], [0.0, -1.0, 0.0], 10.0, body)
            .unwrap()
            .expect("Should detect floor");
        // Floor top at Y=0.5, origin at Y=6
        assert!((hit.distance - 5.5).abs() < 0.01, "got {}", hit.distance);
        assert!((hit.point[1] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_raycast_skips_excluded_body() {
        let mut world = PhysicsWorld::default();
        let body = world.create_body([0.0, 2.0, 0.0]).unwrap();
        world.create_capsule_collider(body, 0.5, 0.5).unwrap();
        world.refresh_queries();

        // Origin sits inside the capsule; with the body excluded there is nothing else to hit.
        let hit = world
            .cast_ray([0.0, 1.2, 0.0], [0.0, -1.0, 0.0], 0.3, body)
            .unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn test_raycast_rejects_degenerate_direction() {
        let mut world = PhysicsWorld::default();
        let body = world.create_body([0.0, 2.0, 0.0]).unwrap();
        let err = world
            .cast_ray([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0, body)
            .unwrap_err();
        assert!(matches!(
            err,
            PhysicsError::MalformedData { what: "ray direction", .. }
        ));
    }

    #[test]
    fn test_velocity_round_trip_and_non_finite_write() {
        let mut world = PhysicsWorld::default();
        let body = world.create_body([0.0, 2.0, 0.0]).unwrap();
        world.set_linear_velocity(body, [2.0, -1.0, 3.0]).unwrap();
        assert_eq!(world.linear_velocity(body).unwrap(), [2.0, -1.0, 3.0]);

        let err = world
            .set_linear_velocity(body, [f32::NAN, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, PhysicsError::MalformedData { .. }));
        assert_eq!(world.linear_velocity(body).unwrap(), [2.0, -1.0, 3.0]);
    }

    #[test]
    fn test_removed_body_is_unknown() {
        let mut world = PhysicsWorld::default();
        let body = world.create_body([0.0, 2.0, 0.0]).unwrap();
        world.create_capsule_collider(body, 0.5, 0.5).unwrap();
        assert!(world.remove_body(body));
        assert!(!world.has_body(body));
        assert!(matches!(
            world.translation(body),
            Err(PhysicsError::UnknownBody(_))
        ));
        assert!(world.create_capsule_collider(body, 0.5, 0.5).is_err());
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        let mut world = PhysicsWorld::default();
        let body = world.create_body([0.0, 2.0, 0.0]).unwrap();
        assert!(matches!(
            world.create_capsule_collider(body, 0.0, 0.5),
            Err(PhysicsError::InvalidShape(_))
        ));
        assert!(matches!(
            world.add_fixed_box([0.0; 3], [1.0, -1.0, 1.0], [0.0; 3]),
            Err(PhysicsError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_character_rests_on_floor() {
        let mut world = world_with_floor();
        let body = world.create_body([0.0, 3.0, 0.0]).unwrap();
        world.create_capsule_collider(body, 0.5, 0.5).unwrap();

        for _ in 0..120 {
            world.step(consts::TIMESTEP);
        }

        // Floor top at 0.5, capsule half extent 1.0
        let pos = world.translation(body).unwrap();
        assert!(
            (pos[1] - 1.5).abs() < 0.1,
            "Character should rest on the floor, got y={}",
            pos[1]
        );
    }
}
