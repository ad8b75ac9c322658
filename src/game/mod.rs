pub mod camera;
pub mod character_controller;
pub mod constants;
pub mod humanoid_movement;
pub mod input;
pub mod physics;
pub mod scene;
pub mod script;
pub mod session;
pub mod visual;

pub use character_controller::{
    CapsuleShape, LocomotionController, LocomotionError, LocomotionState, TickOutcome,
};
pub use session::{FrameSnapshot, Session};
