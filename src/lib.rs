//! Strider locomotion library
//!
//! Third-person character movement over a rapier3d world: ground probing,
//! jump gating, speed ramping and camera-relative steering, plus the demo
//! session that drives it headlessly.

pub mod config;
pub mod game;
