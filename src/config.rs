//! Tuning configuration parsing from tuning.toml files

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::game::constants::{camera, character, locomotion, physics};

/// Movement tunables for one character controller (`[movement]` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Top horizontal speed
    pub max_speed: f32,
    /// Speed gained per second while moving
    pub acceleration: f32,
    /// Speed lost per second while stopping
    pub deceleration: f32,
    /// Facing interpolation rate (per second)
    pub turn_speed: f32,
    /// Vertical velocity written on jump
    pub jump_strength: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            max_speed: locomotion::DEFAULT_MAX_SPEED,
            acceleration: locomotion::DEFAULT_ACCELERATION,
            deceleration: locomotion::DEFAULT_DECELERATION,
            turn_speed: locomotion::DEFAULT_TURN_SPEED,
            jump_strength: locomotion::DEFAULT_JUMP_STRENGTH,
        }
    }
}

impl LocomotionConfig {
    pub fn validate(&self) -> Result<(), InvalidTunable> {
        require_positive("movement.max_speed", self.max_speed)?;
        require_positive("movement.acceleration", self.acceleration)?;
        require_positive("movement.deceleration", self.deceleration)?;
        require_positive("movement.turn_speed", self.turn_speed)?;
        require_positive("movement.jump_strength", self.jump_strength)
    }
}

/// Character body shape and spawn point (`[character]` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub radius: f32,
    /// Total capsule height, caps included
    pub height: f32,
    pub spawn: [f32; 3],
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            radius: character::DEFAULT_RADIUS,
            height: character::DEFAULT_HEIGHT,
            spawn: character::DEFAULT_SPAWN,
        }
    }
}

impl CharacterConfig {
    pub fn validate(&self) -> Result<(), InvalidTunable> {
        require_positive("character.radius", self.radius)?;
        require_positive("character.height", self.height)?;
        if let Some(&bad) = self.spawn.iter().find(|v| !v.is_finite()) {
            return Err(InvalidTunable::new("character.spawn", bad));
        }
        Ok(())
    }
}

/// Follow camera settings (`[camera]` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub height: f32,
    /// Per-frame lerp factor in (0, 1]
    pub smoothing: f32,
    /// Radians per pixel of mouse travel
    pub sensitivity: f32,
    pub pitch_limit: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: camera::DEFAULT_DISTANCE,
            height: camera::DEFAULT_HEIGHT,
            smoothing: camera::DEFAULT_SMOOTHING,
            sensitivity: camera::DEFAULT_SENSITIVITY,
            pitch_limit: camera::DEFAULT_PITCH_LIMIT,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), InvalidTunable> {
        require_positive("camera.distance", self.distance)?;
        if !self.height.is_finite() {
            return Err(InvalidTunable::new("camera.height", self.height));
        }
        require_positive("camera.smoothing", self.smoothing)?;
        if self.smoothing > 1.0 {
            return Err(InvalidTunable::new("camera.smoothing", self.smoothing));
        }
        require_positive("camera.sensitivity", self.sensitivity)?;
        require_positive("camera.pitch_limit", self.pitch_limit)?;
        if self.pitch_limit >= std::f32::consts::FRAC_PI_2 {
            return Err(InvalidTunable::new("camera.pitch_limit", self.pitch_limit));
        }
        Ok(())
    }
}

/// World physics settings (`[physics]` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity magnitude, applied along -Y
    pub gravity: f32,
    /// Upper clamp on the per-frame delta time
    pub max_frame_dt: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: physics::DEFAULT_GRAVITY,
            max_frame_dt: physics::MAX_FRAME_DT,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), InvalidTunable> {
        require_positive("physics.gravity", self.gravity)?;
        require_positive("physics.max_frame_dt", self.max_frame_dt)
    }
}

/// Tuning configuration from tuning.toml
///
/// Every section is optional; `TuningConfig::default()` doubles as the
/// "reset all settings" value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub movement: LocomotionConfig,
    pub character: CharacterConfig,
    pub camera: CameraConfig,
    pub physics: PhysicsConfig,
}

impl TuningConfig {
    /// Load tuning configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&content)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn validate(&self) -> Result<(), InvalidTunable> {
        self.movement.validate()?;
        self.character.validate()?;
        self.camera.validate()?;
        self.physics.validate()
    }
}

/// A tunable outside its accepted range
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("{field} must be positive and finite, got {value}")]
pub struct InvalidTunable {
    pub field: &'static str,
    pub value: f32,
}

impl InvalidTunable {
    pub fn new(field: &'static str, value: f32) -> Self {
        Self { field, value }
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), InvalidTunable> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidTunable::new(field, value))
    }
}

/// Errors that can occur when loading tuning configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Invalid(#[from] InvalidTunable),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = TuningConfig::from_toml_str("").unwrap();
        assert_eq!(config, TuningConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
            [movement]
            max_speed = 2.2
            jump_strength = 25.0

            [physics]
            gravity = 9.81
        "#;
        let config = TuningConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.movement.max_speed, 2.2);
        assert_eq!(config.movement.jump_strength, 25.0);
        assert_eq!(
            config.movement.acceleration,
            locomotion::DEFAULT_ACCELERATION
        );
        assert_eq!(config.physics.gravity, 9.81);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [movement]
            max_speed = 6.0
            acceleration = 30.0
            deceleration = 15.0
            turn_speed = 8.0
            jump_strength = 12.0

            [character]
            radius = 0.5
            height = 2.0
            spawn = [1.0, 4.0, -2.0]

            [camera]
            distance = 6.0
            height = 2.5
            smoothing = 0.1
            sensitivity = 0.002
            pitch_limit = 1.0

            [physics]
            gravity = 20.0
            max_frame_dt = 0.05
        "#;
        let config = TuningConfig::from_toml_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.character.spawn, [1.0, 4.0, -2.0]);
        assert_eq!(config.camera.distance, 6.0);
        assert_eq!(config.physics.max_frame_dt, 0.05);
    }

    #[test]
    fn test_rejects_non_positive_tunables() {
        let mut config = TuningConfig::default();
        config.movement.deceleration = 0.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "movement.deceleration");

        let mut config = TuningConfig::default();
        config.movement.max_speed = f32::NAN;
        assert_eq!(config.validate().unwrap_err().field, "movement.max_speed");

        let mut config = TuningConfig::default();
        config.camera.smoothing = 1.5;
        assert_eq!(config.validate().unwrap_err().field, "camera.smoothing");
    }

    #[test]
    fn test_from_file_reports_missing_path() {
        let err = TuningConfig::from_file(Path::new("/nonexistent/tuning.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("tuning.toml"));
    }

    #[test]
    fn test_unknown_type_is_parse_error() {
        let err = TuningConfig::from_toml_str("[movement]\nmax_speed = \"fast\"\n");
        assert!(err.is_err());
    }
}
