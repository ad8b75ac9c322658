//! Game physics and tuning constants.
//! Centralizing these prevents bugs from duplicated hardcoded values.

/// Physics constants
pub mod physics {
    /// Default gravity magnitude in units/s² (applied along -Y)
    pub const DEFAULT_GRAVITY: f32 = 30.0;

    /// Nominal frame timestep (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Largest frame delta fed to the simulation; a stalled frame loop
    /// resumes with this step instead of one huge integration step.
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Character capsule friction against the ground
    pub const CHARACTER_FRICTION: f32 = 0.7;

    /// Character capsule restitution (no bounce on landing)
    pub const CHARACTER_RESTITUTION: f32 = 0.0;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 0.001;
}

/// Locomotion defaults
pub mod locomotion {
    /// Top horizontal speed (units/second)
    pub const DEFAULT_MAX_SPEED: f32 = 5.0;

    /// Speed gained per second while a movement key is held
    pub const DEFAULT_ACCELERATION: f32 = 20.0;

    /// Speed lost per second once movement keys are released
    pub const DEFAULT_DECELERATION: f32 = 10.0;

    /// Fraction of the remaining facing arc closed per second
    pub const DEFAULT_TURN_SPEED: f32 = 5.0;

    /// Vertical velocity set on jump (units/second)
    pub const DEFAULT_JUMP_STRENGTH: f32 = 10.0;

    /// Ground probe starts this far above the capsule bottom
    pub const PROBE_START_OFFSET: f32 = 0.1;

    /// Ground probe length, reaching 0.2 below the capsule bottom
    pub const PROBE_LENGTH: f32 = 0.3;

    /// Grounded characters moving up slower than this have finished a jump
    pub const SETTLED_VERTICAL_SPEED: f32 = 0.5;
}

/// Character body defaults
pub mod character {
    /// Capsule radius
    pub const DEFAULT_RADIUS: f32 = 0.4;

    /// Capsule total height (caps included)
    pub const DEFAULT_HEIGHT: f32 = 1.8;

    /// Spawn point, above the ground slab
    pub const DEFAULT_SPAWN: [f32; 3] = [0.0, 3.0, 0.0];
}

/// Follow camera defaults
pub mod camera {
    /// Orbit distance from the look-at point
    pub const DEFAULT_DISTANCE: f32 = 5.0;

    /// Look-at height above the character origin
    pub const DEFAULT_HEIGHT: f32 = 2.0;

    /// Per-frame lerp factor toward the desired eye position
    pub const DEFAULT_SMOOTHING: f32 = 0.05;

    /// Radians of orbit per pixel of mouse travel
    pub const DEFAULT_SENSITIVITY: f32 = 0.005;

    /// Pitch clamp, keeps the camera from flipping over the pole
    pub const DEFAULT_PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_3;
}

/// Demo scene layout
pub mod scene {
    /// Ground slab edge length
    pub const GROUND_SIZE: f32 = 50.0;

    /// Ground slab half thickness; top face sits at this height
    pub const GROUND_HALF_THICKNESS: f32 = 0.1;
}
