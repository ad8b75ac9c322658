//! Third-person follow camera orbiting the character.

use nalgebra::Vector3;

use crate::config::CameraConfig;

/// Camera-relative movement axes for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: [f32; 3],
    pub right: [f32; 3],
}

impl CameraBasis {
    /// Basis of a camera orbiting at `yaw`, looking back toward its target.
    pub fn from_yaw(yaw: f32) -> Self {
        let (s, c) = yaw.sin_cos();
        Self {
            forward: [-s, 0.0, -c],
            right: [c, 0.0, -s],
        }
    }
}

impl Default for CameraBasis {
    fn default() -> Self {
        Self::from_yaw(0.0)
    }
}

pub struct FollowCamera {
    config: CameraConfig,
    yaw: f32,
    pitch: f32,
    eye: Vector3<f32>,
    look_at: Vector3<f32>,
}

impl FollowCamera {
    /// Starts already settled behind `target`.
    pub fn new(config: CameraConfig, target: [f32; 3]) -> Self {
        let mut camera = Self {
            config,
            yaw: 0.0,
            pitch: 0.0,
            eye: Vector3::zeros(),
            look_at: Vector3::zeros(),
        };
        let (eye, look_at) = camera.desired(target);
        camera.eye = eye;
        camera.look_at = look_at;
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CameraConfig) {
        self.config = config;
        self.pitch = self.pitch.clamp(-config.pitch_limit, config.pitch_limit);
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn eye(&self) -> [f32; 3] {
        self.eye.into()
    }

    pub fn look_at(&self) -> [f32; 3] {
        self.look_at.into()
    }

    /// Orbits by a mouse delta in pixels.
    pub fn apply_look(&mut self, mouse_delta: [f32; 2]) {
        let [dx, dy] = mouse_delta;
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.yaw -= dx * self.config.sensitivity;
        self.pitch = (self.pitch - dy * self.config.sensitivity)
            .clamp(-self.config.pitch_limit, self.config.pitch_limit);
    }

    /// Eases the eye and look-at point toward their positions for `target`.
    pub fn follow(&mut self, target: [f32; 3]) {
        let (eye, look_at) = self.desired(target);
        let t = self.config.smoothing;
        self.eye = self.eye.lerp(&eye, t);
        self.look_at = self.look_at.lerp(&look_at, t);
    }

    /// Snaps back directly behind the character.
    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    pub fn basis(&self) -> CameraBasis {
        CameraBasis::from_yaw(self.yaw)
    }

    fn desired(&self, target: [f32; 3]) -> (Vector3<f32>, Vector3<f32>) {
        let look_at = Vector3::new(target[0], target[1] + self.config.height, target[2]);
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        let offset = Vector3::new(sy * cp, sp, cy * cp) * self.config.distance;
        (look_at + offset, look_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_default_basis_looks_down_negative_z() {
        let basis = CameraBasis::default();
        assert!(close(basis.forward, [0.0, 0.0, -1.0]));
        assert!(close(basis.right, [1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_basis_axes_stay_orthonormal() {
        for i in 0..16 {
            let b = CameraBasis::from_yaw(i as f32 * 0.4);
            let f = Vector3::from(b.forward);
            let r = Vector3::from(b.right);
            assert!((f.magnitude() - 1.0).abs() < 1e-5);
            assert!((r.magnitude() - 1.0).abs() < 1e-5);
            assert!(f.dot(&r).abs() < 1e-5);
            // right = forward x up
            let expected = f.cross(&Vector3::y());
            assert!((expected - r).magnitude() < 1e-5);
        }
    }

    #[test]
    fn test_new_camera_sits_behind_target() {
        let camera = FollowCamera::new(CameraConfig::default(), [0.0, 1.0, 0.0]);
        let cfg = CameraConfig::default();
        assert!(close(camera.look_at(), [0.0, 1.0 + cfg.height, 0.0]));
        assert!(close(camera.eye(), [0.0, 1.0 + cfg.height, cfg.distance]));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FollowCamera::new(CameraConfig::default(), [0.0; 3]);
        camera.apply_look([0.0, -100_000.0]);
        assert!(
            (camera.pitch() - CameraConfig::default().pitch_limit).abs() < 1e-6
        );
        camera.apply_look([0.0, 100_000.0]);
        assert!(
            (camera.pitch() + CameraConfig::default().pitch_limit).abs() < 1e-6
        );
    }

    #[test]
    fn test_mouse_right_turns_camera_and_basis() {
        let mut camera = FollowCamera::new(CameraConfig::default(), [0.0; 3]);
        camera.apply_look([100.0, 0.0]);
        assert!(camera.yaw() < 0.0);
        assert_eq!(camera.basis(), CameraBasis::from_yaw(camera.yaw()));
        camera.reset();
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn test_follow_eases_toward_target() {
        let mut camera = FollowCamera::new(CameraConfig::default(), [0.0; 3]);
        let start = camera.look_at();
        camera.follow([10.0, 0.0, 0.0]);
        let after_one = camera.look_at();
        assert!(after_one[0] > start[0] && after_one[0] < 10.0);

        for _ in 0..500 {
            camera.follow([10.0, 0.0, 0.0]);
        }
        assert!((camera.look_at()[0] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_mouse_delta_is_ignored() {
        let mut camera = FollowCamera::new(CameraConfig::default(), [0.0; 3]);
        camera.apply_look([f32::NAN, 1.0]);
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), 0.0);
    }
}
