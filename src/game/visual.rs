use serde::Serialize;

/// Animation clips the character model exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationClip {
    Idle,
    Walk,
    Jump,
}

impl AnimationClip {
    pub fn name(self) -> &'static str {
        match self {
            AnimationClip::Idle => "idle",
            AnimationClip::Walk => "walk",
            AnimationClip::Jump => "jump",
        }
    }
}

/// Write-only target for the character's visual transform.
///
/// Model loading happens elsewhere; the controller only asks whether the
/// model is ready and which clip to play.
pub trait VisualSink {
    fn set_position(&mut self, position: [f32; 3]);

    fn set_facing(&mut self, angle: f32);

    fn is_loaded(&self) -> bool {
        true
    }

    fn play_animation(&mut self, _clip: AnimationClip) {}
}

/// Headless sink recording the last transform and clip changes.
#[derive(Debug, Clone, Default)]
pub struct TransformProbe {
    position: [f32; 3],
    facing: f32,
    clip: Option<AnimationClip>,
    clip_changes: usize,
    loaded: bool,
}

impl TransformProbe {
    pub fn new() -> Self {
        Self {
            loaded: true,
            ..Default::default()
        }
    }

    /// A probe standing in for a model that has not finished loading.
    pub fn unloaded() -> Self {
        Self::default()
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn clip(&self) -> Option<AnimationClip> {
        self.clip
    }

    pub fn clip_changes(&self) -> usize {
        self.clip_changes
    }
}

impl VisualSink for TransformProbe {
    fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    fn set_facing(&mut self, angle: f32) {
        self.facing = angle;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn play_animation(&mut self, clip: AnimationClip) {
        self.clip = Some(clip);
        self.clip_changes += 1;
    }
}
