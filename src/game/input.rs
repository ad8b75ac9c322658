//! Input handling.
//!
//! Keyboard and mouse events arrive in any order between frames; the frame
//! loop samples them once per frame into a `FrameInput` record.

use serde::{Deserialize, Serialize};

/// Held movement keys for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl FrameInput {
    pub fn any_movement(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
}

/// Maps a DOM-style key code to the action it is bound to.
pub fn action_for_key(code: &str) -> Option<Action> {
    match code {
        "KeyW" | "ArrowUp" => Some(Action::Forward),
        "KeyS" | "ArrowDown" => Some(Action::Backward),
        "KeyA" | "ArrowLeft" => Some(Action::Left),
        "KeyD" | "ArrowRight" => Some(Action::Right),
        "Space" => Some(Action::Jump),
        _ => None,
    }
}

/// Raw input event from the windowing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    MouseMove { x: f32, y: f32 },
    MouseButton { down: bool },
}

/// What the frame loop consumes each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSample {
    pub input: FrameInput,
    /// Pixels travelled since the previous sample
    pub mouse_delta: [f32; 2],
}

/// Accumulated keyboard/mouse state between samples.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: FrameInput,
    mouse_delta: [f32; 2],
    cursor: Option<[f32; 2]>,
    button_down: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(code) => self.set_key(code, true),
            InputEvent::KeyUp(code) => self.set_key(code, false),
            InputEvent::MouseMove { x, y } => self.mouse_move(*x, *y),
            InputEvent::MouseButton { down } => self.button_down = *down,
        }
    }

    fn set_key(&mut self, code: &str, pressed: bool) {
        let Some(action) = action_for_key(code) else {
            return;
        };
        match action {
            Action::Forward => self.keys.forward = pressed,
            Action::Backward => self.keys.backward = pressed,
            Action::Left => self.keys.left = pressed,
            Action::Right => self.keys.right = pressed,
            Action::Jump => self.keys.jump = pressed,
        }
    }

    fn mouse_move(&mut self, x: f32, y: f32) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        // The first event only establishes the cursor origin.
        if let Some([px, py]) = self.cursor {
            self.mouse_delta[0] += x - px;
            self.mouse_delta[1] += y - py;
        }
        self.cursor = Some([x, y]);
    }

    pub fn keys(&self) -> FrameInput {
        self.keys
    }

    pub fn button_down(&self) -> bool {
        self.button_down
    }

    /// Takes the current keys and the mouse travel since the last sample.
    pub fn sample(&mut self) -> InputSample {
        let sample = InputSample {
            input: self.keys,
            mouse_delta: self.mouse_delta,
        };
        self.mouse_delta = [0.0, 0.0];
        sample
    }
}
