//! Scripted input sequences for headless runs.
//!
//! A script is a list of timed phases, each holding a set of keys and a
//! horizontal mouse sweep. `ScriptPlayer` turns phase changes into the same
//! key and mouse events a window would deliver.

use clap::ValueEnum;
use serde::Serialize;

use super::input::{FrameInput, InputEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputScript {
    /// Walk forward, then stop
    Walk,
    /// Walk a square using each movement key in turn
    Square,
    /// Standing jump, then a running jump
    Jump,
    /// Diagonal run with camera sweep, jumps and turns
    Tour,
}

#[derive(Debug, Clone, Copy)]
struct Phase {
    duration: f32,
    keys: FrameInput,
    /// Mouse travel in pixels per second along X
    mouse_x_rate: f32,
}

const NONE: FrameInput = FrameInput {
    forward: false,
    backward: false,
    left: false,
    right: false,
    jump: false,
};

const fn keys(forward: bool, backward: bool, left: bool, right: bool, jump: bool) -> FrameInput {
    FrameInput {
        forward,
        backward,
        left,
        right,
        jump,
    }
}

const fn phase(duration: f32, keys: FrameInput) -> Phase {
    Phase {
        duration,
        keys,
        mouse_x_rate: 0.0,
    }
}

impl InputScript {
    fn phases(self) -> Vec<Phase> {
        // Every script opens with a settle phase so the character lands first.
        match self {
            InputScript::Walk => vec![
                phase(1.0, NONE),
                phase(2.0, keys(true, false, false, false, false)),
                phase(1.0, NONE),
            ],
            InputScript::Square => vec![
                phase(1.0, NONE),
                phase(1.0, keys(true, false, false, false, false)),
                phase(1.0, keys(false, false, false, true, false)),
                phase(1.0, keys(false, true, false, false, false)),
                phase(1.0, keys(false, false, true, false, false)),
                phase(0.5, NONE),
            ],
            InputScript::Jump => vec![
                phase(1.0, NONE),
                phase(0.2, keys(false, false, false, false, true)),
                phase(1.5, NONE),
                phase(0.5, keys(true, false, false, false, false)),
                phase(0.2, keys(true, false, false, false, true)),
                phase(1.0, keys(true, false, false, false, false)),
                phase(1.0, NONE),
            ],
            InputScript::Tour => vec![
                phase(1.0, NONE),
                phase(1.5, keys(true, false, false, true, false)),
                Phase {
                    duration: 2.0,
                    keys: keys(true, false, false, false, false),
                    mouse_x_rate: 150.0,
                },
                phase(0.2, keys(true, false, false, false, true)),
                phase(1.0, keys(true, false, true, false, false)),
                phase(0.5, keys(false, true, false, false, false)),
                phase(1.0, NONE),
            ],
        }
    }

    /// Total scripted time in seconds
    pub fn duration(self) -> f32 {
        self.phases().iter().map(|p| p.duration).sum()
    }
}

const KEY_CODES: [&str; 5] = ["KeyW", "KeyS", "KeyA", "KeyD", "Space"];

fn is_held(code: &str, keys: &FrameInput) -> bool {
    match code {
        "KeyW" => keys.forward,
        "KeyS" => keys.backward,
        "KeyA" => keys.left,
        "KeyD" => keys.right,
        "Space" => keys.jump,
        _ => false,
    }
}

/// Plays an `InputScript` back as input events.
pub struct ScriptPlayer {
    phases: Vec<Phase>,
    elapsed: f32,
    held: FrameInput,
    cursor_x: f32,
    cursor_placed: bool,
}

impl ScriptPlayer {
    pub fn new(script: InputScript) -> Self {
        Self {
            phases: script.phases(),
            elapsed: 0.0,
            held: NONE,
            cursor_x: 0.0,
            cursor_placed: false,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.current().is_none()
    }

    fn current(&self) -> Option<&Phase> {
        let mut start = 0.0;
        self.phases.iter().find(|p| {
            let end = start + p.duration;
            let active = self.elapsed < end;
            start = end;
            active
        })
    }

    /// Events for the frame starting now; then advances the clock by `dt`.
    pub fn advance(&mut self, dt: f32) -> Vec<InputEvent> {
        let (keys, mouse_x_rate) = self
            .current()
            .map(|p| (p.keys, p.mouse_x_rate))
            .unwrap_or((NONE, 0.0));

        let mut events = Vec::new();
        for code in KEY_CODES {
            match (is_held(code, &self.held), is_held(code, &keys)) {
                (false, true) => events.push(InputEvent::KeyDown(code.to_string())),
                (true, false) => events.push(InputEvent::KeyUp(code.to_string())),
                _ => {}
            }
        }
        self.held = keys;

        if mouse_x_rate != 0.0 {
            if !self.cursor_placed {
                // The first move only places the cursor.
                self.cursor_placed = true;
                events.push(InputEvent::MouseMove {
                    x: self.cursor_x,
                    y: 0.0,
                });
            }
            self.cursor_x += mouse_x_rate * dt;
            events.push(InputEvent::MouseMove {
                x: self.cursor_x,
                y: 0.0,
            });
        }

        self.elapsed += dt;
        events
    }
}
