//! Device-independent input state and per-step snapshots.
//!
//! The platform layer feeds button edges and an analog move axis into
//! [`InputState`] at whatever rate the device delivers them. The
//! simulation never reads that mutable state directly: once per fixed
//! step it takes an immutable [`InputSnapshot`] and every system in that
//! step sees the same values.

use glam::Vec2;
use std::collections::HashSet;

/// Logical gameplay buttons. Bindings to physical keys/pads live in the
/// platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Fire,
    Dash,
    Pause,
    Restart,
}

/// Accumulates input events for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Buttons currently held down.
    held: HashSet<Button>,
    /// Buttons pressed this frame.
    pressed: HashSet<Button>,
    /// Buttons released this frame.
    released: HashSet<Button>,
    /// Analog movement axis, each component in [-1, 1].
    move_axis: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame edges. Call at the start of each frame, before
    /// feeding new events.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    /// Process a button transition from the platform layer.
    pub fn process_button(&mut self, button: Button, down: bool) {
        if down {
            if !self.held.contains(&button) {
                self.pressed.insert(button);
            }
            self.held.insert(button);
        } else {
            self.held.remove(&button);
            self.released.insert(button);
        }
    }

    /// Set the analog movement axis. Components are clamped to [-1, 1];
    /// out-of-range values from a miscalibrated device are logged once per
    /// occurrence at debug level.
    pub fn set_move_axis(&mut self, axis: Vec2) {
        if axis.x.abs() > 1.0 || axis.y.abs() > 1.0 {
            log::debug!("move axis out of range, clamping: {:?}", axis);
        }
        self.move_axis = axis.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held.contains(&button)
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }

    pub fn is_released(&self, button: Button) -> bool {
        self.released.contains(&button)
    }

    /// Freeze the current state into the immutable per-step view the
    /// simulation consumes.
    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            move_axis: self.move_axis,
            fire_held: self.is_held(Button::Fire),
            fire_pressed: self.is_pressed(Button::Fire),
            dash_pressed: self.is_pressed(Button::Dash),
            pause_pressed: self.is_pressed(Button::Pause),
            restart_pressed: self.is_pressed(Button::Restart),
        }
    }
}

/// Immutable input view for one fixed step.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    /// Normalized movement intent, each component in [-1, 1].
    pub move_axis: Vec2,
    pub fire_held: bool,
    pub fire_pressed: bool,
    pub dash_pressed: bool,
    pub pause_pressed: bool,
    pub restart_pressed: bool,
}
