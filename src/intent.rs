//! Player input component.
//!
//! The host writes the raw input state here every frame; the controller
//! systems read it. Any source works: keyboard, gamepad, AI, replay.

use bevy::prelude::*;

/// Input state for a platformer character.
///
/// # Example
///
/// ```rust
/// use platformer_controller::prelude::*;
///
/// let mut input = PlatformerInput::new();
/// input.set_horizontal(1.0);
/// input.set_jump_pressed(true);
/// assert!(input.is_moving());
/// assert!(input.is_jump_pressed());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct PlatformerInput {
    /// Horizontal axis (-1.0 = left, 1.0 = right).
    pub horizontal: f32,
    /// Whether the jump button is currently held.
    pub jump_pressed: bool,
    /// Held state seen by the previous input sample (for edge detection).
    pub(crate) jump_pressed_prev: bool,
}

impl PlatformerInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal axis, clamped to `[-1, 1]`.
    pub fn set_horizontal(&mut self, axis: f32) {
        self.horizontal = axis.clamp(-1.0, 1.0);
    }

    /// Set whether the jump button is held.
    ///
    /// Call this every frame with the current state; the press edge is
    /// detected when the controller samples input.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    pub fn is_jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    pub fn is_moving(&self) -> bool {
        self.horizontal.abs() > 0.001
    }

    /// Consume the jump state for this frame.
    ///
    /// Returns `true` only on the frame the button went from released to held.
    pub fn take_jump_edge(&mut self) -> bool {
        let edge = self.jump_pressed && !self.jump_pressed_prev;
        self.jump_pressed_prev = self.jump_pressed;
        edge
    }
}
