//! Controller configuration component.
//!
//! Holds every authored parameter of the platformer controller. Values are
//! read each tick, so editing the component at runtime (for example through
//! reflection) takes effect on the next step.

use bevy::prelude::*;

use crate::detection::GroundLayer;
use crate::error::ControllerError;

/// Configuration parameters for the platformer controller.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct PlatformerConfig {
    // === Movement ===
    /// Maximum horizontal speed (units/second).
    pub speed: f32,

    // === Step-up ===
    /// Target clearance between the character origin and the ground.
    ///
    /// Also drives the ground probe length: `2 × step_height` while grounded,
    /// `step_height` while airborne.
    pub step_height: f32,

    /// Seconds after a jump during which step-up correction stays disabled.
    pub step_disable_duration: f32,

    /// Gravity scale written to the body whenever the step-up correction is
    /// not active. Zero gravity is used while correcting.
    pub airborne_gravity_scale: f32,

    // === Jump ===
    /// Magnitude of the upward jump impulse.
    pub jump_force: f32,

    /// Seconds a jump press stays buffered.
    pub jump_buffer_time: f32,

    /// Seconds after leaving the ground during which a jump is still allowed.
    pub coyote_time: f32,

    // === Ground ===
    /// Which surfaces count as ground.
    pub ground_layer: GroundLayer,
}

impl Default for PlatformerConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            step_height: 0.5,
            step_disable_duration: 0.5,
            airborne_gravity_scale: 3.0,
            jump_force: 15.0,
            jump_buffer_time: 0.15,
            coyote_time: 0.15,
            ground_layer: GroundLayer::ALL,
        }
    }
}

impl PlatformerConfig {
    /// Ground probe length while in contact with the ground.
    #[inline]
    pub fn grounded_ray_length(&self) -> f32 {
        self.step_height * 2.0
    }

    /// Ground probe length while airborne.
    #[inline]
    pub fn airborne_ray_length(&self) -> f32 {
        self.step_height
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ControllerError> {
        fn non_negative(field: &'static str, value: f32) -> Result<(), ControllerError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ControllerError::InvalidConfig { field, value })
            }
        }

        non_negative("speed", self.speed)?;
        non_negative("step_disable_duration", self.step_disable_duration)?;
        non_negative("airborne_gravity_scale", self.airborne_gravity_scale)?;
        non_negative("jump_force", self.jump_force)?;
        non_negative("jump_buffer_time", self.jump_buffer_time)?;
        non_negative("coyote_time", self.coyote_time)?;

        if !(self.step_height.is_finite() && self.step_height > 0.0) {
            return Err(ControllerError::InvalidConfig {
                field: "step_height",
                value: self.step_height,
            });
        }

        Ok(())
    }

    /// Builder: set horizontal speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Builder: set step height.
    pub fn with_step_height(mut self, height: f32) -> Self {
        self.step_height = height;
        self
    }

    /// Builder: set the post-jump step-up cooldown.
    pub fn with_step_disable_duration(mut self, duration: f32) -> Self {
        self.step_disable_duration = duration;
        self
    }

    /// Builder: set the fallback gravity scale.
    pub fn with_airborne_gravity_scale(mut self, scale: f32) -> Self {
        self.airborne_gravity_scale = scale;
        self
    }

    /// Builder: set jump impulse.
    pub fn with_jump_force(mut self, force: f32) -> Self {
        self.jump_force = force;
        self
    }

    /// Builder: set jump buffer time.
    pub fn with_jump_buffer_time(mut self, time: f32) -> Self {
        self.jump_buffer_time = time;
        self
    }

    /// Builder: set coyote time.
    pub fn with_coyote_time(mut self, time: f32) -> Self {
        self.coyote_time = time;
        self
    }

    /// Builder: set the ground layer filter.
    pub fn with_ground_layer(mut self, layer: GroundLayer) -> Self {
        self.ground_layer = layer;
        self
    }
}
