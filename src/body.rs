//! The narrow physics capability the controller drives.
//!
//! The controller never touches an engine directly. Everything it needs from
//! the rigid body and the physics world goes through [`ControlledBody`], so
//! the control loop can run against a real backend (see
//! [`WorldBody`](crate::backend::WorldBody)) or against a deterministic
//! double in tests.

use bevy::prelude::*;

use crate::detection::{GroundLayer, RayHit};

/// Rigid body and spatial query access for one controlled character.
pub trait ControlledBody {
    /// Current linear velocity.
    fn velocity(&self) -> Vec2;

    /// Overwrite the linear velocity.
    fn set_velocity(&mut self, velocity: Vec2);

    /// Apply an instantaneous impulse (change in momentum).
    fn apply_impulse(&mut self, impulse: Vec2);

    /// Set the multiplier on global gravity for this body.
    fn set_gravity_scale(&mut self, scale: f32);

    /// Cast a ray straight down from the character origin.
    ///
    /// Returns the nearest surface on `layer` within `max_distance`, or `None`.
    fn cast_ground_ray(&mut self, max_distance: f32, layer: GroundLayer) -> Option<RayHit>;
}

impl<T: ControlledBody + ?Sized> ControlledBody for &mut T {
    fn velocity(&self) -> Vec2 {
        (**self).velocity()
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        (**self).set_velocity(velocity)
    }

    fn apply_impulse(&mut self, impulse: Vec2) {
        (**self).apply_impulse(impulse)
    }

    fn set_gravity_scale(&mut self, scale: f32) {
        (**self).set_gravity_scale(scale)
    }

    fn cast_ground_ray(&mut self, max_distance: f32, layer: GroundLayer) -> Option<RayHit> {
        (**self).cast_ground_ray(max_distance, layer)
    }
}
