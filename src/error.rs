//! Controller error types.

use bevy::prelude::*;
use thiserror::Error;

/// Errors raised while constructing or attaching a platformer controller.
///
/// Ray-cast misses and expired timers are normal control states and never
/// surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// A configuration parameter is outside its valid range.
    #[error("invalid controller config: `{field}` = {value}")]
    InvalidConfig {
        /// Name of the rejected field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// The controller entity has no rigid body the physics backend can drive
    /// (for Rapier: a `RigidBody` together with a `Velocity`).
    #[error("entity {0} has a platformer controller but no rigid body it can drive")]
    MissingRigidBody(Entity),
}
