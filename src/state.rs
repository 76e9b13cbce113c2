//! State marker components and the derived jump phase.
//!
//! Markers are added and removed by the controller systems from the ground
//! probe of the latest fixed tick.

use bevy::prelude::*;

/// Marker component indicating the ground probe found ground this tick.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_controller::prelude::*;
///
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Named view over the jump and step-up timers.
///
/// Derived on demand from the counters; it never drives the timers itself, so
/// reading it cannot shift any decrement or reset. Jump eligibility wins over
/// the step-up cooldown: a character still inside the probe right after
/// take-off refreshes its coyote window and can jump again.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpPhase {
    /// No buffered press, no coyote window, no cooldown.
    #[default]
    Idle,
    /// A press is buffered but the character is outside the coyote window.
    /// The jump fires on landing if the buffer has not expired.
    Buffered,
    /// Grounded or within the coyote window; a press would jump.
    CoyoteEligible,
    /// Just jumped and out of the coyote window; step-up correction is
    /// suppressed.
    Cooldown,
}

impl JumpPhase {
    /// Classify a set of timer values.
    pub fn from_timers(jump_buffer: f32, coyote: f32, step_disable: f32) -> Self {
        if coyote > 0.0 {
            Self::CoyoteEligible
        } else if jump_buffer > 0.0 {
            Self::Buffered
        } else if step_disable > 0.0 {
            Self::Cooldown
        } else {
            Self::Idle
        }
    }
}
