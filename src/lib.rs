//! # `platformer_controller`
//!
//! A 2D platformer character controller with physics backend abstraction.
//!
//! This crate provides a tight, arcade-style controller that:
//! - Moves horizontally at a fixed speed straight from the input axis
//! - Detects ground with a single downward raycast, with probe-length
//!   hysteresis to avoid flicker
//! - Hovers at a target clearance and glides up small ledges (step-up)
//! - Buffers early jump presses and allows late jumps (coyote time)
//! - Abstracts the physics backend (Rapier2D included)
//!
//! ## Architecture
//!
//! The control loop itself lives in [`controller::PlatformerController`] and
//! only talks to physics through the small [`body::ControlledBody`] trait.
//! Two entry points drive it:
//! 1. Once per rendered frame, the jump buffer is updated from input
//! 2. Once per fixed step, the controller cancels last tick's step-up
//!    correction, senses ground, moves, re-applies step-up, updates coyote
//!    time, evaluates the jump and ticks the step-up cooldown
//!
//! [`PlatformerControllerPlugin`] schedules both for every entity carrying a
//! [`config::PlatformerConfig`] and a [`controller::PlatformerController`].
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use platformer_controller::prelude::*;
//!
//! let config = PlatformerConfig::default().with_speed(6.0);
//! let bundle = PlatformerBundle::new(config).expect("valid config");
//!
//! // Spawn `bundle` together with your physics components.
//! # let _ = bundle;
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod body;
pub mod config;
pub mod controller;
pub mod detection;
pub mod error;
pub mod intent;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{CharacterPhysicsBackend, WorldBody};
    pub use crate::body::ControlledBody;
    pub use crate::config::PlatformerConfig;
    pub use crate::controller::{PlatformerController, StepReport};
    pub use crate::detection::{GroundLayer, GroundProbe, RayHit};
    pub use crate::error::ControllerError;
    pub use crate::intent::PlatformerInput;
    pub use crate::state::{Airborne, Grounded, JumpPhase};
    pub use crate::systems::CharacterJumped;
    pub use crate::{
        PlatformerBundle, PlatformerControllerPlugin, PlatformerControllerSet,
        PlatformerDebugPlugin,
    };

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dCharacterBundle};
}

/// System sets of the controller.
///
/// `Input` runs in `Update`; the others form the fixed-step pipeline in
/// `FixedUpdate`, run in order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlatformerControllerSet {
    /// Jump press sampling, once per rendered frame. Systems writing
    /// [`intent::PlatformerInput`] should run `.before` this set.
    Input,
    /// Validation of newly added controllers.
    Preparation,
    /// The controller fixed step.
    Step,
    /// State marker sync.
    Sync,
}

/// Components needed to run a platformer controller on an entity.
///
/// Physics components (rigid body, collider) come from the backend.
#[derive(Bundle, Clone)]
pub struct PlatformerBundle {
    pub config: config::PlatformerConfig,
    pub controller: controller::PlatformerController,
    pub input: intent::PlatformerInput,
    pub airborne: state::Airborne,
}

impl PlatformerBundle {
    /// Build the bundle, failing if `config` is invalid.
    pub fn new(config: config::PlatformerConfig) -> Result<Self, error::ControllerError> {
        Ok(Self {
            controller: controller::PlatformerController::new(&config)?,
            config,
            input: default(),
            airborne: state::Airborne,
        })
    }
}

/// Main plugin for the platformer controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (raycasting, velocity, impulses, gravity scale).
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(PlatformerControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct PlatformerControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for PlatformerControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for PlatformerControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<config::PlatformerConfig>();
        app.register_type::<controller::PlatformerController>();
        app.register_type::<intent::PlatformerInput>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::JumpPhase>();
        app.register_type::<detection::GroundProbe>();
        app.register_type::<detection::GroundLayer>();

        app.add_event::<systems::CharacterJumped>();

        app.add_plugins(B::plugin());

        // Input is sampled at frame rate, independent of the physics clock.
        app.add_systems(
            Update,
            systems::sample_jump_input.in_set(PlatformerControllerSet::Input),
        );

        app.configure_sets(
            FixedUpdate,
            (
                PlatformerControllerSet::Preparation,
                PlatformerControllerSet::Step,
                PlatformerControllerSet::Sync,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::validate_controllers::<B>.in_set(PlatformerControllerSet::Preparation),
                systems::fixed_step_controllers::<B>.in_set(PlatformerControllerSet::Step),
                systems::sync_state_markers.in_set(PlatformerControllerSet::Sync),
            ),
        );
    }
}

/// Debug drawing of the ground probe.
///
/// Draws a red line from each character's origin down by the current probe
/// length. Requires Bevy's gizmo plugin (part of `DefaultPlugins`).
pub struct PlatformerDebugPlugin;

impl Plugin for PlatformerDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, systems::draw_ground_probe);
    }
}
