//! Core controller systems.
//!
//! These systems connect the pure control loop in
//! [`PlatformerController`] to the ECS. They are generic over the physics
//! backend so any engine implementing
//! [`CharacterPhysicsBackend`] can be driven.

use bevy::color::palettes::css;
use bevy::log::error;
use bevy::prelude::*;

use crate::backend::{CharacterPhysicsBackend, WorldBody};
use crate::config::PlatformerConfig;
use crate::controller::PlatformerController;
use crate::error::ControllerError;
use crate::intent::PlatformerInput;
use crate::state::{Airborne, Grounded};

/// Event sent when a character's jump impulse fires.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterJumped {
    pub entity: Entity,
}

/// Sample jump input once per rendered frame.
///
/// Detects the press edge from [`PlatformerInput`] and feeds it, together
/// with the frame delta, into the jump buffer.
pub fn sample_jump_input(
    time: Res<Time>,
    mut q_controllers: Query<(
        &PlatformerConfig,
        &mut PlatformerController,
        &mut PlatformerInput,
    )>,
) {
    let dt = time.delta_secs();

    for (config, mut controller, mut input) in &mut q_controllers {
        let pressed = input.bypass_change_detection().take_jump_edge();
        controller.sample_input(config, pressed, dt);
    }
}

/// Check newly added controllers before they are stepped.
///
/// An invalid config or a missing rigid body is returned as a system error,
/// which Bevy's default error handler turns into a panic.
pub fn validate_controllers<B: CharacterPhysicsBackend>(
    world: &World,
    q_added: Query<(Entity, &PlatformerConfig), Added<PlatformerController>>,
) -> bevy::ecs::error::Result {
    for (entity, config) in &q_added {
        if let Err(err) = config.validate() {
            error!("platformer controller on {entity}: {err}");
            return Err(err.into());
        }

        if !B::has_body(world, entity) {
            let err = ControllerError::MissingRigidBody(entity);
            error!("{err}");
            return Err(err.into());
        }
    }

    Ok(())
}

/// Run one fixed step for every controller.
///
/// Each character goes through the full cancel → sense → move → step-up →
/// coyote → jump → cooldown sequence before the next character starts.
pub fn fixed_step_controllers<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, PlatformerConfig, PlatformerController, f32)> = world
        .query::<(
            Entity,
            &PlatformerConfig,
            &PlatformerController,
            Option<&PlatformerInput>,
        )>()
        .iter(world)
        .map(|(e, config, controller, input)| {
            (
                e,
                *config,
                controller.clone(),
                input.map(|i| i.horizontal).unwrap_or(0.0),
            )
        })
        .collect();

    for (entity, config, mut controller, horizontal) in entities {
        let report = {
            let mut body = WorldBody::<B>::new(world, entity);
            controller.fixed_step(&config, &mut body, horizontal, dt)
        };

        if let Some(mut stored) = world.get_mut::<PlatformerController>(entity) {
            *stored = controller;
        }

        if report.jumped {
            world.send_event(CharacterJumped { entity });
        }
    }
}

/// Sync state marker components from the latest ground probe.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &PlatformerController,
        Has<Grounded>,
        Has<Airborne>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne) in &q_controllers {
        let grounded = controller.is_grounded();

        if grounded && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !grounded && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }
    }
}

/// Draw the ground probe of every controller.
pub fn draw_ground_probe(
    mut gizmos: Gizmos,
    q_controllers: Query<(&GlobalTransform, &PlatformerController)>,
) {
    for (transform, controller) in &q_controllers {
        let origin = transform.translation().xy();
        gizmos.line_2d(
            origin,
            origin + Vec2::NEG_Y * controller.ray_length(),
            css::RED,
        );
    }
}
