//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to drive the platformer controller, and [`WorldBody`], which exposes one
//! entity of a backend-managed world as a [`ControlledBody`].

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::body::ControlledBody;
use crate::detection::{GroundLayer, RayHit};

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the controller.
/// All operations are static functions over the ECS [`World`], so the
/// backend itself carries no state.
///
/// See the `rapier` module's `Rapier2dBackend` for an implementation on top
/// of Bevy Rapier2D.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Cast a ray and return the nearest hit on `layer`.
    ///
    /// # Arguments
    /// * `world` - The ECS world
    /// * `origin` - Ray origin in world space
    /// * `direction` - Cast direction (normalized)
    /// * `max_distance` - Maximum cast distance
    /// * `exclude_entity` - Entity to exclude from the cast (usually self)
    /// * `layer` - Layers that count as hits
    fn raycast(
        world: &mut World,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        exclude_entity: Entity,
        layer: GroundLayer,
    ) -> Option<RayHit>;

    /// Whether `entity` carries every component this backend reads and
    /// writes to drive it.
    fn has_body(world: &World, entity: Entity) -> bool;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Apply an impulse to an entity.
    ///
    /// Impulse is an instantaneous change in momentum.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2);

    /// Get the gravity multiplier of an entity.
    fn get_gravity_scale(world: &World, entity: Entity) -> f32;

    /// Set the gravity multiplier of an entity.
    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32;
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

/// One entity of the world seen through a physics backend.
pub struct WorldBody<'w, B: CharacterPhysicsBackend> {
    world: &'w mut World,
    entity: Entity,
    _marker: PhantomData<B>,
}

impl<'w, B: CharacterPhysicsBackend> WorldBody<'w, B> {
    pub fn new(world: &'w mut World, entity: Entity) -> Self {
        Self {
            world,
            entity,
            _marker: PhantomData,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }
}

impl<B: CharacterPhysicsBackend> ControlledBody for WorldBody<'_, B> {
    fn velocity(&self) -> Vec2 {
        B::get_velocity(&*self.world, self.entity)
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        B::set_velocity(self.world, self.entity, velocity);
    }

    fn apply_impulse(&mut self, impulse: Vec2) {
        B::apply_impulse(self.world, self.entity, impulse);
    }

    fn set_gravity_scale(&mut self, scale: f32) {
        B::set_gravity_scale(self.world, self.entity, scale);
    }

    fn cast_ground_ray(&mut self, max_distance: f32, layer: GroundLayer) -> Option<RayHit> {
        let origin = B::get_position(&*self.world, self.entity);
        B::raycast(
            self.world,
            origin,
            Vec2::NEG_Y,
            max_distance,
            self.entity,
            layer,
        )
    }
}
