//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::{CharacterPhysicsBackend, NoOpBackendPlugin};
use crate::detection::{GroundLayer, RayHit};

/// Rapier2D physics backend for the platformer controller.
///
/// Velocity lives in [`Velocity`], jumps go through [`ExternalImpulse`] and
/// gravity is toggled through [`GravityScale`]. Ground rays are answered by
/// the default Rapier context.
pub struct Rapier2dBackend;

/// Cached system state used to reach the Rapier context from an exclusive
/// system.
#[derive(Resource)]
struct RapierQueryState(SystemState<ReadRapierContext<'static, 'static>>);

impl CharacterPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        NoOpBackendPlugin
    }

    fn raycast(
        world: &mut World,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        exclude_entity: Entity,
        layer: GroundLayer,
    ) -> Option<RayHit> {
        if !world.contains_resource::<RapierQueryState>() {
            let state = SystemState::<ReadRapierContext<'static, 'static>>::new(world);
            world.insert_resource(RapierQueryState(state));
        }

        world.resource_scope(|world, mut state: Mut<RapierQueryState>| {
            let rapier_context = state.0.get(world);
            let Ok(context) = rapier_context.single() else {
                return None;
            };
            rapier_raycast(&context, origin, direction, max_distance, exclude_entity, layer)
        })
    }

    fn has_body(world: &World, entity: Entity) -> bool {
        // Movement is written through `Velocity`; without it the body would
        // never move.
        world.get::<RigidBody>(entity).is_some() && world.get::<Velocity>(entity).is_some()
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
            return;
        }

        // No ExternalImpulse component: apply as a velocity change.
        let mass = world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|&m| m > 0.0 && m.is_finite())
            .unwrap_or(1.0);
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel += impulse / mass;
        }
    }

    fn get_gravity_scale(world: &World, entity: Entity) -> f32 {
        world
            .get::<GravityScale>(entity)
            .map(|g| g.0)
            .unwrap_or(1.0)
    }

    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
        if let Some(mut gravity) = world.get_mut::<GravityScale>(entity) {
            gravity.0 = scale;
        } else if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(GravityScale(scale));
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.timestep().as_secs_f32())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 64.0)
    }
}

/// Query filter for a ground ray: skip the caster and sensors, keep only
/// colliders whose memberships intersect `layer`.
fn ground_filter(exclude_entity: Entity, layer: GroundLayer) -> QueryFilter<'static> {
    QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(layer.0),
        ))
}

/// Perform a raycast using RapierContext.
fn rapier_raycast(
    context: &RapierContext,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    exclude_entity: Entity,
    layer: GroundLayer,
) -> Option<RayHit> {
    context
        .cast_ray(
            origin,
            direction,
            max_distance,
            true, // solid = true for solid hits
            ground_filter(exclude_entity, layer),
        )
        .map(|(hit_entity, toi)| RayHit::new(toi, origin + direction * toi, Some(hit_entity)))
}

/// Bundle for creating a platformer character with Rapier2D physics.
///
/// Provides the rigid body, velocity, impulse and gravity-scale components the
/// backend drives. Rotation is locked: the controller only ever moves the
/// character in the plane.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) -> Result {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         PlatformerBundle::new(PlatformerConfig::default())?,
///         Rapier2dCharacterBundle::new(),
///         Collider::capsule_y(0.25, 0.2),
///     ));
///     Ok(())
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `velocity`: Zero velocity
/// - `external_impulse`: Zero impulse (used for jump impulses)
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`]
/// - `gravity_scale`: 3.0, the controller rewrites it every fixed step
/// - `mass_properties`: Default (computed by Rapier from collider)
#[derive(Bundle)]
pub struct Rapier2dCharacterBundle {
    /// The rigid body type. Should be [`RigidBody::Dynamic`] for the
    /// controller's gravity toggling to have any effect.
    pub rigid_body: RigidBody,
    /// Linear velocity, owned by the controller between physics steps.
    pub velocity: Velocity,
    /// Accumulated impulses. Used for jumps.
    pub external_impulse: ExternalImpulse,
    /// Which axes are locked.
    pub locked_axes: LockedAxes,
    /// Gravity multiplier. Zero while step-up correction holds the character.
    pub gravity_scale: GravityScale,
    /// Computed mass properties.
    pub mass_properties: ReadMassProperties,
}

impl Default for Rapier2dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dCharacterBundle {
    /// Create a rotation-locked dynamic character bundle.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            gravity_scale: GravityScale(3.0),
            mass_properties: ReadMassProperties::default(),
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, TransformPlugin));
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
        app.insert_resource(Time::<Fixed>::from_hz(50.0));
        app
    }

    #[test]
    fn rapier_backend_get_position() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((Transform::from_xyz(100.0, 200.0, 0.0), RigidBody::Dynamic))
            .id();

        app.update();

        let pos = Rapier2dBackend::get_position(app.world(), entity);
        assert!((pos.x - 100.0).abs() < 0.01);
        assert!((pos.y - 200.0).abs() < 0.01);
    }

    #[test]
    fn rapier_backend_velocity() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                RigidBody::Dynamic,
                Velocity::linear(Vec2::new(5.0, 3.0)),
            ))
            .id();

        let vel = Rapier2dBackend::get_velocity(app.world(), entity);
        assert_eq!(vel, Vec2::new(5.0, 3.0));

        Rapier2dBackend::set_velocity(app.world_mut(), entity, Vec2::new(10.0, 0.0));

        let vel = Rapier2dBackend::get_velocity(app.world(), entity);
        assert_eq!(vel, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn rapier_backend_gravity_scale_is_inserted_and_updated() {
        let mut app = create_test_app();
        let entity = app
            .world_mut()
            .spawn((Transform::default(), RigidBody::Dynamic))
            .id();

        assert_eq!(Rapier2dBackend::get_gravity_scale(app.world(), entity), 1.0);

        Rapier2dBackend::set_gravity_scale(app.world_mut(), entity, 0.0);
        assert_eq!(Rapier2dBackend::get_gravity_scale(app.world(), entity), 0.0);

        Rapier2dBackend::set_gravity_scale(app.world_mut(), entity, 3.0);
        assert_eq!(Rapier2dBackend::get_gravity_scale(app.world(), entity), 3.0);
    }

    #[test]
    fn rapier_backend_impulse_accumulates() {
        let mut app = create_test_app();
        let entity = app
            .world_mut()
            .spawn((Transform::default(), Rapier2dCharacterBundle::new()))
            .id();

        Rapier2dBackend::apply_impulse(app.world_mut(), entity, Vec2::new(0.0, 15.0));
        Rapier2dBackend::apply_impulse(app.world_mut(), entity, Vec2::new(1.0, 0.0));

        let impulse = app.world().get::<ExternalImpulse>(entity).unwrap();
        assert_eq!(impulse.impulse, Vec2::new(1.0, 15.0));
    }

    #[test]
    fn rapier_backend_impulse_without_component_changes_velocity() {
        let mut app = create_test_app();
        let entity = app
            .world_mut()
            .spawn((Transform::default(), RigidBody::Dynamic, Velocity::zero()))
            .id();

        Rapier2dBackend::apply_impulse(app.world_mut(), entity, Vec2::new(0.0, 15.0));

        let vel = Rapier2dBackend::get_velocity(app.world(), entity);
        assert_eq!(vel, Vec2::new(0.0, 15.0));
    }

    #[test]
    fn rapier_backend_has_body() {
        let mut app = create_test_app();
        let with_body = app
            .world_mut()
            .spawn((Transform::default(), RigidBody::Dynamic, Velocity::zero()))
            .id();
        let without_body = app.world_mut().spawn(Transform::default()).id();

        assert!(Rapier2dBackend::has_body(app.world(), with_body));
        assert!(!Rapier2dBackend::has_body(app.world(), without_body));
    }

    #[test]
    fn rapier_backend_body_without_velocity_is_rejected() {
        let mut app = create_test_app();
        let entity = app
            .world_mut()
            .spawn((Transform::default(), RigidBody::Dynamic))
            .id();

        app.update();

        assert!(!Rapier2dBackend::has_body(app.world(), entity));
    }

    #[test]
    fn rapier_character_bundle_is_a_drivable_body() {
        let mut app = create_test_app();
        let entity = app
            .world_mut()
            .spawn((Transform::default(), Rapier2dCharacterBundle::new()))
            .id();

        assert!(Rapier2dBackend::has_body(app.world(), entity));
    }

    // ==================== Ground Ray Tests ====================

    /// Character with a small ball collider centred `height` above the origin.
    fn spawn_caster(app: &mut App, height: f32) -> Entity {
        app.world_mut()
            .spawn((
                Transform::from_xyz(0.0, height, 0.0),
                RigidBody::Fixed,
                Velocity::zero(),
                Collider::ball(0.2),
            ))
            .id()
    }

    /// Flat ground whose top surface sits at y = 0.
    fn spawn_ground(app: &mut App, groups: CollisionGroups) -> Entity {
        app.world_mut()
            .spawn((
                Transform::from_xyz(0.0, -0.5, 0.0),
                RigidBody::Fixed,
                Collider::cuboid(10.0, 0.5),
                groups,
            ))
            .id()
    }

    /// Let Rapier register the colliders and refresh its query pipeline.
    fn settle(app: &mut App) {
        for _ in 0..3 {
            app.update();
        }
    }

    fn cast_down(app: &mut App, caster: Entity, max_distance: f32, layer: GroundLayer) -> Option<RayHit> {
        let origin = Rapier2dBackend::get_position(app.world(), caster);
        Rapier2dBackend::raycast(
            app.world_mut(),
            origin,
            Vec2::NEG_Y,
            max_distance,
            caster,
            layer,
        )
    }

    #[test]
    fn raycast_hits_ground_below_and_skips_own_collider() {
        let mut app = create_test_app();
        let caster = spawn_caster(&mut app, 0.4);
        let ground = spawn_ground(&mut app, CollisionGroups::default());
        settle(&mut app);

        // The ray starts inside the caster's own ball; a hit at 0.4 means it
        // was skipped.
        let hit = cast_down(&mut app, caster, 1.0, GroundLayer::ALL).expect("ground below");
        assert!((hit.distance - 0.4).abs() < 1e-3);
        assert!(hit.point.y.abs() < 1e-3);
        assert_eq!(hit.entity, Some(ground));

        // Repeated casts reuse the cached query state.
        assert!(cast_down(&mut app, caster, 1.0, GroundLayer::ALL).is_some());
    }

    #[test]
    fn raycast_respects_max_distance() {
        let mut app = create_test_app();
        let caster = spawn_caster(&mut app, 0.4);
        spawn_ground(&mut app, CollisionGroups::default());
        settle(&mut app);

        assert!(cast_down(&mut app, caster, 0.3, GroundLayer::ALL).is_none());
    }

    #[test]
    fn raycast_ignores_ground_outside_layer() {
        let mut app = create_test_app();
        let caster = spawn_caster(&mut app, 0.4);
        spawn_ground(&mut app, CollisionGroups::new(Group::GROUP_2, Group::ALL));
        settle(&mut app);

        assert!(cast_down(&mut app, caster, 1.0, GroundLayer::layer(0)).is_none());
        assert!(cast_down(&mut app, caster, 1.0, GroundLayer::layer(1)).is_some());
    }

    #[test]
    fn raycast_ignores_sensors() {
        let mut app = create_test_app();
        let caster = spawn_caster(&mut app, 0.4);
        app.world_mut().spawn((
            Transform::from_xyz(0.0, -0.5, 0.0),
            Collider::cuboid(10.0, 0.5),
            Sensor,
        ));
        settle(&mut app);

        assert!(cast_down(&mut app, caster, 1.0, GroundLayer::ALL).is_none());
    }

    #[test]
    fn rapier_backend_fixed_timestep() {
        let app = create_test_app();
        let dt = Rapier2dBackend::get_fixed_timestep(app.world());
        assert!((dt - 0.02).abs() < 1e-6);
    }

    #[test]
    fn rapier_character_bundle_creates_valid_entity() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                Rapier2dCharacterBundle::new(),
                Collider::capsule_y(0.25, 0.2),
            ))
            .id();

        app.update();

        assert!(app.world().get::<RigidBody>(entity).is_some());
        assert!(app.world().get::<Velocity>(entity).is_some());
        assert!(app.world().get::<ExternalImpulse>(entity).is_some());
        assert_eq!(
            app.world().get::<GravityScale>(entity).map(|g| g.0),
            Some(3.0)
        );
    }
}
