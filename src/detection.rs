//! Ground sensing results.
//!
//! Backends answer a single downward ray query with a [`RayHit`]; the
//! controller folds that into one immutable [`GroundProbe`] per fixed tick
//! which every later sub-step of the tick reads.

use bevy::prelude::*;

/// Layer mask selecting which surfaces count as ground.
///
/// Each bit is one physics layer. Backends translate the mask into their own
/// query filter (collision groups for Rapier).
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroundLayer(pub u32);

impl Default for GroundLayer {
    fn default() -> Self {
        Self::ALL
    }
}

impl GroundLayer {
    /// Every layer is ground.
    pub const ALL: Self = Self(u32::MAX);
    /// Nothing is ground.
    pub const NONE: Self = Self(0);

    /// Mask containing only layer `index`.
    ///
    /// Only layers 0..32 exist; any other index yields [`GroundLayer::NONE`].
    pub const fn layer(index: u32) -> Self {
        match 1u32.checked_shl(index) {
            Some(bit) => Self(bit),
            None => Self::NONE,
        }
    }

    /// Union with another mask.
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether a surface living on `memberships` passes this filter.
    #[inline]
    pub fn accepts(&self, memberships: u32) -> bool {
        self.0 & memberships != 0
    }
}

/// Raw result of a ray query against the physics world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity owning the collider that was hit.
    pub entity: Option<Entity>,
}

impl RayHit {
    pub fn new(distance: f32, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            point,
            entity,
        }
    }
}

/// Ground reading for one fixed tick.
///
/// Produced once by the sensing sub-step and never mutated afterwards, so the
/// ground state cannot change between movement, step-up and coyote updates of
/// the same tick.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundProbe {
    /// Whether the probe hit a ground surface.
    pub contact: bool,
    /// Distance from the character origin to the surface. Zero on a miss.
    pub distance: f32,
    /// Length the ray was cast with.
    pub ray_length: f32,
    /// Surface entity, when the backend reports one.
    #[reflect(ignore)]
    pub entity: Option<Entity>,
}

impl GroundProbe {
    /// A probe that found nothing within `ray_length`.
    pub fn miss(ray_length: f32) -> Self {
        Self {
            ray_length,
            ..default()
        }
    }

    /// A probe that found ground `distance` below the origin.
    pub fn hit(distance: f32, ray_length: f32) -> Self {
        Self {
            contact: true,
            distance,
            ray_length,
            entity: None,
        }
    }

    /// Fold a backend ray result into a probe.
    pub fn from_ray(hit: Option<RayHit>, ray_length: f32) -> Self {
        match hit {
            Some(hit) => Self {
                contact: true,
                distance: hit.distance,
                ray_length,
                entity: hit.entity,
            },
            None => Self::miss(ray_length),
        }
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.contact
    }

    /// Gap between the target clearance and the measured distance.
    ///
    /// Positive when the surface is closer than `target_height`.
    pub fn height_error(&self, target_height: f32) -> f32 {
        target_height - self.distance
    }
}
