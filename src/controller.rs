//! The platformer control loop.
//!
//! [`PlatformerController`] owns every piece of per-character state and
//! exposes the two cadences of the controller as separate entry points:
//!
//! - [`PlatformerController::sample_input`], once per rendered frame, keeps
//!   the jump buffer.
//! - [`PlatformerController::fixed_step`], once per physics step, runs
//!   cancel-correction, ground sensing, movement, step-up, coyote update,
//!   jump and cooldown, in that order.
//!
//! Both take their delta time explicitly and touch the physics world only
//! through [`ControlledBody`], so they can be driven deterministically.

use bevy::log::{debug, trace};
use bevy::prelude::*;

use crate::body::ControlledBody;
use crate::config::PlatformerConfig;
use crate::detection::GroundProbe;
use crate::error::ControllerError;
use crate::state::JumpPhase;

/// What happened during one fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Ground reading every sub-step of this tick used.
    pub ground: GroundProbe,
    /// Step-up correction velocity injected this tick, if any.
    pub correction: Option<Vec2>,
    /// Whether the jump impulse fired.
    pub jumped: bool,
}

/// Runtime state of a platformer character.
///
/// Timers are plain decrementing scalars. The jump buffer and coyote counters
/// are never clamped: negative values simply mean the window has expired,
/// and only their sign is ever checked.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct PlatformerController {
    /// Remaining time a jump press stays honoured.
    pub(crate) jump_buffer_counter: f32,
    /// Remaining time a jump is allowed after leaving the ground.
    pub(crate) coyote_counter: f32,
    /// Remaining step-up cooldown after a jump.
    pub(crate) step_disable_timer: f32,
    /// Probe length for the next ground cast.
    pub(crate) ray_length: f32,
    /// Mirror of the velocity last written to the body.
    pub(crate) velocity: Vec2,
    /// Correction injected by the previous step-up, removed next tick.
    pub(crate) correction_velocity_last_frame: Vec2,
    /// Ground reading of the latest fixed tick.
    pub(crate) last_ground: GroundProbe,
    /// Height error of the latest step-up correction.
    pub(crate) last_height_error: f32,
}

impl Default for PlatformerController {
    fn default() -> Self {
        Self::with_ray_length(PlatformerConfig::default().airborne_ray_length())
    }
}

impl PlatformerController {
    /// Create the controller state for a character using `config`.
    ///
    /// Fails when the configuration is unusable.
    pub fn new(config: &PlatformerConfig) -> Result<Self, ControllerError> {
        config.validate()?;
        Ok(Self::with_ray_length(config.airborne_ray_length()))
    }

    fn with_ray_length(ray_length: f32) -> Self {
        Self {
            jump_buffer_counter: 0.0,
            coyote_counter: 0.0,
            step_disable_timer: 0.0,
            ray_length,
            velocity: Vec2::ZERO,
            correction_velocity_last_frame: Vec2::ZERO,
            last_ground: GroundProbe::miss(ray_length),
            last_height_error: 0.0,
        }
    }

    pub fn jump_buffer_counter(&self) -> f32 {
        self.jump_buffer_counter
    }

    pub fn coyote_counter(&self) -> f32 {
        self.coyote_counter
    }

    pub fn step_disable_timer(&self) -> f32 {
        self.step_disable_timer
    }

    /// Length the next ground probe will be cast with.
    pub fn ray_length(&self) -> f32 {
        self.ray_length
    }

    /// Velocity last written to the body by the controller.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Correction that the next fixed step will remove before moving.
    pub fn correction_velocity(&self) -> Vec2 {
        self.correction_velocity_last_frame
    }

    /// Ground reading from the most recent fixed step.
    pub fn last_ground(&self) -> GroundProbe {
        self.last_ground
    }

    /// Whether the most recent fixed step found ground.
    pub fn is_grounded(&self) -> bool {
        self.last_ground.contact
    }

    /// Height error of the most recent step-up correction.
    pub fn last_height_error(&self) -> f32 {
        self.last_height_error
    }

    /// Named view of the current timers.
    pub fn jump_phase(&self) -> JumpPhase {
        JumpPhase::from_timers(
            self.jump_buffer_counter,
            self.coyote_counter,
            self.step_disable_timer,
        )
    }

    /// Per-frame input sampling.
    ///
    /// A press edge refills the jump buffer; any other frame drains it by
    /// `frame_dt`.
    pub fn sample_input(&mut self, config: &PlatformerConfig, jump_just_pressed: bool, frame_dt: f32) {
        if jump_just_pressed {
            self.jump_buffer_counter = config.jump_buffer_time;
        } else {
            self.jump_buffer_counter -= frame_dt;
        }
    }

    /// Run one fixed physics step.
    ///
    /// `horizontal` is the movement axis in `[-1, 1]` (clamped). `fixed_dt`
    /// must be positive.
    pub fn fixed_step<B: ControlledBody + ?Sized>(
        &mut self,
        config: &PlatformerConfig,
        body: &mut B,
        horizontal: f32,
        fixed_dt: f32,
    ) -> StepReport {
        self.remove_correction_velocity(body);

        let ground = self.sense_ground(config, body);

        self.apply_movement(config, body, &ground, horizontal);

        let correction = self.apply_step_up(config, body, &ground, fixed_dt);

        self.update_coyote_time(config, &ground, fixed_dt);

        let jumped = self.apply_jump(config, body);

        if self.step_disable_timer > 0.0 {
            self.step_disable_timer -= fixed_dt;
        }

        StepReport {
            ground,
            correction,
            jumped,
        }
    }

    fn write_velocity<B: ControlledBody + ?Sized>(&mut self, body: &mut B, velocity: Vec2) {
        self.velocity = velocity;
        body.set_velocity(velocity);
    }

    /// Take last tick's step-up correction back out of the body velocity.
    fn remove_correction_velocity<B: ControlledBody + ?Sized>(&mut self, body: &mut B) {
        let velocity = body.velocity() - self.correction_velocity_last_frame;
        self.write_velocity(body, velocity);
        self.correction_velocity_last_frame = Vec2::ZERO;
    }

    /// Cast the ground probe once and toggle the probe length for next tick.
    fn sense_ground<B: ControlledBody + ?Sized>(
        &mut self,
        config: &PlatformerConfig,
        body: &mut B,
    ) -> GroundProbe {
        let ray_length = self.ray_length;
        let ground = GroundProbe::from_ray(
            body.cast_ground_ray(ray_length, config.ground_layer),
            ray_length,
        );

        // Longer probe while grounded so step-up motion does not lose contact.
        self.ray_length = if ground.contact {
            config.grounded_ray_length()
        } else {
            config.airborne_ray_length()
        };

        if ground.contact != self.last_ground.contact {
            trace!(
                "ground contact {} -> {} (distance {:.3})",
                self.last_ground.contact,
                ground.contact,
                ground.distance
            );
        }
        self.last_ground = ground;

        ground
    }

    fn apply_movement<B: ControlledBody + ?Sized>(
        &mut self,
        config: &PlatformerConfig,
        body: &mut B,
        ground: &GroundProbe,
        horizontal: f32,
    ) {
        let horizontal_velocity = horizontal.clamp(-1.0, 1.0) * config.speed;

        let velocity = if ground.contact {
            Vec2::new(horizontal_velocity, 0.0)
        } else {
            Vec2::new(horizontal_velocity, body.velocity().y)
        };

        self.write_velocity(body, velocity);
    }

    /// Hover the character at `step_height` above the ground.
    ///
    /// While grounded and not cooling down, gravity is switched off and a
    /// vertical velocity closing the whole height gap in one fixed step is
    /// injected. Large height discontinuities produce a matching velocity
    /// spike.
    fn apply_step_up<B: ControlledBody + ?Sized>(
        &mut self,
        config: &PlatformerConfig,
        body: &mut B,
        ground: &GroundProbe,
        fixed_dt: f32,
    ) -> Option<Vec2> {
        if !ground.contact || self.step_disable_timer > 0.0 {
            body.set_gravity_scale(config.airborne_gravity_scale);
            return None;
        }

        body.set_gravity_scale(0.0);

        let height_error = ground.height_error(config.step_height);
        let target_velocity = height_error / fixed_dt;
        self.last_height_error = height_error;

        let correction = Vec2::new(0.0, target_velocity);
        self.correction_velocity_last_frame = correction;
        self.write_velocity(body, self.velocity + correction);

        trace!(
            "step-up: height error {:.4}, correction {:.3}",
            height_error,
            target_velocity
        );

        Some(correction)
    }

    fn update_coyote_time(&mut self, config: &PlatformerConfig, ground: &GroundProbe, fixed_dt: f32) {
        if ground.contact {
            self.coyote_counter = config.coyote_time;
        } else {
            self.coyote_counter -= fixed_dt;
        }
    }

    /// Fire the jump if a press is buffered inside the coyote window.
    fn apply_jump<B: ControlledBody + ?Sized>(
        &mut self,
        config: &PlatformerConfig,
        body: &mut B,
    ) -> bool {
        if !(self.jump_buffer_counter > 0.0 && self.coyote_counter > 0.0) {
            return false;
        }

        let velocity = body.velocity();
        self.write_velocity(body, Vec2::new(velocity.x, 0.0));
        body.apply_impulse(Vec2::Y * config.jump_force);

        // One jump per window.
        self.jump_buffer_counter = 0.0;
        self.coyote_counter = 0.0;

        self.step_disable_timer = config.step_disable_duration;
        self.ray_length = config.airborne_ray_length();

        debug!(
            "jump: impulse {:.2}, step-up disabled for {:.2}s",
            config.jump_force, config.step_disable_duration
        );

        true
    }
}
