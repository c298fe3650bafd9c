//! Fixed-step velocity resolution
//!
//! Contributions are collected in a fixed order (input, gravity, callbacks) and
//! the net desired velocity is reached through asymmetric rate limiting.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{MovementCallback, MovementState, PhysicsTickContext, TurnDirection};
use crate::attributes::{AttributeRegistry, GRAVITY_SCALE, JUMP_COUNT, JUMP_VELOCITY, MOVEMENT_SPEED};

/// Rate limits and thresholds for the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Horizontal speed-up rate (units/s²)
    pub acceleration: f32,
    /// Flat horizontal slow-down rate (units/s²)
    pub slowdown: f32,
    /// Slow-down rate per unit of velocity difference (1/s)
    pub exponential_slowdown: f32,
    /// Vertical rate in either direction (units/s²)
    pub vertical_acceleration: f32,
    /// Terminal fall speed at gravity scale 1
    pub fall_speed: f32,
    /// |vx| needed before facing may flip
    pub turn_velocity_threshold: f32,
    /// Input deflection below this is ignored
    pub input_threshold: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            acceleration: 600.0,
            slowdown: 800.0,
            exponential_slowdown: 8.0,
            vertical_acceleration: 980.0,
            fall_speed: 400.0,
            turn_velocity_threshold: 0.1,
            input_threshold: 0.01,
        }
    }
}

/// What happened during one fixed tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    pub jumped: bool,
    /// New facing, only when it actually flipped
    pub turned: Option<TurnDirection>,
}

#[derive(Debug, Clone, Default)]
pub struct VelocityResolver {
    tuning: MovementTuning,
}

impl VelocityResolver {
    pub fn new(tuning: MovementTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &MovementTuning {
        &self.tuning
    }

    /// Run one fixed physics step
    pub fn tick(
        &self,
        state: &mut MovementState,
        attributes: &AttributeRegistry,
        callbacks: &mut [&mut dyn MovementCallback],
        dt: f32,
    ) -> TickReport {
        let mut report = TickReport::default();

        // Ground contact lags a frame behind, so a rising creature has not landed yet
        if state.is_grounded() && state.velocity().y <= 0.0 {
            state.set_jump_counter(0);
        }
        let jump_requested = state.take_jump_request();

        let mut ctx = PhysicsTickContext::new(
            attributes,
            state.velocity(),
            state.is_grounded(),
            state.turn_direction(),
            dt,
        );

        // Input first
        if !state.is_input_locked() {
            let input = state.input_acceleration();
            if input.x.abs() >= self.tuning.input_threshold {
                let speed = ctx.attribute(MOVEMENT_SPEED);
                ctx.add_desired_velocity(Vec2::new(speed * input.x, 0.0));
            }
            if jump_requested && (state.jump_counter() as f32) < ctx.attribute(JUMP_COUNT) {
                state.set_jump_counter(state.jump_counter() + 1);
                ctx.add_impulse(Vec2::new(0.0, ctx.attribute(JUMP_VELOCITY)));
                report.jumped = true;
            }
        }

        // Gravity
        if !state.is_grounded() {
            let gravity_scale = ctx.attribute(GRAVITY_SCALE);
            ctx.add_desired_velocity(Vec2::new(0.0, -self.tuning.fall_speed * gravity_scale));
        }

        for callback in callbacks.iter_mut() {
            callback.on_physics_tick(&mut ctx);
        }

        let velocity = integrate_velocity(ctx.velocity(), ctx.desired_velocity(), &self.tuning, dt);
        state.set_velocity(velocity);

        let current = state.turn_direction();
        let facing = TurnDirection::from_velocity(velocity.x, self.tuning.turn_velocity_threshold, current);
        if facing != current {
            state.set_turn_direction(facing);
            report.turned = Some(facing);
        }

        report
    }
}

/// Move `velocity` toward `desired` under the tuning's rate limits
pub fn integrate_velocity(velocity: Vec2, desired: Vec2, tuning: &MovementTuning, dt: f32) -> Vec2 {
    let decelerating = velocity.x != 0.0
        && (desired.x * velocity.x < 0.0 || desired.x.abs() < velocity.x.abs());
    let horizontal_rate = if decelerating {
        let difference = (desired.x - velocity.x).abs();
        tuning.slowdown.max(difference * tuning.exponential_slowdown)
    } else {
        tuning.acceleration
    };

    Vec2::new(
        approach(velocity.x, desired.x, horizontal_rate * dt),
        approach(velocity.y, desired.y, tuning.vertical_acceleration * dt),
    )
}

/// Step from `current` toward `target` by at most `max_step`
pub fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    let difference = target - current;
    if difference.abs() <= max_step {
        target
    } else {
        current + max_step.max(0.0).copysign(difference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeModifier, ModifierOperation, priority};

    fn tuning() -> MovementTuning {
        MovementTuning {
            acceleration: 20.0,
            slowdown: 100.0,
            exponential_slowdown: 0.0,
            vertical_acceleration: 50.0,
            fall_speed: 200.0,
            turn_velocity_threshold: 0.1,
            input_threshold: 0.01,
        }
    }

    fn attributes() -> AttributeRegistry {
        let mut attributes = AttributeRegistry::new();
        attributes.register(MOVEMENT_SPEED, 100.0);
        attributes.register_default(GRAVITY_SCALE);
        attributes.register_default(JUMP_COUNT);
        attributes.register(JUMP_VELOCITY, 300.0);
        attributes
    }

    struct Push(Vec2);

    impl MovementCallback for Push {
        fn on_physics_tick(&mut self, ctx: &mut PhysicsTickContext<'_>) {
            ctx.add_desired_velocity(self.0);
        }
    }

    #[test]
    fn test_acceleration_is_rate_limited() {
        let v = integrate_velocity(Vec2::ZERO, Vec2::new(100.0, 0.0), &tuning(), 1.0);
        assert_eq!(v.x, 20.0);
    }

    #[test]
    fn test_deceleration_uses_slowdown() {
        let v = integrate_velocity(Vec2::new(20.0, 0.0), Vec2::ZERO, &tuning(), 1.0);
        assert_eq!(v.x, 0.0);

        let v = integrate_velocity(Vec2::new(500.0, 0.0), Vec2::ZERO, &tuning(), 1.0);
        assert_eq!(v.x, 400.0);
    }

    #[test]
    fn test_exponential_slowdown_wins_for_large_gaps() {
        let tuning = MovementTuning {
            exponential_slowdown: 2.0,
            ..tuning()
        };
        // gap 500 * 2.0 = 1000/s beats the flat 100/s
        let v = integrate_velocity(Vec2::new(500.0, 0.0), Vec2::ZERO, &tuning, 0.1);
        assert!((v.x - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_reversal_counts_as_deceleration() {
        let v = integrate_velocity(Vec2::new(10.0, 0.0), Vec2::new(-10.0, 0.0), &tuning(), 0.1);
        // slowdown 100/s * 0.1 = 10
        assert!(v.x.abs() < 1e-5);
    }

    #[test]
    fn test_vertical_uses_flat_rate_both_ways() {
        let up = integrate_velocity(Vec2::ZERO, Vec2::new(0.0, 100.0), &tuning(), 1.0);
        let down = integrate_velocity(Vec2::new(0.0, 100.0), Vec2::ZERO, &tuning(), 1.0);
        assert_eq!(up.y, 50.0);
        assert_eq!(down.y, 50.0);
    }

    #[test]
    fn test_input_and_callbacks_accumulate() {
        let resolver = VelocityResolver::new(MovementTuning {
            acceleration: 10_000.0,
            ..tuning()
        });
        let attributes = attributes();
        let mut state = MovementState::new();
        state.set_grounded(true);
        state.set_input_acceleration(Vec2::new(0.5, 0.0));
        let mut push = Push(Vec2::new(25.0, 0.0));
        let mut callbacks: [&mut dyn MovementCallback; 1] = [&mut push];
        resolver.tick(&mut state, &attributes, &mut callbacks, 0.1);
        assert!((state.velocity().x - 75.0).abs() < 1e-3);
    }

    #[test]
    fn test_input_ignored_while_locked() {
        let resolver = VelocityResolver::new(tuning());
        let attributes = attributes();
        let mut state = MovementState::new();
        state.set_grounded(true);
        state.set_input_acceleration(Vec2::new(1.0, 0.0));
        state.lock_input();
        resolver.tick(&mut state, &attributes, &mut [], 0.1);
        assert_eq!(state.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_gravity_only_when_airborne() {
        let resolver = VelocityResolver::new(tuning());
        let attributes = attributes();
        let mut state = MovementState::new();
        state.set_grounded(true);
        resolver.tick(&mut state, &attributes, &mut [], 0.1);
        assert_eq!(state.velocity().y, 0.0);

        state.set_grounded(false);
        resolver.tick(&mut state, &attributes, &mut [], 0.1);
        assert!((state.velocity().y + 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_gravity_scale_attribute() {
        let resolver = VelocityResolver::new(tuning());
        let mut attributes = attributes();
        attributes.add_modifier(
            GRAVITY_SCALE,
            AttributeModifier::with_random_id("float", priority::ACTIVE_ABILITY, ModifierOperation::Overwrite, 0.0),
        );
        let mut state = MovementState::new();
        state.set_grounded(false);
        resolver.tick(&mut state, &attributes, &mut [], 0.1);
        assert_eq!(state.velocity().y, 0.0);
    }

    #[test]
    fn test_jump_consumes_counter_until_grounded() {
        let resolver = VelocityResolver::new(tuning());
        let attributes = attributes();
        let mut state = MovementState::new();
        state.set_grounded(true);
        state.request_jump();
        let report = resolver.tick(&mut state, &attributes, &mut [], 0.01);
        assert!(report.jumped);
        // Impulse lands in full, then vertical rate pulls it back by 50 * 0.01
        assert!((state.velocity().y - 299.5).abs() < 1e-3);

        state.set_grounded(false);
        state.request_jump();
        let report = resolver.tick(&mut state, &attributes, &mut [], 0.01);
        assert!(!report.jumped);

        // Landing
        state.set_velocity(Vec2::ZERO);
        state.set_grounded(true);
        state.request_jump();
        let report = resolver.tick(&mut state, &attributes, &mut [], 0.01);
        assert!(report.jumped);
    }

    #[test]
    fn test_rising_while_grounded_keeps_counter() {
        let resolver = VelocityResolver::new(tuning());
        let attributes = attributes();
        let mut state = MovementState::new();
        state.set_grounded(true);
        state.request_jump();
        assert!(resolver.tick(&mut state, &attributes, &mut [], 0.01).jumped);

        // Ground flag is stale for the rest of the frame
        let report = resolver.tick(&mut state, &attributes, &mut [], 0.01);
        assert!(!report.jumped);
        assert_eq!(state.jump_counter(), 1);

        state.set_grounded(false);
        state.request_jump();
        assert!(!resolver.tick(&mut state, &attributes, &mut [], 0.01).jumped);
        assert_eq!(state.jump_counter(), 1);
    }

    #[test]
    fn test_turn_direction_flips_only_past_threshold() {
        let resolver = VelocityResolver::new(tuning());
        let attributes = attributes();
        let mut state = MovementState::new();
        state.set_grounded(true);

        for vx in [-0.05, 0.05, -0.05, 0.05] {
            state.set_velocity(Vec2::new(vx, 0.0));
            let mut hold = Push(Vec2::new(vx, 0.0));
            let mut callbacks: [&mut dyn MovementCallback; 1] = [&mut hold];
            let report = resolver.tick(&mut state, &attributes, &mut callbacks, 0.01);
            assert_eq!(report.turned, None);
            assert_eq!(state.turn_direction(), TurnDirection::Right);
        }

        state.set_velocity(Vec2::new(-5.0, 0.0));
        let mut hold = Push(Vec2::new(-5.0, 0.0));
        let mut callbacks: [&mut dyn MovementCallback; 1] = [&mut hold];
        let report = resolver.tick(&mut state, &attributes, &mut callbacks, 0.01);
        assert_eq!(report.turned, Some(TurnDirection::Left));
        assert_eq!(state.turn_direction(), TurnDirection::Left);
    }
}
