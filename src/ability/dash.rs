//! Dash: a burst of horizontal speed that ignores gravity and blocks hits

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Ability, AbilityContext, AbilityPhase, AbilityStateMachine, AbilityTick, TimedAbilityConfig};
use crate::attributes::{AttributeModifier, GRAVITY_SCALE, MOVEMENT_SPEED, ModifierId, ModifierOperation, priority};
use crate::health::DamageSource;
use crate::movement::PhysicsTickContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub timing: TimedAbilityConfig,
    /// Horizontal speed while running (units/s)
    pub dash_velocity: f32,
    pub animation_controller: Option<String>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            timing: TimedAbilityConfig {
                cooldown: 1.0,
                enter_duration: 0.1,
                exit_duration: 0.1,
                min_activation_time: 0.0,
                max_activation_time: 0.4,
                ..Default::default()
            },
            dash_velocity: 500.0,
            animation_controller: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashAbility {
    dash_velocity: f32,
    animation_controller: Option<String>,
    machine: AbilityStateMachine,
    /// Horizontal velocity when the dash started, never zero while active
    initial_vx: f32,
    gravity_modifier: ModifierId,
}

impl DashAbility {
    pub const NAME: &'static str = "dash";

    pub fn new(config: DashConfig) -> Self {
        Self {
            dash_velocity: config.dash_velocity,
            animation_controller: config.animation_controller,
            machine: AbilityStateMachine::new(config.timing),
            initial_vx: 0.0,
            gravity_modifier: Uuid::new_v4(),
        }
    }

    pub fn machine(&self) -> &AbilityStateMachine {
        &self.machine
    }

    fn direction(&self) -> f32 {
        if self.initial_vx < 0.0 { -1.0 } else { 1.0 }
    }

    /// Horizontal velocity the dash wants right now
    fn target_vx(&self, movement_speed: f32) -> f32 {
        let dash = self.direction() * self.dash_velocity;
        match self.machine.phase() {
            AbilityPhase::Inactive => 0.0,
            AbilityPhase::Entering => lerp(self.initial_vx, dash, self.machine.enter_progress()),
            AbilityPhase::Running => dash,
            AbilityPhase::Exiting => {
                let exit = self.direction() * movement_speed;
                lerp(dash, exit, self.machine.exit_progress())
            }
        }
    }
}

impl Default for DashAbility {
    fn default() -> Self {
        Self::new(DashConfig::default())
    }
}

impl Ability for DashAbility {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn phase(&self) -> AbilityPhase {
        self.machine.phase()
    }

    fn can_activate(&self, ctx: &AbilityContext<'_>) -> bool {
        self.machine.can_activate(ctx.speed())
    }

    fn activate(&mut self, ctx: &mut AbilityContext<'_>) {
        self.machine.activate();

        let vx = ctx.movement.velocity().x;
        self.initial_vx = if vx == 0.0 {
            ctx.movement.turn_direction().sign()
        } else {
            vx
        };
        ctx.movement.set_velocity(Vec2::new(self.initial_vx, 0.0));
        ctx.movement.lock_input();
        ctx.attributes.add_modifier(
            GRAVITY_SCALE,
            AttributeModifier::new(
                self.gravity_modifier,
                "dash",
                priority::ACTIVE_ABILITY,
                ModifierOperation::Overwrite,
                0.0,
            ),
        );
    }

    fn tick(&mut self, dt: f32, ctx: &mut AbilityContext<'_>) -> AbilityTick {
        self.machine.advance(dt, ctx.speed(), ctx.invulnerability).into()
    }

    fn request_stop(&mut self) -> bool {
        self.machine.request_stop()
    }

    fn stop(&mut self, _force: bool, ctx: &mut AbilityContext<'_>) {
        self.machine.stop();
        ctx.attributes.remove_modifier(GRAVITY_SCALE, self.gravity_modifier);
        ctx.movement.unlock_input();

        let speed = ctx.attributes.value_or_default(MOVEMENT_SPEED);
        let vy = ctx.movement.velocity().y;
        ctx.movement.set_velocity(Vec2::new(self.direction() * speed, vy));
    }

    fn cool_down(&mut self, dt: f32) {
        self.machine.cool_down(dt);
    }

    fn on_physics_tick(&mut self, ctx: &mut PhysicsTickContext<'_>) {
        if !self.machine.is_active() {
            return;
        }
        let target = self.target_vx(ctx.attribute(MOVEMENT_SPEED));
        ctx.add_impulse(Vec2::new(target - ctx.velocity().x, 0.0));
        ctx.add_minimum_desired_velocity(Vec2::new(target, 0.0));
    }

    fn adjust_damage(&mut self, source: &DamageSource, amount: &mut i32) -> bool {
        if self.machine.phase() == AbilityPhase::Running && source.can_be_blocked {
            *amount = 0;
            return true;
        }
        false
    }

    fn animation_controller(&self) -> Option<&str> {
        self.animation_controller.as_deref()
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeRegistry;
    use crate::movement::{MovementState, TurnDirection};

    fn attributes() -> AttributeRegistry {
        let mut attributes = AttributeRegistry::new();
        attributes.register(MOVEMENT_SPEED, 100.0);
        attributes.register_default(GRAVITY_SCALE);
        attributes
    }

    fn physics_target(dash: &mut DashAbility, movement: &MovementState, attributes: &AttributeRegistry) -> Vec2 {
        let mut ctx = PhysicsTickContext::new(
            attributes,
            movement.velocity(),
            movement.is_grounded(),
            movement.turn_direction(),
            0.01,
        );
        dash.on_physics_tick(&mut ctx);
        assert_eq!(ctx.velocity().x, ctx.desired_velocity().x);
        ctx.velocity()
    }

    #[test]
    fn test_activation_from_rest_uses_facing() {
        let mut attributes = attributes();
        let mut movement = MovementState::new();
        movement.set_velocity(Vec2::new(0.0, -30.0));
        let mut dash = DashAbility::default();

        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        assert!(dash.can_activate(&ctx));
        dash.activate(&mut ctx);

        assert_eq!(movement.velocity(), Vec2::new(1.0, 0.0));
        assert!(movement.is_input_locked());
        assert_eq!(attributes.value(GRAVITY_SCALE), Some(0.0));
        assert_eq!(dash.phase(), AbilityPhase::Entering);
    }

    #[test]
    fn test_velocity_profile_and_release() {
        let mut attributes = attributes();
        let mut movement = MovementState::new();
        movement.set_velocity(Vec2::new(-50.0, 0.0));
        let mut dash = DashAbility::default();

        {
            let mut ctx = AbilityContext {
                movement: &mut movement,
                attributes: &mut attributes,
                invulnerability: 0.0,
            };
            dash.activate(&mut ctx);
        }
        // Entering starts from the captured velocity
        assert_eq!(physics_target(&mut dash, &movement, &attributes).x, -50.0);

        {
            let mut ctx = AbilityContext {
                movement: &mut movement,
                attributes: &mut attributes,
                invulnerability: 0.0,
            };
            assert_eq!(dash.tick(0.15, &mut ctx), AbilityTick::Continue);
        }
        assert_eq!(dash.phase(), AbilityPhase::Running);
        assert_eq!(physics_target(&mut dash, &movement, &attributes).x, -500.0);

        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        dash.stop(false, &mut ctx);
        assert_eq!(movement.velocity().x, -100.0);
        assert!(!movement.is_input_locked());
        assert_eq!(attributes.value(GRAVITY_SCALE), Some(1.0));
        assert!(dash.machine().is_on_cooldown());
    }

    #[test]
    fn test_exit_blends_toward_movement_speed() {
        let mut attributes = attributes();
        let mut movement = MovementState::new();
        let mut dash = DashAbility::new(DashConfig {
            timing: TimedAbilityConfig {
                enter_duration: 0.0,
                exit_duration: 0.5,
                min_activation_time: 0.0,
                max_activation_time: 1.0,
                ..Default::default()
            },
            ..Default::default()
        });
        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        dash.activate(&mut ctx);
        dash.tick(0.75, &mut ctx);
        assert_eq!(dash.phase(), AbilityPhase::Exiting);
        // Halfway through the exit window: (500 + 100) / 2
        assert!((dash.target_vx(100.0) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_blocks_hits_only_while_running() {
        let mut attributes = attributes();
        let mut movement = MovementState::new();
        let mut dash = DashAbility::default();
        let hit = DamageSource::melee(Vec2::X);

        let mut amount = 2;
        assert!(!dash.adjust_damage(&hit, &mut amount));

        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        dash.activate(&mut ctx);
        assert!(!dash.adjust_damage(&hit, &mut amount));
        assert_eq!(amount, 2);

        dash.tick(0.15, &mut ctx);
        assert!(dash.adjust_damage(&hit, &mut amount));
        assert_eq!(amount, 0);

        let mut amount = 2;
        assert!(!dash.adjust_damage(&DamageSource::environment(), &mut amount));
        assert_eq!(amount, 2);
    }

    #[test]
    fn test_facing_left_dashes_left() {
        let mut attributes = attributes();
        let mut movement = MovementState::new();
        movement.set_turn_direction(TurnDirection::Left);

        let mut dash = DashAbility::default();
        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        dash.activate(&mut ctx);
        assert_eq!(movement.velocity().x, -1.0);
    }
}
