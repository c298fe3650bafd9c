//! Melee: plant the creature and swing once the wind-up ends

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Ability, AbilityContext, AbilityPhase, AbilityStateMachine, AbilityTick, TimedAbilityConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeConfig {
    pub timing: TimedAbilityConfig,
    /// Animation trigger raised when the wind-up (enter phase) ends
    pub attack_trigger: String,
    pub animation_controller: Option<String>,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            timing: TimedAbilityConfig {
                cooldown: 0.5,
                enter_duration: 0.15,
                exit_duration: 0.15,
                min_activation_time: 0.0,
                max_activation_time: 0.5,
                cancel_on_damage: true,
                ..Default::default()
            },
            attack_trigger: "attack".to_string(),
            animation_controller: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeleeAbility {
    attack_trigger: String,
    animation_controller: Option<String>,
    machine: AbilityStateMachine,
    trigger_pending: bool,
}

impl MeleeAbility {
    pub const NAME: &'static str = "melee";

    pub fn new(config: MeleeConfig) -> Self {
        Self {
            attack_trigger: config.attack_trigger,
            animation_controller: config.animation_controller,
            machine: AbilityStateMachine::new(config.timing),
            trigger_pending: false,
        }
    }

    pub fn machine(&self) -> &AbilityStateMachine {
        &self.machine
    }
}

impl Default for MeleeAbility {
    fn default() -> Self {
        Self::new(MeleeConfig::default())
    }
}

impl Ability for MeleeAbility {
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
        ctx.movement.set_velocity(Vec2::ZERO);
        ctx.movement.lock_input();
    }

    fn tick(&mut self, dt: f32, ctx: &mut AbilityContext<'_>) -> AbilityTick {
        let step = self.machine.advance(dt, ctx.speed(), ctx.invulnerability);
        if step.enter_ended {
            self.trigger_pending = true;
        }
        step.into()
    }

    fn request_stop(&mut self) -> bool {
        self.machine.request_stop()
    }

    fn stop(&mut self, _force: bool, ctx: &mut AbilityContext<'_>) {
        self.machine.stop();
        ctx.movement.unlock_input();
    }

    fn cool_down(&mut self, dt: f32) {
        self.machine.cool_down(dt);
    }

    fn animation_controller(&self) -> Option<&str> {
        self.animation_controller.as_deref()
    }

    fn take_animation_trigger(&mut self) -> Option<&str> {
        if std::mem::take(&mut self.trigger_pending) {
            Some(&self.attack_trigger)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeRegistry;
    use crate::movement::MovementState;

    #[test]
    fn test_swing_plants_and_triggers_once() {
        let mut attributes = AttributeRegistry::new();
        let mut movement = MovementState::new();
        movement.set_velocity(Vec2::new(80.0, 10.0));
        let mut melee = MeleeAbility::default();

        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        melee.activate(&mut ctx);
        assert_eq!(ctx.movement.velocity(), Vec2::ZERO);
        assert!(ctx.movement.is_input_locked());

        assert_eq!(melee.tick(0.1, &mut ctx), AbilityTick::Continue);
        assert_eq!(melee.take_animation_trigger(), None);

        assert_eq!(melee.tick(0.1, &mut ctx), AbilityTick::Continue);
        assert_eq!(melee.take_animation_trigger(), Some("attack"));
        assert_eq!(melee.take_animation_trigger(), None);

        melee.tick(0.1, &mut ctx);
        assert_eq!(melee.take_animation_trigger(), None);

        melee.stop(false, &mut ctx);
        assert!(!ctx.movement.is_input_locked());
    }

    #[test]
    fn test_hit_during_windup_cancels() {
        let mut attributes = AttributeRegistry::new();
        let mut movement = MovementState::new();
        let mut melee = MeleeAbility::default();
        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        melee.activate(&mut ctx);
        ctx.invulnerability = 1.0;
        assert_eq!(melee.tick(0.05, &mut ctx), AbilityTick::Cancel);
    }

    #[test]
    fn test_runs_to_completion() {
        let mut attributes = AttributeRegistry::new();
        let mut movement = MovementState::new();
        let mut melee = MeleeAbility::default();
        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        melee.activate(&mut ctx);
        assert_eq!(melee.tick(0.25, &mut ctx), AbilityTick::Continue);
        assert_eq!(melee.tick(0.25, &mut ctx), AbilityTick::Finished);
    }

    #[test]
    fn test_trigger_survives_single_long_tick() {
        let mut attributes = AttributeRegistry::new();
        let mut movement = MovementState::new();
        let mut melee = MeleeAbility::default();
        let mut ctx = AbilityContext {
            movement: &mut movement,
            attributes: &mut attributes,
            invulnerability: 0.0,
        };
        melee.activate(&mut ctx);
        assert_eq!(melee.tick(1.0, &mut ctx), AbilityTick::Finished);
        assert_eq!(melee.take_animation_trigger(), Some("attack"));
        assert_eq!(melee.take_animation_trigger(), None);
    }
}
