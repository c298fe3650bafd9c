//! A complete creature: attributes, movement, abilities and health wired together
//!
//! Frame order is fixed: input, then the variable-step ability/health tick, then
//! zero or more fixed physics ticks, then derived state (facing, animation).

use glam::Vec2;

use crate::ability::{
    Ability, AbilityArbiter, AbilityContext, AbilityEvent, AbilityKind, DashAbility, MeleeAbility,
};
use crate::animation::{
    AnimationParams, AnimationTriggers, ControllerOverride, ControllerTracker, JUMP_TRIGGER, controller_priority,
    pick_controller,
};
use crate::attributes::{
    AttributeDefinition, AttributeRegistry, GRAVITY_SCALE, JUMP_COUNT, JUMP_VELOCITY, MAX_HEALTH, MOVEMENT_SPEED,
};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::health::{DamageHandler, DamageOutcome, DamageSource, Health};
use crate::movement::{MovementCallback, MovementHooks, MovementState, TurnDirection, VelocityResolver};
use crate::settings::CreatureSettings;

/// Input sampled for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatureInput {
    /// Stick/keyboard deflection, each axis in [-1, 1]
    pub move_axis: Vec2,
    /// Jump pressed this frame
    pub jump: bool,
    /// Ability bindings pressed this frame
    pub pressed: Vec<String>,
    /// Ability bindings released this frame
    pub released: Vec<String>,
}

impl CreatureInput {
    pub fn moving(x: f32) -> Self {
        Self {
            move_axis: Vec2::new(x, 0.0),
            ..Default::default()
        }
    }

    pub fn press(mut self, ability: impl Into<String>) -> Self {
        self.pressed.push(ability.into());
        self
    }

    pub fn release(mut self, ability: impl Into<String>) -> Self {
        self.released.push(ability.into());
        self
    }

    pub fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }
}

/// Things that happened since the last drain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreatureEvent {
    Ability(AbilityEvent),
    Jumped,
    Turned(TurnDirection),
    RanOutOfHealth,
}

type TurnListener = Box<dyn FnMut(TurnDirection)>;

pub struct Creature {
    attributes: AttributeRegistry,
    movement: MovementState,
    resolver: VelocityResolver,
    hooks: MovementHooks,
    arbiter: AbilityArbiter,
    health: Health,
    stop_on_release: Vec<String>,
    default_controller: String,
    controller: ControllerTracker,
    triggers: AnimationTriggers,
    turn_listeners: Vec<TurnListener>,
    events: Vec<CreatureEvent>,
    accumulator: f32,
    input_enabled: bool,
}

impl Creature {
    pub fn builder(settings: CreatureSettings) -> CreatureBuilder {
        CreatureBuilder::new(settings)
    }

    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attributes
    }

    /// For external modifier sources such as buffs or level effects
    pub fn attributes_mut(&mut self) -> &mut AttributeRegistry {
        &mut self.attributes
    }

    pub fn movement(&self) -> &MovementState {
        &self.movement
    }

    pub fn velocity(&self) -> Vec2 {
        self.movement.velocity()
    }

    pub fn turn_direction(&self) -> TurnDirection {
        self.movement.turn_direction()
    }

    /// Ground contact from collision detection, fed in before `update`
    pub fn set_grounded(&mut self, grounded: bool) {
        self.movement.set_grounded(grounded);
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.movement.set_velocity(velocity);
    }

    pub fn add_impulse(&mut self, impulse: Vec2) {
        self.movement.add_impulse(impulse);
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn arbiter(&self) -> &AbilityArbiter {
        &self.arbiter
    }

    pub fn active_ability(&self) -> Option<&str> {
        self.arbiter.active_ability().map(|ability| ability.name())
    }

    pub fn register_movement_hook(&mut self, name: impl Into<String>, hook: impl MovementCallback + 'static) -> bool {
        self.hooks.register(name, hook)
    }

    pub fn unregister_movement_hook(&mut self, name: &str) -> bool {
        self.hooks.unregister(name)
    }

    /// Called with the new facing on every actual flip
    pub fn on_turn(&mut self, listener: impl FnMut(TurnDirection) + 'static) {
        self.turn_listeners.push(Box::new(listener));
    }

    pub fn activate_ability(&mut self, name: &str) -> bool {
        let Some(id) = self.arbiter.find(name) else {
            log::debug!("No ability named {}", name);
            return false;
        };
        let mut ctx = ability_context(&mut self.movement, &mut self.attributes, &self.health);
        let activated = self.arbiter.activate(id, &mut ctx);
        self.collect_ability_events();
        activated
    }

    pub fn request_stop_ability(&mut self) -> bool {
        let mut ctx = ability_context(&mut self.movement, &mut self.attributes, &self.health);
        let stopped = self.arbiter.request_stop_active(&mut ctx);
        self.collect_ability_events();
        stopped
    }

    pub fn stop_active_ability(&mut self, force: bool) {
        let mut ctx = ability_context(&mut self.movement, &mut self.attributes, &self.health);
        self.arbiter.stop_active(force, &mut ctx);
        self.collect_ability_events();
    }

    /// Run one engine frame. Returns how many fixed physics ticks ran.
    pub fn update(&mut self, frame_dt: f32, input: &CreatureInput) -> u32 {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);

        self.apply_input(input);

        // Variable-step tick
        {
            let mut ctx = ability_context(&mut self.movement, &mut self.attributes, &self.health);
            self.arbiter.tick(dt, &mut ctx);
        }
        self.health.tick(dt, &self.attributes);
        for trigger in self.arbiter.take_animation_triggers() {
            self.triggers.fire(trigger);
        }
        self.collect_ability_events();

        // Fixed-step physics
        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.fixed_tick(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS && self.accumulator >= SIM_DT {
            // Drop the backlog so physics never runs ahead of ability time
            log::debug!("Dropping {:.3}s of physics backlog", self.accumulator);
            self.accumulator %= SIM_DT;
        }

        let controller = self.animation_controller().to_string();
        self.controller.update(&controller);
        substeps
    }

    /// One physics step: collect contributions, integrate, update facing
    pub fn fixed_tick(&mut self, dt: f32) {
        let mut callbacks: Vec<&mut dyn MovementCallback> = Vec::with_capacity(self.hooks.len() + 1);
        callbacks.push(&mut self.arbiter);
        for hook in self.hooks.iter_mut() {
            callbacks.push(hook);
        }
        let report = self.resolver.tick(&mut self.movement, &self.attributes, &mut callbacks, dt);

        if report.jumped {
            self.triggers.fire(JUMP_TRIGGER);
            self.events.push(CreatureEvent::Jumped);
        }
        if let Some(direction) = report.turned {
            for listener in &mut self.turn_listeners {
                listener(direction);
            }
            self.events.push(CreatureEvent::Turned(direction));
        }
    }

    /// Run a hit through the damage pipeline
    pub fn apply_damage(&mut self, source: &DamageSource, amount: i32) -> DamageOutcome {
        let outcome = {
            let mut handlers: [&mut dyn DamageHandler; 1] = [&mut self.arbiter];
            self.health.attack_from(source, amount, &self.attributes, &mut handlers)
        };

        if let DamageOutcome::Applied { knockback, ran_out, .. } = outcome {
            if let Some(knockback) = knockback {
                self.movement.add_impulse(knockback);
            }
            if ran_out {
                self.on_ran_out_of_health();
            }
        }
        outcome
    }

    pub fn heal(&mut self, amount: i32) -> bool {
        let was_out = self.health.ran_out_of_health();
        let healed = self.health.heal(amount, &self.attributes);
        if healed && was_out {
            log::info!("Creature revived");
            self.input_enabled = true;
        }
        healed
    }

    /// Controller the animator should be showing right now
    pub fn animation_controller(&self) -> &str {
        let ability = self
            .arbiter
            .active_ability()
            .and_then(|ability| ability.animation_controller())
            .map(|controller| ControllerOverride::new(controller, controller_priority::ACTIVE_ABILITY));
        let death = self
            .health
            .tuning()
            .death_animation_controller
            .as_deref()
            .filter(|_| self.health.ran_out_of_health())
            .map(|controller| ControllerOverride::new(controller, controller_priority::DEATH_ANIMATION));

        pick_controller(&self.default_controller, ability.into_iter().chain(death))
    }

    /// Parameter snapshot; one-shot triggers are consumed
    pub fn animation_params(&mut self) -> AnimationParams {
        AnimationParams {
            turn_direction: self.movement.turn_direction(),
            grounded: self.movement.is_grounded(),
            velocity: self.movement.velocity(),
            health_fraction: self.health.fraction(&self.attributes),
            triggers: self.triggers.take(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<CreatureEvent> {
        std::mem::take(&mut self.events)
    }

    fn apply_input(&mut self, input: &CreatureInput) {
        if !self.input_enabled {
            self.movement.set_input_acceleration(Vec2::ZERO);
            return;
        }

        self.movement
            .set_input_acceleration(input.move_axis.clamp(Vec2::splat(-1.0), Vec2::splat(1.0)));
        if input.jump {
            self.movement.request_jump();
        }

        for name in &input.released {
            if !self.stop_on_release.contains(name) || self.active_ability() != Some(name.as_str()) {
                continue;
            }
            let mut ctx = ability_context(&mut self.movement, &mut self.attributes, &self.health);
            self.arbiter.request_stop_active(&mut ctx);
        }
        for name in &input.pressed {
            let Some(id) = self.arbiter.find(name) else {
                log::debug!("Input pressed unknown ability {}", name);
                continue;
            };
            let mut ctx = ability_context(&mut self.movement, &mut self.attributes, &self.health);
            self.arbiter.activate(id, &mut ctx);
        }
    }

    fn on_ran_out_of_health(&mut self) {
        let mut ctx = ability_context(&mut self.movement, &mut self.attributes, &self.health);
        self.arbiter.stop_active(true, &mut ctx);
        self.collect_ability_events();

        self.input_enabled = false;
        self.movement.set_input_acceleration(Vec2::ZERO);
        self.events.push(CreatureEvent::RanOutOfHealth);
    }

    fn collect_ability_events(&mut self) {
        self.events
            .extend(self.arbiter.drain_events().into_iter().map(CreatureEvent::Ability));
    }
}

fn ability_context<'a>(
    movement: &'a mut MovementState,
    attributes: &'a mut AttributeRegistry,
    health: &Health,
) -> AbilityContext<'a> {
    AbilityContext {
        movement,
        attributes,
        invulnerability: health.invulnerability_remaining(),
    }
}

/// Wires a [`Creature`] from settings plus any extra pieces
pub struct CreatureBuilder {
    settings: CreatureSettings,
    attributes: Vec<(AttributeDefinition, f32)>,
    abilities: Vec<AbilityKind>,
    hooks: MovementHooks,
}

impl CreatureBuilder {
    pub fn new(settings: CreatureSettings) -> Self {
        Self {
            settings,
            attributes: Vec::new(),
            abilities: Vec::new(),
            hooks: MovementHooks::new(),
        }
    }

    /// Extra attribute beyond the built-in set
    pub fn with_attribute(mut self, definition: AttributeDefinition, base_value: f32) -> Self {
        self.attributes.push((definition, base_value));
        self
    }

    pub fn with_ability(mut self, ability: impl Into<AbilityKind>) -> Self {
        self.abilities.push(ability.into());
        self
    }

    pub fn with_movement_hook(mut self, name: impl Into<String>, hook: impl MovementCallback + 'static) -> Self {
        self.hooks.register(name, hook);
        self
    }

    pub fn build(self) -> Creature {
        let settings = self.settings;

        let mut attributes = AttributeRegistry::new();
        let bases = &settings.attributes;
        attributes.register(MOVEMENT_SPEED, bases.movement_speed);
        attributes.register(GRAVITY_SCALE, bases.gravity_scale);
        attributes.register(JUMP_COUNT, bases.jump_count);
        attributes.register(JUMP_VELOCITY, bases.jump_velocity);
        attributes.register(MAX_HEALTH, bases.max_health);
        for (definition, base_value) in self.attributes {
            attributes.register(definition, base_value);
        }

        let mut arbiter = AbilityArbiter::new(settings.idle_tick_policy);
        if let Some(dash) = settings.dash {
            arbiter.register(DashAbility::new(dash).into());
        }
        if let Some(melee) = settings.melee {
            arbiter.register(MeleeAbility::new(melee).into());
        }
        for ability in self.abilities {
            arbiter.register(ability);
        }

        let health = Health::new(settings.health, &attributes);
        log::debug!(
            "Built creature with {} attributes and {} abilities",
            attributes.len(),
            arbiter.len()
        );

        Creature {
            attributes,
            movement: MovementState::new(),
            resolver: VelocityResolver::new(settings.movement),
            hooks: self.hooks,
            arbiter,
            health,
            stop_on_release: settings.stop_on_release,
            default_controller: settings.default_animation_controller,
            controller: ControllerTracker::default(),
            triggers: AnimationTriggers::default(),
            turn_listeners: Vec::new(),
            events: Vec::new(),
            accumulator: 0.0,
            input_enabled: true,
        }
    }
}
