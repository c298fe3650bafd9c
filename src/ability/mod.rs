//! Abilities: time-boxed actions that own the creature's controls while active
//!
//! Every ability kind composes an [`AbilityStateMachine`] for its timing and
//! implements [`Ability`]; the [`AbilityArbiter`] keeps at most one of them active.

pub mod arbiter;
pub mod dash;
pub mod melee;
pub mod state_machine;

pub use arbiter::{AbilityArbiter, AbilityEvent, AbilityId, IdleTickPolicy};
pub use dash::{DashAbility, DashConfig};
pub use melee::{MeleeAbility, MeleeConfig};
pub use state_machine::{AbilityPhase, AbilityStateMachine, PhaseStep, TimedAbilityConfig};

use crate::attributes::AttributeRegistry;
use crate::health::DamageSource;
use crate::movement::{MovementState, PhysicsTickContext};

/// Creature state an ability may read or change outside the physics tick
pub struct AbilityContext<'a> {
    pub movement: &'a mut MovementState,
    pub attributes: &'a mut AttributeRegistry,
    /// Hit invulnerability left on the owner (seconds)
    pub invulnerability: f32,
}

impl AbilityContext<'_> {
    pub fn speed(&self) -> f32 {
        self.movement.velocity().length()
    }
}

/// What the arbiter should do after ticking the active ability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityTick {
    Continue,
    /// A cancel condition tripped; stop forcibly
    Cancel,
    /// The activation ran its full length
    Finished,
}

impl From<PhaseStep> for AbilityTick {
    fn from(step: PhaseStep) -> Self {
        if step.finished {
            AbilityTick::Finished
        } else if step.cancel {
            AbilityTick::Cancel
        } else {
            AbilityTick::Continue
        }
    }
}

pub trait Ability {
    fn name(&self) -> &str;

    fn phase(&self) -> AbilityPhase;

    fn is_active(&self) -> bool {
        self.phase() != AbilityPhase::Inactive
    }

    fn can_activate(&self, ctx: &AbilityContext<'_>) -> bool;

    /// Only called by the arbiter after `can_activate` passed
    fn activate(&mut self, ctx: &mut AbilityContext<'_>);

    /// Advance the active ability by one frame
    fn tick(&mut self, dt: f32, ctx: &mut AbilityContext<'_>) -> AbilityTick;

    /// True means stop now; false means refused or deferred to a later tick
    fn request_stop(&mut self) -> bool;

    /// Deactivate and start the cooldown. Only called by the arbiter.
    fn stop(&mut self, force: bool, ctx: &mut AbilityContext<'_>);

    /// Cooldown decay while not active
    fn cool_down(&mut self, dt: f32);

    /// Observation hook for inactive abilities when the idle policy allows it.
    /// Must not advance timers.
    fn idle_tick(&mut self, _dt: f32, _ctx: &AbilityContext<'_>) {}

    fn on_physics_tick(&mut self, _ctx: &mut PhysicsTickContext<'_>) {}

    /// Chance to veto or reduce incoming damage while active
    fn adjust_damage(&mut self, _source: &DamageSource, _amount: &mut i32) -> bool {
        false
    }

    /// Animation controller to use instead of the default while active
    fn animation_controller(&self) -> Option<&str> {
        None
    }

    /// One-shot animation trigger, consumed on read
    fn take_animation_trigger(&mut self) -> Option<&str> {
        None
    }
}

/// The closed set of abilities a creature can be built with
#[derive(Debug, Clone)]
pub enum AbilityKind {
    Dash(DashAbility),
    Melee(MeleeAbility),
}

impl AbilityKind {
    fn inner(&self) -> &dyn Ability {
        match self {
            AbilityKind::Dash(dash) => dash,
            AbilityKind::Melee(melee) => melee,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Ability {
        match self {
            AbilityKind::Dash(dash) => dash,
            AbilityKind::Melee(melee) => melee,
        }
    }
}

impl From<DashAbility> for AbilityKind {
    fn from(dash: DashAbility) -> Self {
        AbilityKind::Dash(dash)
    }
}

impl From<MeleeAbility> for AbilityKind {
    fn from(melee: MeleeAbility) -> Self {
        AbilityKind::Melee(melee)
    }
}

impl Ability for AbilityKind {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn phase(&self) -> AbilityPhase {
        self.inner().phase()
    }

    fn can_activate(&self, ctx: &AbilityContext<'_>) -> bool {
        self.inner().can_activate(ctx)
    }

    fn activate(&mut self, ctx: &mut AbilityContext<'_>) {
        self.inner_mut().activate(ctx)
    }

    fn tick(&mut self, dt: f32, ctx: &mut AbilityContext<'_>) -> AbilityTick {
        self.inner_mut().tick(dt, ctx)
    }

    fn request_stop(&mut self) -> bool {
        self.inner_mut().request_stop()
    }

    fn stop(&mut self, force: bool, ctx: &mut AbilityContext<'_>) {
        self.inner_mut().stop(force, ctx)
    }

    fn cool_down(&mut self, dt: f32) {
        self.inner_mut().cool_down(dt)
    }

    fn idle_tick(&mut self, dt: f32, ctx: &AbilityContext<'_>) {
        self.inner_mut().idle_tick(dt, ctx)
    }

    fn on_physics_tick(&mut self, ctx: &mut PhysicsTickContext<'_>) {
        self.inner_mut().on_physics_tick(ctx)
    }

    fn adjust_damage(&mut self, source: &DamageSource, amount: &mut i32) -> bool {
        self.inner_mut().adjust_damage(source, amount)
    }

    fn animation_controller(&self) -> Option<&str> {
        self.inner().animation_controller()
    }

    fn take_animation_trigger(&mut self) -> Option<&str> {
        self.inner_mut().take_animation_trigger()
    }
}
