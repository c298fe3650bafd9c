//! Mutual exclusion between a creature's abilities

use serde::{Deserialize, Serialize};

use super::{Ability, AbilityContext, AbilityKind, AbilityTick};
use crate::health::{DamageHandler, DamageSource};
use crate::movement::{MovementCallback, PhysicsTickContext};

/// Index of an ability inside its arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityId(usize);

impl AbilityId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether inactive abilities get an `idle_tick` every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdleTickPolicy {
    #[default]
    Disabled,
    Enabled,
}

/// Lifecycle notifications, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityEvent {
    Activated(AbilityId),
    Stopped { id: AbilityId, forced: bool },
}

/// Owns a creature's abilities and the single active slot
#[derive(Debug)]
pub struct AbilityArbiter<A: Ability = AbilityKind> {
    abilities: Vec<A>,
    active: Option<AbilityId>,
    idle_policy: IdleTickPolicy,
    events: Vec<AbilityEvent>,
}

impl<A: Ability> Default for AbilityArbiter<A> {
    fn default() -> Self {
        Self::new(IdleTickPolicy::default())
    }
}

impl<A: Ability> AbilityArbiter<A> {
    pub fn new(idle_policy: IdleTickPolicy) -> Self {
        Self {
            abilities: Vec::new(),
            active: None,
            idle_policy,
            events: Vec::new(),
        }
    }

    /// Add an ability. A second ability with the same name is logged and dropped,
    /// and the existing id is returned.
    pub fn register(&mut self, ability: A) -> AbilityId {
        if let Some(existing) = self.find(ability.name()) {
            log::warn!("Attempt to register duplicate ability {}", ability.name());
            return existing;
        }
        self.abilities.push(ability);
        AbilityId(self.abilities.len() - 1)
    }

    pub fn find(&self, name: &str) -> Option<AbilityId> {
        self.abilities
            .iter()
            .position(|ability| ability.name() == name)
            .map(AbilityId)
    }

    pub fn get(&self, id: AbilityId) -> Option<&A> {
        self.abilities.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AbilityId, &A)> {
        self.abilities
            .iter()
            .enumerate()
            .map(|(i, ability)| (AbilityId(i), ability))
    }

    pub fn active(&self) -> Option<AbilityId> {
        self.active
    }

    pub fn active_ability(&self) -> Option<&A> {
        self.active.and_then(|id| self.abilities.get(id.0))
    }

    pub fn idle_policy(&self) -> IdleTickPolicy {
        self.idle_policy
    }

    pub fn can_activate(&self, id: AbilityId, ctx: &AbilityContext<'_>) -> bool {
        self.get(id).is_some_and(|ability| ability.can_activate(ctx))
    }

    /// Activate `id`, forcibly stopping whatever was active before.
    ///
    /// Succeeds without side effects when `id` is already the active ability.
    pub fn activate(&mut self, id: AbilityId, ctx: &mut AbilityContext<'_>) -> bool {
        if self.get(id).is_none() {
            log::warn!("activate: unknown ability {:?}", id);
            return false;
        }
        if self.active == Some(id) {
            return true;
        }
        if !self.can_activate(id, ctx) {
            log::debug!("{} cannot activate right now", self.abilities[id.0].name());
            return false;
        }

        self.stop_active(true, ctx);

        let ability = &mut self.abilities[id.0];
        ability.activate(ctx);
        log::debug!("Ability {} activated", ability.name());
        self.active = Some(id);
        self.events.push(AbilityEvent::Activated(id));
        true
    }

    /// Stop whichever ability is active; no-op when none is
    pub fn stop_active(&mut self, force: bool, ctx: &mut AbilityContext<'_>) {
        let Some(id) = self.active.take() else {
            return;
        };
        let ability = &mut self.abilities[id.0];
        ability.stop(force, ctx);
        log::debug!("Ability {} stopped (force: {})", ability.name(), force);
        self.events.push(AbilityEvent::Stopped { id, forced: force });
    }

    /// Forward a stop request to the active ability, stopping it now if it agrees.
    /// Returns true when the ability was stopped synchronously.
    pub fn request_stop_active(&mut self, ctx: &mut AbilityContext<'_>) -> bool {
        let Some(id) = self.active else {
            return false;
        };
        if self.abilities[id.0].request_stop() {
            self.stop_active(false, ctx);
            true
        } else {
            false
        }
    }

    /// Per-frame update: cooldowns and optional idle hooks for inactive
    /// abilities, then the active ability's own tick
    pub fn tick(&mut self, dt: f32, ctx: &mut AbilityContext<'_>) {
        let active = self.active;
        for (i, ability) in self.abilities.iter_mut().enumerate() {
            if Some(AbilityId(i)) == active {
                continue;
            }
            ability.cool_down(dt);
            if self.idle_policy == IdleTickPolicy::Enabled {
                ability.idle_tick(dt, ctx);
            }
        }

        let Some(id) = active else {
            return;
        };
        match self.abilities[id.0].tick(dt, ctx) {
            AbilityTick::Continue => {}
            AbilityTick::Cancel => self.stop_active(true, ctx),
            AbilityTick::Finished => self.stop_active(false, ctx),
        }
    }

    /// Lifecycle events since the last drain
    pub fn drain_events(&mut self) -> Vec<AbilityEvent> {
        std::mem::take(&mut self.events)
    }

    /// One-shot animation triggers raised by any ability
    pub fn take_animation_triggers(&mut self) -> Vec<String> {
        self.abilities
            .iter_mut()
            .filter_map(|ability| ability.take_animation_trigger().map(str::to_string))
            .collect()
    }
}

impl<A: Ability> MovementCallback for AbilityArbiter<A> {
    fn on_physics_tick(&mut self, ctx: &mut PhysicsTickContext<'_>) {
        if let Some(id) = self.active {
            self.abilities[id.0].on_physics_tick(ctx);
        }
    }
}

impl<A: Ability> DamageHandler for AbilityArbiter<A> {
    fn adjust_damage(&mut self, source: &DamageSource, amount: &mut i32) -> bool {
        match self.active {
            Some(id) => self.abilities[id.0].adjust_damage(source, amount),
            None => false,
        }
    }
}
