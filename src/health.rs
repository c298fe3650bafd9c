//! Creature health and the damage pipeline
//!
//! Running out of health is a state, not an error: the owner reacts to
//! [`DamageOutcome::Applied`] with `ran_out` set.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeRegistry, MAX_HEALTH};

/// Where a hit came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageSource {
    pub name: String,
    /// Blockable hits respect invulnerability and ability blocks
    pub can_be_blocked: bool,
    /// Direction from the attacker toward the victim, used for knockback
    pub direction: Option<Vec2>,
}

impl DamageSource {
    pub fn melee(direction: Vec2) -> Self {
        Self {
            name: "melee".to_string(),
            can_be_blocked: true,
            direction: Some(direction),
        }
    }

    pub fn environment() -> Self {
        Self {
            name: "environment".to_string(),
            can_be_blocked: false,
            direction: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthTuning {
    /// Seconds of invulnerability granted after taking damage
    pub invulnerability_on_hit: f32,
    /// Impulse magnitude applied along the hit direction
    pub knockback_strength: f32,
    /// Animation controller shown once health runs out
    pub death_animation_controller: Option<String>,
}

impl Default for HealthTuning {
    fn default() -> Self {
        Self {
            invulnerability_on_hit: 1.0,
            knockback_strength: 0.0,
            death_animation_controller: None,
        }
    }
}

/// Gets a chance to veto or reduce damage before it is applied
pub trait DamageHandler {
    /// Returns true when the handler dealt with the hit; later handlers are skipped
    fn adjust_damage(&mut self, source: &DamageSource, amount: &mut i32) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Refused before any handler saw it (invulnerable)
    Ignored,
    /// A handler reduced the damage to nothing
    Absorbed,
    Applied {
        amount: i32,
        knockback: Option<Vec2>,
        /// This hit took the creature to zero
        ran_out: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    tuning: HealthTuning,
    current: i32,
    ran_out: bool,
    invulnerability: f32,
}

impl Health {
    pub fn new(tuning: HealthTuning, attributes: &AttributeRegistry) -> Self {
        let current = max_health(attributes);
        Self {
            tuning,
            current,
            ran_out: current == 0,
            invulnerability: 0.0,
        }
    }

    pub fn tuning(&self) -> &HealthTuning {
        &self.tuning
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn ran_out_of_health(&self) -> bool {
        self.ran_out
    }

    pub fn invulnerability_remaining(&self) -> f32 {
        self.invulnerability
    }

    /// current / max, guarded against a zero max
    pub fn fraction(&self, attributes: &AttributeRegistry) -> f32 {
        self.current as f32 / (max_health(attributes) as f32).max(0.1)
    }

    pub fn can_take_damage(&self, source: &DamageSource) -> bool {
        !(self.invulnerability > 0.0 && source.can_be_blocked)
    }

    pub fn attack_from(
        &mut self,
        source: &DamageSource,
        amount: i32,
        attributes: &AttributeRegistry,
        handlers: &mut [&mut dyn DamageHandler],
    ) -> DamageOutcome {
        if !self.can_take_damage(source) {
            log::debug!("Ignoring {} hit while invulnerable", source.name);
            return DamageOutcome::Ignored;
        }

        let mut amount = amount.min(self.current);
        for handler in handlers.iter_mut() {
            if handler.adjust_damage(source, &mut amount) {
                break;
            }
        }
        if amount <= 0 {
            return DamageOutcome::Absorbed;
        }

        let ran_out = self.set_health(self.current - amount, attributes);
        self.invulnerability = self.tuning.invulnerability_on_hit;

        let knockback = source
            .direction
            .filter(|_| self.tuning.knockback_strength != 0.0)
            .map(|dir| dir.normalize_or_zero() * self.tuning.knockback_strength);

        DamageOutcome::Applied {
            amount,
            knockback,
            ran_out,
        }
    }

    /// Restore health; clears the out-of-health state
    pub fn heal(&mut self, amount: i32, attributes: &AttributeRegistry) -> bool {
        if amount <= 0 {
            log::warn!("heal called with non-positive amount {}", amount);
            return false;
        }
        self.ran_out = false;
        self.set_health(self.current + amount, attributes);
        true
    }

    /// Decay invulnerability and follow max-health changes
    pub fn tick(&mut self, dt: f32, attributes: &AttributeRegistry) {
        if self.invulnerability > 0.0 {
            self.invulnerability = (self.invulnerability - dt).max(0.0);
        }
        if self.current > max_health(attributes) {
            self.set_health(self.current, attributes);
        }
    }

    /// Returns true the moment health first reaches zero
    fn set_health(&mut self, health: i32, attributes: &AttributeRegistry) -> bool {
        self.current = health.clamp(0, max_health(attributes));
        if self.current == 0 && !self.ran_out {
            self.ran_out = true;
            log::info!("Creature ran out of health");
            return true;
        }
        false
    }
}

fn max_health(attributes: &AttributeRegistry) -> i32 {
    (attributes.value_or_default(MAX_HEALTH) as i32).max(0)
}
