//! Attribute identities
//!
//! The full set of tunable stats is known at compile time; creatures register
//! the subset they use and pick base values from settings.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a numeric stat. Two definitions are the same stat iff their names match.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDefinition {
    name: &'static str,
    default_base: f32,
    max: Option<f32>,
}

impl AttributeDefinition {
    pub const fn new(name: &'static str, default_base: f32) -> Self {
        Self {
            name,
            default_base,
            max: None,
        }
    }

    pub const fn with_max(mut self, max: f32) -> Self {
        self.max = Some(max);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Base value used when a creature registers this stat without an explicit one
    pub fn default_base(&self) -> f32 {
        self.default_base
    }

    /// Upper bound for consumers that clamp. Composition never applies it.
    pub fn max(&self) -> Option<f32> {
        self.max
    }
}

impl PartialEq for AttributeDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AttributeDefinition {}

impl Hash for AttributeDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Horizontal movement speed (units/s) requested by full input deflection
pub const MOVEMENT_SPEED: AttributeDefinition = AttributeDefinition::new("movement.speed", 100.0);
/// Multiplier on fall speed and gravity pull
pub const GRAVITY_SCALE: AttributeDefinition =
    AttributeDefinition::new("movement.gravity_scale", 1.0);
/// Jumps allowed before touching the ground again
pub const JUMP_COUNT: AttributeDefinition = AttributeDefinition::new("movement.jump_count", 1.0);
/// Vertical impulse of a jump (units/s)
pub const JUMP_VELOCITY: AttributeDefinition =
    AttributeDefinition::new("movement.jump_velocity", 100.0);
pub const MAX_HEALTH: AttributeDefinition = AttributeDefinition::new("health.max_health", 6.0);

/// Every stat the core knows about
pub const ALL: [AttributeDefinition; 5] = [
    MOVEMENT_SPEED,
    GRAVITY_SCALE,
    JUMP_COUNT,
    JUMP_VELOCITY,
    MAX_HEALTH,
];

/// Look up a definition by name (used when settings refer to stats by string)
pub fn by_name(name: &str) -> Option<AttributeDefinition> {
    ALL.iter().copied().find(|def| def.name == name)
}
