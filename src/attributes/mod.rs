//! Numeric gameplay stats composed from a base value and a stack of modifiers

pub mod definition;
pub mod instance;
pub mod modifier;
pub mod registry;

pub use definition::{
    AttributeDefinition, GRAVITY_SCALE, JUMP_COUNT, JUMP_VELOCITY, MAX_HEALTH, MOVEMENT_SPEED,
};
pub use instance::{AttributeChange, AttributeInstance, SubscriptionId, VALUE_CHANGE_EPSILON, compose};
pub use modifier::{AttributeModifier, ModifierId, ModifierOperation, priority};
pub use registry::AttributeRegistry;
