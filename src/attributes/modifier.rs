//! Attribute modifiers
//!
//! Immutable records; callers that add a modifier own removing it again.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-assigned modifier identity
pub type ModifierId = Uuid;

/// Common priority levels. Higher priorities are folded first.
pub mod priority {
    pub const LOW: i32 = -100;
    pub const NORMAL: i32 = 0;
    pub const GAMEPLAY_LEVEL: i32 = 1;
    pub const ACTIVE_ABILITY: i32 = 10;
    pub const HIGH: i32 = 100;
}

/// How a modifier folds into the composed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierOperation {
    /// Added to the (base-multiplied) base value
    Add,
    /// Multiplies the base value before additions
    MultiplyBase,
    /// Multiplies the final value
    MultiplyTotal,
    /// Replaces the final value outright
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeModifier {
    id: ModifierId,
    /// Diagnostic only
    description: String,
    priority: i32,
    operation: ModifierOperation,
    magnitude: f32,
}

impl AttributeModifier {
    pub fn new(
        id: ModifierId,
        description: impl Into<String>,
        priority: i32,
        operation: ModifierOperation,
        magnitude: f32,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            priority,
            operation,
            magnitude,
        }
    }

    /// Modifier with a fresh random id
    pub fn with_random_id(
        description: impl Into<String>,
        priority: i32,
        operation: ModifierOperation,
        magnitude: f32,
    ) -> Self {
        Self::new(Uuid::new_v4(), description, priority, operation, magnitude)
    }

    pub fn id(&self) -> ModifierId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn operation(&self) -> ModifierOperation {
        self.operation
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }
}
