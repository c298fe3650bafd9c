//! Per-creature attribute table

use std::collections::HashMap;

use super::definition::AttributeDefinition;
use super::instance::{AttributeChange, AttributeInstance, SubscriptionId};
use super::modifier::{AttributeModifier, ModifierId};

/// Name-keyed collection of a creature's attributes
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    attributes: HashMap<&'static str, AttributeInstance>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute with an explicit base value.
    ///
    /// Registering the same stat twice is logged and the existing instance is kept.
    pub fn register(&mut self, definition: AttributeDefinition, base_value: f32) -> &mut AttributeInstance {
        if self.attributes.contains_key(definition.name()) {
            log::warn!("Attempt to register duplicate attribute {}", definition);
        }
        self.attributes
            .entry(definition.name())
            .or_insert_with(|| AttributeInstance::new(definition, base_value))
    }

    /// Register an attribute using the definition's default base value
    pub fn register_default(&mut self, definition: AttributeDefinition) -> &mut AttributeInstance {
        self.register(definition, definition.default_base())
    }

    pub fn contains(&self, definition: AttributeDefinition) -> bool {
        self.attributes.contains_key(definition.name())
    }

    pub fn get(&self, definition: AttributeDefinition) -> Option<&AttributeInstance> {
        self.attributes.get(definition.name())
    }

    pub fn get_mut(&mut self, definition: AttributeDefinition) -> Option<&mut AttributeInstance> {
        self.attributes.get_mut(definition.name())
    }

    pub fn value(&self, definition: AttributeDefinition) -> Option<f32> {
        self.get(definition).map(AttributeInstance::value)
    }

    /// Composed value, or the definition's default when the creature never registered it
    pub fn value_or_default(&self, definition: AttributeDefinition) -> f32 {
        self.value(definition).unwrap_or_else(|| {
            log::debug!("Attribute {} not registered, using default", definition);
            definition.default_base()
        })
    }

    pub fn add_modifier(&mut self, definition: AttributeDefinition, modifier: AttributeModifier) -> bool {
        match self.get_mut(definition) {
            Some(attr) => attr.add_modifier(modifier),
            None => {
                log::warn!(
                    "Cannot add modifier '{}' to unregistered attribute {}",
                    modifier.description(),
                    definition
                );
                false
            }
        }
    }

    pub fn remove_modifier(&mut self, definition: AttributeDefinition, id: ModifierId) -> bool {
        self.get_mut(definition)
            .is_some_and(|attr| attr.remove_modifier(id))
    }

    pub fn subscribe(
        &mut self,
        definition: AttributeDefinition,
        listener: impl FnMut(&AttributeChange) + 'static,
    ) -> Option<SubscriptionId> {
        match self.get_mut(definition) {
            Some(attr) => Some(attr.subscribe(listener)),
            None => {
                log::warn!("Cannot subscribe to unregistered attribute {}", definition);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::definition::{GRAVITY_SCALE, JUMP_COUNT, MOVEMENT_SPEED};
    use crate::attributes::modifier::{ModifierOperation, priority};

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = AttributeRegistry::new();
        registry.register(MOVEMENT_SPEED, 150.0);
        registry.register(MOVEMENT_SPEED, 10.0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.value(MOVEMENT_SPEED), Some(150.0));
    }

    #[test]
    fn test_unregistered_attribute_is_noop() {
        let mut registry = AttributeRegistry::new();
        let m = AttributeModifier::with_random_id("x", 0, ModifierOperation::Add, 1.0);
        assert!(!registry.add_modifier(JUMP_COUNT, m.clone()));
        assert!(!registry.remove_modifier(JUMP_COUNT, m.id()));
        assert!(registry.subscribe(JUMP_COUNT, |_| {}).is_none());
        assert_eq!(registry.value_or_default(JUMP_COUNT), JUMP_COUNT.default_base());
    }

    #[test]
    fn test_modifier_through_registry() {
        let mut registry = AttributeRegistry::new();
        registry.register_default(GRAVITY_SCALE);
        let m = AttributeModifier::with_random_id(
            "float",
            priority::ACTIVE_ABILITY,
            ModifierOperation::Overwrite,
            0.0,
        );
        let id = m.id();
        assert!(registry.add_modifier(GRAVITY_SCALE, m));
        assert_eq!(registry.value(GRAVITY_SCALE), Some(0.0));
        assert!(registry.remove_modifier(GRAVITY_SCALE, id));
        assert_eq!(registry.value(GRAVITY_SCALE), Some(1.0));
    }
}
