//! A single attribute on a single creature
//!
//! The composed value is recomputed eagerly on every add/remove so reads are free
//! and always consistent with the current modifier set.

use std::collections::HashMap;
use std::fmt;

use super::definition::AttributeDefinition;
use super::modifier::{AttributeModifier, ModifierId, ModifierOperation};

/// Changes smaller than this are treated as float noise and not announced
pub const VALUE_CHANGE_EPSILON: f32 = 1e-3;

/// Payload handed to change listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeChange {
    pub definition: AttributeDefinition,
    pub old_value: f32,
    pub new_value: f32,
}

/// Handle returned by [`AttributeInstance::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&AttributeChange)>;

pub struct AttributeInstance {
    definition: AttributeDefinition,
    base_value: f32,
    value: f32,
    modifiers: HashMap<ModifierId, AttributeModifier>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for AttributeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeInstance")
            .field("definition", &self.definition)
            .field("base_value", &self.base_value)
            .field("value", &self.value)
            .field("modifiers", &self.modifiers.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AttributeInstance {
    pub fn new(definition: AttributeDefinition, base_value: f32) -> Self {
        Self {
            definition,
            base_value,
            value: base_value,
            modifiers: HashMap::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn definition(&self) -> AttributeDefinition {
        self.definition
    }

    pub fn base_value(&self) -> f32 {
        self.base_value
    }

    /// Current composed value
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn has_modifier(&self, id: ModifierId) -> bool {
        self.modifiers.contains_key(&id)
    }

    pub fn modifiers(&self) -> impl Iterator<Item = &AttributeModifier> {
        self.modifiers.values()
    }

    /// Add a modifier. Returns false (and changes nothing) if its id is already present.
    pub fn add_modifier(&mut self, modifier: AttributeModifier) -> bool {
        if self.modifiers.contains_key(&modifier.id()) {
            log::debug!(
                "{}: modifier {} ({}) already applied",
                self.definition,
                modifier.id(),
                modifier.description()
            );
            return false;
        }
        self.modifiers.insert(modifier.id(), modifier);
        self.recompute();
        true
    }

    /// Remove a modifier by id. Returns false if it was not present.
    pub fn remove_modifier(&mut self, id: ModifierId) -> bool {
        if self.modifiers.remove(&id).is_none() {
            log::debug!("{}: no modifier {} to remove", self.definition, id);
            return false;
        }
        self.recompute();
        true
    }

    /// Register a listener fired whenever an add/remove moves the composed value
    /// by more than [`VALUE_CHANGE_EPSILON`]
    pub fn subscribe(&mut self, listener: impl FnMut(&AttributeChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn recompute(&mut self) {
        let old_value = self.value;
        self.value = compose(self.base_value, self.modifiers.values());
        if (self.value - old_value).abs() <= VALUE_CHANGE_EPSILON {
            return;
        }
        let change = AttributeChange {
            definition: self.definition,
            old_value,
            new_value: self.value,
        };
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }
}

/// Fold a modifier set over a base value.
///
/// Modifiers are walked by descending priority (ties broken by id so the walk is
/// independent of insertion order). The result is the last Overwrite seen, or
/// `total_mul * (base_mul * base + added)` when there is none.
///
/// Because the walk is descending, the *lowest*-priority Overwrite ends up winning.
pub fn compose<'a>(base: f32, modifiers: impl IntoIterator<Item = &'a AttributeModifier>) -> f32 {
    let mut sorted: Vec<&AttributeModifier> = modifiers.into_iter().collect();
    sorted.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| a.id().cmp(&b.id()))
    });

    let mut added = 0.0;
    let mut base_mul = 1.0;
    let mut total_mul = 1.0;
    let mut overwrite = None;

    for modifier in sorted {
        match modifier.operation() {
            ModifierOperation::Add => added += modifier.magnitude(),
            ModifierOperation::MultiplyBase => base_mul *= modifier.magnitude(),
            ModifierOperation::MultiplyTotal => total_mul *= modifier.magnitude(),
            ModifierOperation::Overwrite => overwrite = Some(modifier.magnitude()),
        }
    }

    overwrite.unwrap_or(total_mul * (base_mul * base + added))
}
