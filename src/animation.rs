//! Animation queries
//!
//! The core never drives an animator. It answers two questions each frame:
//! - which controller should be shown (highest-priority override, else the default)
//! - what parameters to feed it ([`AnimationParams`], with one-shot triggers consumed on read)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::movement::TurnDirection;

/// Override priorities, highest wins
pub mod controller_priority {
    pub const NORMAL: i32 = 0;
    pub const ACTIVE_ABILITY: i32 = 100;
    pub const DEATH_ANIMATION: i32 = 1000;
}

/// Trigger raised on the tick a jump is granted
pub const JUMP_TRIGGER: &str = "jump";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOverride<'a> {
    pub controller: &'a str,
    pub priority: i32,
}

impl<'a> ControllerOverride<'a> {
    pub fn new(controller: &'a str, priority: i32) -> Self {
        Self { controller, priority }
    }
}

/// Highest-priority override, earliest on ties; `default` when there is none
pub fn pick_controller<'a>(
    default: &'a str,
    overrides: impl IntoIterator<Item = ControllerOverride<'a>>,
) -> &'a str {
    let mut best: Option<ControllerOverride<'a>> = None;
    for candidate in overrides {
        if best.is_none_or(|current| candidate.priority > current.priority) {
            best = Some(candidate);
        }
    }
    best.map_or(default, |winner| winner.controller)
}

/// Remembers the controller in use so switches can be reported once
#[derive(Debug, Clone, Default)]
pub struct ControllerTracker {
    current: Option<String>,
}

impl ControllerTracker {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Returns true when `controller` differs from the one in use
    pub fn update(&mut self, controller: &str) -> bool {
        if self.current.as_deref() == Some(controller) {
            return false;
        }
        log::debug!("Animation controller -> {}", controller);
        self.current = Some(controller.to_string());
        true
    }
}

/// Pending one-shot triggers, each reported at most once
#[derive(Debug, Clone, Default)]
pub struct AnimationTriggers {
    pending: Vec<String>,
}

impl AnimationTriggers {
    pub fn fire(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.pending.contains(&name) {
            self.pending.push(name);
        }
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.iter().any(|pending| pending == name)
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}

/// Parameter snapshot for the animator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationParams {
    pub turn_direction: TurnDirection,
    pub grounded: bool,
    pub velocity: Vec2,
    /// current / max health, 0..1
    pub health_fraction: f32,
    pub triggers: Vec<String>,
}

impl AnimationParams {
    pub fn has_trigger(&self, name: &str) -> bool {
        self.triggers.iter().any(|trigger| trigger == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_controller_by_priority() {
        let none: [ControllerOverride<'_>; 0] = [];
        assert_eq!(pick_controller("default", none), "default");

        let overrides = [
            ControllerOverride::new("dash", controller_priority::ACTIVE_ABILITY),
            ControllerOverride::new("death", controller_priority::DEATH_ANIMATION),
            ControllerOverride::new("idle", controller_priority::NORMAL),
        ];
        assert_eq!(pick_controller("default", overrides), "death");
    }

    #[test]
    fn test_pick_controller_ties_keep_first() {
        let overrides = [
            ControllerOverride::new("first", controller_priority::ACTIVE_ABILITY),
            ControllerOverride::new("second", controller_priority::ACTIVE_ABILITY),
        ];
        assert_eq!(pick_controller("default", overrides), "first");
    }

    #[test]
    fn test_tracker_reports_switches_once() {
        let mut tracker = ControllerTracker::default();
        assert!(tracker.update("default"));
        assert!(!tracker.update("default"));
        assert!(tracker.update("dash"));
        assert_eq!(tracker.current(), Some("dash"));
    }

    #[test]
    fn test_triggers_are_one_shot() {
        let mut triggers = AnimationTriggers::default();
        triggers.fire(JUMP_TRIGGER);
        triggers.fire(JUMP_TRIGGER);
        triggers.fire("attack");
        assert!(triggers.is_pending("attack"));
        assert_eq!(triggers.take(), vec![JUMP_TRIGGER.to_string(), "attack".to_string()]);
        assert!(triggers.take().is_empty());
    }
}
