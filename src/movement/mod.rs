//! Creature movement: persistent velocity state plus the fixed-step resolver
//!
//! Systems never write velocity directly during a physics tick; they push
//! contributions into a [`PhysicsTickContext`] and the [`VelocityResolver`]
//! turns the sum into an actual velocity change.

pub mod context;
pub mod resolver;

pub use context::PhysicsTickContext;
pub use resolver::{MovementTuning, TickReport, VelocityResolver, approach, integrate_velocity};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Facing of the creature along X
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnDirection {
    Left,
    #[default]
    Right,
}

impl TurnDirection {
    pub fn sign(self) -> f32 {
        match self {
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
        }
    }

    /// Facing implied by a horizontal velocity, or `current` while |vx| is under the threshold
    pub fn from_velocity(vx: f32, threshold: f32, current: TurnDirection) -> TurnDirection {
        if vx.abs() < threshold {
            current
        } else if vx < 0.0 {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        }
    }
}

/// Velocity-related state that survives between ticks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementState {
    velocity: Vec2,
    grounded: bool,
    turn_direction: TurnDirection,
    /// Latest stick/keyboard deflection, each axis in [-1, 1]
    input_acceleration: Vec2,
    jump_requested: bool,
    jump_counter: u32,
    /// Number of outstanding input locks (abilities that own the controls)
    input_locks: u32,
}

impl MovementState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Overwrite velocity outright. Usable outside the physics tick.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Add velocity immediately, bypassing the rate limiter
    pub fn add_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Ground state comes from an external collision query
    pub fn set_grounded(&mut self, grounded: bool) {
        self.grounded = grounded;
    }

    pub fn turn_direction(&self) -> TurnDirection {
        self.turn_direction
    }

    pub(crate) fn set_turn_direction(&mut self, direction: TurnDirection) {
        self.turn_direction = direction;
    }

    pub fn input_acceleration(&self) -> Vec2 {
        self.input_acceleration
    }

    pub fn set_input_acceleration(&mut self, input: Vec2) {
        self.input_acceleration = input;
    }

    /// Ask for a jump on the next physics tick
    pub fn request_jump(&mut self) {
        self.jump_requested = true;
    }

    pub(crate) fn take_jump_request(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }

    pub fn jump_counter(&self) -> u32 {
        self.jump_counter
    }

    pub(crate) fn set_jump_counter(&mut self, count: u32) {
        self.jump_counter = count;
    }

    pub fn lock_input(&mut self) {
        self.input_locks += 1;
    }

    pub fn unlock_input(&mut self) {
        if self.input_locks == 0 {
            log::warn!("unlock_input called without a matching lock_input");
            return;
        }
        self.input_locks -= 1;
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_locks > 0
    }
}

/// A system that contributes to velocity every physics tick
pub trait MovementCallback {
    fn on_physics_tick(&mut self, ctx: &mut PhysicsTickContext<'_>);
}

impl<F> MovementCallback for F
where
    F: FnMut(&mut PhysicsTickContext<'_>),
{
    fn on_physics_tick(&mut self, ctx: &mut PhysicsTickContext<'_>) {
        self(ctx)
    }
}

/// Named movement callbacks, invoked in registration order
#[derive(Default)]
pub struct MovementHooks {
    hooks: Vec<(String, Box<dyn MovementCallback>)>,
}

impl std::fmt::Debug for MovementHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|(name, _)| name))
            .finish()
    }
}

impl MovementHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. A second hook under the same name is logged and ignored.
    pub fn register(&mut self, name: impl Into<String>, hook: impl MovementCallback + 'static) -> bool {
        let name = name.into();
        if self.hooks.iter().any(|(existing, _)| *existing == name) {
            log::warn!("Attempt to register duplicate movement callback {}", name);
            return false;
        }
        self.hooks.push((name, Box::new(hook)));
        true
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(existing, _)| existing != name);
        self.hooks.len() != before
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut dyn MovementCallback> {
        self.hooks.iter_mut().map(|(_, hook)| hook.as_mut() as &mut dyn MovementCallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_direction_hysteresis() {
        let mut dir = TurnDirection::Right;
        for vx in [-0.05, 0.05, -0.05, 0.05, -0.09] {
            dir = TurnDirection::from_velocity(vx, 0.1, dir);
            assert_eq!(dir, TurnDirection::Right);
        }
        dir = TurnDirection::from_velocity(-0.1, 0.1, dir);
        assert_eq!(dir, TurnDirection::Left);
    }

    #[test]
    fn test_input_lock_stack() {
        let mut state = MovementState::new();
        state.lock_input();
        state.lock_input();
        state.unlock_input();
        assert!(state.is_input_locked());
        state.unlock_input();
        assert!(!state.is_input_locked());
        // Unbalanced unlock is ignored
        state.unlock_input();
        assert!(!state.is_input_locked());
    }

    struct Wind;

    impl MovementCallback for Wind {
        fn on_physics_tick(&mut self, ctx: &mut PhysicsTickContext<'_>) {
            ctx.add_desired_velocity(Vec2::new(5.0, 0.0));
        }
    }

    #[test]
    fn test_duplicate_hook_ignored() {
        let mut hooks = MovementHooks::new();
        assert!(hooks.register("wind", Wind));
        assert!(!hooks.register("wind", Wind));
        assert_eq!(hooks.len(), 1);
        assert!(hooks.unregister("wind"));
        assert!(hooks.is_empty());
    }
}
