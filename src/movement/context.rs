//! Per-tick velocity accumulator
//!
//! Built fresh at the start of every fixed tick and dropped when integration is
//! done; the borrow on the attribute table keeps it from outliving the tick.

use glam::Vec2;

use super::TurnDirection;
use crate::attributes::{AttributeDefinition, AttributeRegistry};

pub struct PhysicsTickContext<'a> {
    attributes: &'a AttributeRegistry,
    velocity: Vec2,
    desired: Vec2,
    grounded: bool,
    turn_direction: TurnDirection,
    dt: f32,
}

impl<'a> PhysicsTickContext<'a> {
    pub fn new(
        attributes: &'a AttributeRegistry,
        velocity: Vec2,
        grounded: bool,
        turn_direction: TurnDirection,
        dt: f32,
    ) -> Self {
        Self {
            attributes,
            velocity,
            desired: Vec2::ZERO,
            grounded,
            turn_direction,
            dt,
        }
    }

    /// True velocity, including impulses applied earlier this tick
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Net desired velocity collected so far
    pub fn desired_velocity(&self) -> Vec2 {
        self.desired
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn turn_direction(&self) -> TurnDirection {
        self.turn_direction
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn attribute(&self, definition: AttributeDefinition) -> f32 {
        self.attributes.value_or_default(definition)
    }

    pub fn add_desired_velocity(&mut self, velocity: Vec2) {
        self.desired += velocity;
    }

    /// Applied to the true velocity right away; the rate limiter never sees it
    pub fn add_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }

    /// Raise the desired velocity on each axis where `minimum` is non-zero so that it
    /// is at least `minimum` in that direction. Never lowers it: an axis already
    /// pointing the other way is left alone.
    pub fn add_minimum_desired_velocity(&mut self, minimum: Vec2) {
        self.desired.x = raise_toward(self.desired.x, minimum.x);
        self.desired.y = raise_toward(self.desired.y, minimum.y);
    }
}

fn raise_toward(current: f32, minimum: f32) -> f32 {
    if minimum == 0.0 || (current != 0.0 && current.signum() != minimum.signum()) {
        return current;
    }
    if current.abs() < minimum.abs() { minimum } else { current }
}
