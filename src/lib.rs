//! Creature Core - runtime control for 2D platformer creatures
//!
//! Core modules:
//! - `attributes`: Priority-ordered modifier composition over base stats
//! - `ability`: Timed ability state machines and the one-active-ability arbiter
//! - `movement`: Fixed-step velocity resolution with cooperative callbacks
//! - `health`: Damage pipeline, invulnerability and knockback
//! - `animation`: Pull-only controller and parameter queries
//! - `creature`: Frame driver wiring everything together
//! - `settings`: Data-driven tuning

pub mod ability;
pub mod animation;
pub mod attributes;
pub mod creature;
pub mod health;
pub mod movement;
pub mod settings;

pub use creature::{Creature, CreatureBuilder, CreatureEvent, CreatureInput};
pub use settings::CreatureSettings;

/// Simulation constants
pub mod consts {
    /// Fixed physics timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the driver will simulate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}
