//! Creature tuning
//!
//! Everything a creature needs is injected from one [`CreatureSettings`] value,
//! usually deserialized from JSON. Every field has a default, so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ability::{DashConfig, IdleTickPolicy, MeleeConfig, TimedAbilityConfig};
use crate::health::HealthTuning;
use crate::movement::MovementTuning;

/// Base values for the built-in attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeBases {
    pub movement_speed: f32,
    pub gravity_scale: f32,
    pub jump_count: f32,
    pub jump_velocity: f32,
    pub max_health: f32,
}

impl Default for AttributeBases {
    fn default() -> Self {
        Self {
            movement_speed: 100.0,
            gravity_scale: 1.0,
            jump_count: 1.0,
            jump_velocity: 300.0,
            max_health: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureSettings {
    pub attributes: AttributeBases,
    pub movement: MovementTuning,
    pub health: HealthTuning,

    // === Abilities ===
    /// `None` leaves the ability out of the creature
    pub dash: Option<DashConfig>,
    pub melee: Option<MeleeConfig>,
    /// Abilities whose binding asks them to stop when released
    pub stop_on_release: Vec<String>,
    pub idle_tick_policy: IdleTickPolicy,

    // === Animation ===
    pub default_animation_controller: String,
}

impl Default for CreatureSettings {
    fn default() -> Self {
        Self {
            attributes: AttributeBases::default(),
            movement: MovementTuning::default(),
            health: HealthTuning::default(),
            dash: Some(DashConfig::default()),
            melee: Some(MeleeConfig::default()),
            stop_on_release: vec!["dash".to_string()],
            idle_tick_policy: IdleTickPolicy::Disabled,
            default_animation_controller: "default".to_string(),
        }
    }
}

impl CreatureSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON file, falling back to defaults on any failure
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Could not read settings {}: {}", path.display(), err);
                log::info!("Using default settings");
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings.validate();
                settings
            }
            Err(err) => {
                log::warn!("Invalid settings {}: {}", path.display(), err);
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Log suspicious values. Nothing is rejected; the returned list is what was logged.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let movement = &self.movement;
        for (name, rate) in [
            ("acceleration", movement.acceleration),
            ("slowdown", movement.slowdown),
            ("exponential_slowdown", movement.exponential_slowdown),
            ("vertical_acceleration", movement.vertical_acceleration),
        ] {
            if rate < 0.0 {
                warnings.push(format!("movement.{} is negative ({})", name, rate));
            }
        }
        if self.attributes.max_health <= 0.0 {
            warnings.push(format!(
                "attributes.max_health should be positive ({})",
                self.attributes.max_health
            ));
        }
        if let Some(dash) = &self.dash {
            check_timing("dash", &dash.timing, &mut warnings);
        }
        if let Some(melee) = &self.melee {
            check_timing("melee", &melee.timing, &mut warnings);
        }

        for warning in &warnings {
            log::warn!("{}", warning);
        }
        warnings
    }
}

fn check_timing(ability: &str, timing: &TimedAbilityConfig, warnings: &mut Vec<String>) {
    if timing.enter_duration < 0.0 || timing.exit_duration < 0.0 {
        warnings.push(format!("{}: negative enter/exit duration", ability));
    }
    let max_duration = timing.min_activation_time.max(timing.max_activation_time);
    if max_duration < timing.enter_duration + timing.exit_duration {
        warnings.push(format!(
            "{}: activation time {} is shorter than enter + exit ({})",
            ability,
            max_duration,
            timing.enter_duration + timing.exit_duration
        ));
    }
    if timing.min_velocity_to_enter != 0.0
        && timing.max_velocity_to_enter != 0.0
        && timing.min_velocity_to_enter > timing.max_velocity_to_enter
    {
        warnings.push(format!("{}: entry velocity window is empty", ability));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_clean() {
        assert!(CreatureSettings::default().validate().is_empty());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = CreatureSettings::from_json(
            r#"{
                "attributes": { "movement_speed": 250.0 },
                "dash": { "dash_velocity": 900.0 },
                "melee": null,
                "idle_tick_policy": "Enabled"
            }"#,
        )
        .unwrap();

        assert_eq!(settings.attributes.movement_speed, 250.0);
        assert_eq!(settings.attributes.max_health, 6.0);
        let dash = settings.dash.as_ref().unwrap();
        assert_eq!(dash.dash_velocity, 900.0);
        assert_eq!(dash.timing, DashConfig::default().timing);
        assert!(settings.melee.is_none());
        assert_eq!(settings.idle_tick_policy, IdleTickPolicy::Enabled);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = CreatureSettings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(CreatureSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(CreatureSettings::from_json("{ not json").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = CreatureSettings::load("/nonexistent/creature.json");
        assert_eq!(settings, CreatureSettings::default());
    }

    #[test]
    fn test_validate_flags_short_activation() {
        let mut settings = CreatureSettings::default();
        settings.melee = Some(MeleeConfig {
            timing: TimedAbilityConfig {
                enter_duration: 0.5,
                exit_duration: 0.5,
                min_activation_time: 0.0,
                max_activation_time: 0.6,
                ..Default::default()
            },
            ..Default::default()
        });
        let warnings = settings.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("melee"));
    }
}
