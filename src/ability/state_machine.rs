//! Timed ability lifecycle
//!
//! Inactive -> Entering -> Running -> Exiting -> Inactive, with a cooldown that
//! starts when the ability stops. Phases are derived from elapsed time on every
//! query, never stored.

use serde::{Deserialize, Serialize};

/// Timing and gating shared by every timed ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimedAbilityConfig {
    /// Seconds after stopping before the ability can be used again
    pub cooldown: f32,
    pub enter_duration: f32,
    pub exit_duration: f32,
    /// Running time that must pass before a stop request is honored
    pub min_activation_time: f32,
    pub max_activation_time: f32,
    /// Cancel during the enter phase while the owner is hit-invulnerable
    pub cancel_on_damage: bool,
    /// Cancel during the enter phase when speed leaves the entry window
    pub cancel_on_move: bool,
    /// Entry speed window; 0 leaves that bound open
    pub min_velocity_to_enter: f32,
    pub max_velocity_to_enter: f32,
}

impl Default for TimedAbilityConfig {
    fn default() -> Self {
        Self {
            cooldown: 5.0,
            enter_duration: 0.25,
            exit_duration: 0.25,
            min_activation_time: 0.0,
            max_activation_time: 1.0,
            cancel_on_damage: false,
            cancel_on_move: false,
            min_velocity_to_enter: 0.0,
            max_velocity_to_enter: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityPhase {
    Inactive,
    Entering,
    Running,
    Exiting,
}

/// Outcome of advancing the machine by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStep {
    /// Phase after this frame's time was applied
    pub phase: AbilityPhase,
    /// A pending stop was honored and time jumped to the exit
    pub jumped_to_exit: bool,
    /// First frame outside the enter phase
    pub enter_ended: bool,
    /// First frame inside the exit phase
    pub exit_started: bool,
    /// The enter-phase cancel check tripped
    pub cancel: bool,
    /// Elapsed time reached this activation's max duration
    pub finished: bool,
}

impl PhaseStep {
    fn idle() -> Self {
        Self {
            phase: AbilityPhase::Inactive,
            jumped_to_exit: false,
            enter_ended: false,
            exit_started: false,
            cancel: false,
            finished: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbilityStateMachine {
    config: TimedAbilityConfig,
    active: bool,
    cooldown_remaining: f32,
    elapsed: f32,
    /// Fixed at activation
    max_duration: f32,
    stop_requested: bool,
    entering: bool,
    exiting: bool,
}

impl AbilityStateMachine {
    pub fn new(config: TimedAbilityConfig) -> Self {
        Self {
            config,
            active: false,
            cooldown_remaining: 0.0,
            elapsed: 0.0,
            max_duration: 0.0,
            stop_requested: false,
            entering: false,
            exiting: false,
        }
    }

    pub fn config(&self) -> &TimedAbilityConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown_remaining > 0.0
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    /// Time since activation, including the enter phase
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn max_duration(&self) -> f32 {
        self.max_duration
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Elapsed time at which the exit phase begins
    fn exit_start(&self) -> f32 {
        self.max_duration - (self.config.enter_duration + self.config.exit_duration)
    }

    /// Time spent past the enter phase, clamped to the running window
    pub fn running_time(&self) -> f32 {
        let window = self.exit_start().max(0.0);
        (self.elapsed - self.config.enter_duration).max(0.0).min(window)
    }

    pub fn phase(&self) -> AbilityPhase {
        if !self.active {
            AbilityPhase::Inactive
        } else if self.elapsed < self.config.enter_duration {
            AbilityPhase::Entering
        } else if self.elapsed >= self.exit_start() {
            AbilityPhase::Exiting
        } else {
            AbilityPhase::Running
        }
    }

    /// 0..1 through the enter phase
    pub fn enter_progress(&self) -> f32 {
        if self.config.enter_duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.config.enter_duration).clamp(0.0, 1.0)
    }

    /// 0..1 from the start of the exit phase to the end of the activation
    pub fn exit_progress(&self) -> f32 {
        let window = self.max_duration - self.exit_start();
        if window <= 0.0 {
            return 1.0;
        }
        ((self.elapsed - self.exit_start()) / window).clamp(0.0, 1.0)
    }

    /// Whether `speed` sits inside the configured entry window
    pub fn check_activation_velocity(&self, speed: f32) -> bool {
        let min = self.config.min_velocity_to_enter;
        let max = self.config.max_velocity_to_enter;
        if min != 0.0 && min > speed {
            return false;
        }
        if max != 0.0 && max < speed {
            return false;
        }
        true
    }

    pub fn can_activate(&self, speed: f32) -> bool {
        !self.is_on_cooldown() && self.check_activation_velocity(speed)
    }

    /// Cancel conditions evaluated while entering
    pub fn should_cancel(&self, speed: f32, invulnerability: f32) -> bool {
        if self.config.cancel_on_damage && invulnerability > 0.0 {
            return true;
        }
        self.config.cancel_on_move && !self.check_activation_velocity(speed)
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.elapsed = 0.0;
        self.stop_requested = false;
        self.entering = true;
        self.exiting = false;
        self.max_duration = self
            .config
            .min_activation_time
            .max(self.config.max_activation_time);
    }

    /// Advance an active machine by `dt` and report what the owner should react to
    pub fn advance(&mut self, dt: f32, speed: f32, invulnerability: f32) -> PhaseStep {
        if !self.active {
            return PhaseStep::idle();
        }
        self.elapsed += dt;

        let mut step = PhaseStep::idle();

        if self.stop_requested && self.running_time() >= self.config.min_activation_time {
            self.stop_requested = false;
            self.set_time_to_exit();
            step.jumped_to_exit = true;
        }

        step.phase = self.phase();
        // Edges first so a long step still reports every boundary it crossed
        if self.entering && step.phase != AbilityPhase::Entering {
            self.entering = false;
            step.enter_ended = true;
        }
        if !self.exiting && step.phase == AbilityPhase::Exiting {
            self.exiting = true;
            step.exit_started = true;
        }
        if self.elapsed >= self.max_duration {
            step.finished = true;
            return step;
        }

        if step.phase == AbilityPhase::Entering {
            step.cancel = self.should_cancel(speed, invulnerability);
        }
        step
    }

    /// Returns true when the caller should stop right away. Otherwise the request is
    /// either refused (already exiting) or deferred until the minimum time has run.
    pub fn request_stop(&mut self) -> bool {
        match self.phase() {
            AbilityPhase::Inactive => false,
            AbilityPhase::Entering => true,
            AbilityPhase::Exiting => false,
            AbilityPhase::Running => {
                self.stop_requested = true;
                false
            }
        }
    }

    /// Skip straight to the exit phase
    pub fn set_time_to_exit(&mut self) {
        self.elapsed = self.max_duration - self.config.exit_duration;
    }

    /// Deactivate and start the cooldown
    pub fn stop(&mut self) {
        self.active = false;
        self.cooldown_remaining = self.config.cooldown;
        self.elapsed = 0.0;
        self.max_duration = 0.0;
        self.stop_requested = false;
        self.entering = false;
        self.exiting = false;
    }

    /// Decay the cooldown; has no effect while active
    pub fn cool_down(&mut self, dt: f32) {
        if !self.active && self.cooldown_remaining > 0.0 {
            self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
        }
    }
}
