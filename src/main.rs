//! Creature Core headless demo
//!
//! Runs one creature on a flat floor, driven by a seeded random input source,
//! and logs what it does. `RUST_LOG=info` (or `debug`) shows the output.
//!
//! Usage: `creature-sim [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
use creature_core::{Creature, CreatureEvent, CreatureInput, CreatureSettings, ability::{AbilityEvent, AbilityId}};
#[cfg(not(target_arch = "wasm32"))]
use glam::Vec2;
#[cfg(not(target_arch = "wasm32"))]
use rand::{Rng, SeedableRng};
#[cfg(not(target_arch = "wasm32"))]
use rand_pcg::Pcg32;

#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 60.0;
#[cfg(not(target_arch = "wasm32"))]
const RUN_SECONDS: f32 = 20.0;

/// Random stand-in for a player
#[cfg(not(target_arch = "wasm32"))]
struct InputDriver {
    rng: Pcg32,
    move_axis: f32,
    /// Seconds until the stick is moved again
    retarget_in: f32,
    /// Seconds until a held dash is released
    dash_held: Option<f32>,
}

#[cfg(not(target_arch = "wasm32"))]
impl InputDriver {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            move_axis: 0.0,
            retarget_in: 0.0,
            dash_held: None,
        }
    }

    fn sample(&mut self, dt: f32) -> CreatureInput {
        self.retarget_in -= dt;
        if self.retarget_in <= 0.0 {
            self.move_axis = self.rng.random_range(-1.0..=1.0);
            self.retarget_in = self.rng.random_range(0.25..1.0);
        }

        let mut input = CreatureInput::moving(self.move_axis);
        input.jump = self.rng.random_bool(0.02);

        match self.dash_held.as_mut() {
            Some(held) => {
                *held -= dt;
                if *held <= 0.0 {
                    self.dash_held = None;
                    input = input.release("dash");
                }
            }
            None if self.rng.random_bool(0.01) => {
                self.dash_held = Some(self.rng.random_range(0.05..0.5));
                input = input.press("dash");
            }
            None => {}
        }
        if self.rng.random_bool(0.005) {
            input = input.press("melee");
        }
        input
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Creature Core demo starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => CreatureSettings::load(path),
        None => CreatureSettings::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xC0FFEE);
    log::info!("Input seed: {}", seed);

    let mut creature = Creature::builder(settings).build();
    creature.on_turn(|direction| log::debug!("Facing {:?}", direction));

    let mut driver = InputDriver::new(seed);
    let mut hazard = Pcg32::seed_from_u64(seed ^ 0x5EED);
    let mut position = Vec2::ZERO;
    let mut time = 0.0;

    while time < RUN_SECONDS {
        // Floor at y = 0
        creature.set_grounded(position.y <= 0.0);

        let input = driver.sample(FRAME_DT);
        creature.update(FRAME_DT, &input);

        if hazard.random_bool(0.003) {
            let direction = Vec2::new(hazard.random_range(-1.0..=1.0), 0.0);
            let outcome = creature.apply_damage(&creature_core::health::DamageSource::melee(direction), 1);
            log::info!("[{:6.2}s] hit -> {:?}", time, outcome);
        }

        position += creature.velocity() * FRAME_DT;
        if position.y < 0.0 {
            position.y = 0.0;
            let velocity = creature.velocity();
            if velocity.y < 0.0 {
                creature.set_velocity(Vec2::new(velocity.x, 0.0));
            }
        }

        for event in creature.drain_events() {
            log_event(&creature, time, event);
        }
        time += FRAME_DT;
    }

    log::info!(
        "Finished at x = {:.1}, health {}/{}",
        position.x,
        creature.health().current(),
        creature
            .attributes()
            .value_or_default(creature_core::attributes::MAX_HEALTH)
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn log_event(creature: &Creature, time: f32, event: CreatureEvent) {
    use creature_core::ability::Ability;

    let name = |id: AbilityId| {
        creature
            .arbiter()
            .get(id)
            .map(|ability| ability.name().to_string())
            .unwrap_or_default()
    };
    match event {
        CreatureEvent::Ability(AbilityEvent::Activated(id)) => {
            log::info!("[{:6.2}s] {} activated", time, name(id));
        }
        CreatureEvent::Ability(AbilityEvent::Stopped { id, forced }) => {
            log::info!("[{:6.2}s] {} stopped (forced: {})", time, name(id), forced);
        }
        CreatureEvent::Jumped => log::info!("[{:6.2}s] jump", time),
        CreatureEvent::Turned(direction) => log::info!("[{:6.2}s] turned {:?}", time, direction),
        CreatureEvent::RanOutOfHealth => log::info!("[{:6.2}s] out of health", time),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless demo is native only
}
