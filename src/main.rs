use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use survival_sim::config::SimConfig;
use survival_sim::game::events::SimEvent;
use survival_sim::game::simulation::{Simulation, TickInput};
use survival_sim::game::state::{PhysicsModifiers, Vortex};
use survival_sim::game::world_gen::{self, WorldEventKind};
use survival_sim::util::vec2::Vec2;

/// Radius of the scripted player's circuit
const PLAYER_PATH_RADIUS: f32 = 120.0;
/// Angular speed of the scripted player (radians per second)
const PLAYER_PATH_RATE: f32 = 0.2;
/// Shots per second from the scripted player
const FIRE_RATE: u32 = 4;
/// Seconds a hazard pulse keeps the vortex spinning
const HAZARD_SECONDS: f32 = 4.0;
/// Vortex strength per unit of pulse strength
const HAZARD_VORTEX_GAIN: f32 = 120.0;

/// Running totals of drained events
#[derive(Debug, Default)]
struct EventTally {
    spawned: u64,
    fired: u64,
    merges: u64,
    aborted: u64,
    kills: u64,
    despawned: u64,
    world_events: u64,
    /// Strength of the most recent hazard pulse, consumed by the runner
    hazard: Option<f32>,
}

impl EventTally {
    fn absorb(&mut self, events: Vec<SimEvent>) {
        for event in events {
            match event {
                SimEvent::EnemySpawned { .. } => self.spawned += 1,
                SimEvent::ProjectileFired { .. } => self.fired += 1,
                SimEvent::MergeCompleted { .. } => self.merges += 1,
                SimEvent::MergeAborted { .. } => self.aborted += 1,
                SimEvent::EnemyKilled { .. } => self.kills += 1,
                SimEvent::EnemyDespawned { .. } => self.despawned += 1,
                SimEvent::WorldEventFired { event } => {
                    self.world_events += 1;
                    if let WorldEventKind::HazardPulse { strength } = event.kind {
                        self.hazard = Some(strength);
                    }
                }
                SimEvent::MergeStarted { .. } | SimEvent::Knockback { .. } => {}
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Survival Sim v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = SimConfig::load_or_default();
    config.validate().context("invalid configuration")?;
    world_gen::validate_inputs(config.difficulty).context("invalid world generation input")?;
    info!(
        "Configuration loaded: seed={}, difficulty={}, duration={}s, tick_rate={}Hz, max_enemies={}",
        config.seed, config.difficulty, config.duration, config.tick_rate, config.max_enemies
    );

    let mut sim = Simulation::from_config(config.clone());
    let events = sim.subscribe();
    let metrics = sim.metrics();
    info!(
        "World generated: {} spawn events, {} world events, black hole at ({:.0}, {:.0})",
        sim.world().spawn_events.len(),
        sim.world().world_events.len(),
        sim.world().black_hole.position.x,
        sim.world().black_hole.position.y,
    );

    let dt = config.dt();
    let total_ticks = (config.run_length() / dt).ceil() as u64;
    let fire_every = u64::from((config.tick_rate / FIRE_RATE).max(1));
    let mut tally = EventTally::default();
    let mut hazard_left = 0.0_f32;
    let mut hazard_strength = 0.0_f32;

    for tick in 0..total_ticks {
        let t = tick as f32 * dt;
        let player = Vec2::from_angle(t * PLAYER_PATH_RATE) * PLAYER_PATH_RADIUS;

        if let Some(strength) = tally.hazard.take() {
            hazard_left = HAZARD_SECONDS;
            hazard_strength = strength * HAZARD_VORTEX_GAIN;
        }
        let vortex = (hazard_left > 0.0).then_some(Vortex {
            center: player,
            strength: hazard_strength,
        });
        hazard_left -= dt;

        let input = TickInput {
            player_position: player,
            dt,
            modifiers: PhysicsModifiers {
                friction: config.friction,
                vortex,
            },
        };
        sim.tick(&input);
        if tick % fire_every == 0 {
            sim.fire();
        }
        tally.absorb(events.drain());

        if sim.is_finished() {
            break;
        }
    }

    info!(
        "Session finished at t={:.1}s: spawned={}, fired={}, merges={}, aborted={}, kills={}, despawned={}, world_events={}, alive={}",
        sim.game_time(),
        tally.spawned,
        tally.fired,
        tally.merges,
        tally.aborted,
        tally.kills,
        tally.despawned,
        tally.world_events,
        sim.registry().len(),
    );
    info!("Metrics:\n{}", metrics.to_prometheus());

    Ok(())
}
