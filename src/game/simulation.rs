//! Frame-driven simulation driver
//!
//! Owns every stage and runs them in a fixed order each tick:
//! spawn scheduling, behavior, collision, merging, projectiles, cleanup.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::SimConfig;
use crate::game::constants::spawn::CLEANUP_MARGIN;
use crate::game::events::{EventOutbox, EventReceiver, SimEvent};
use crate::game::registry::EnemyRegistry;
use crate::game::state::{PhysicsModifiers, PlayerStats, ProjectileId};
use crate::game::systems::behavior::BehaviorEngine;
use crate::game::systems::collision::CollisionResolver;
use crate::game::systems::merge::MergeCoordinator;
use crate::game::systems::projectile::ProjectileSystem;
use crate::game::systems::spawner::SpawnScheduler;
use crate::game::world_gen::{self, GeneratedWorld};
use crate::metrics::SimMetrics;
use crate::util::vec2::Vec2;

/// Per-tick input from the surrounding game
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickInput {
    pub player_position: Vec2,
    pub dt: f32,
    pub modifiers: PhysicsModifiers,
}

/// Counts for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub game_time: f32,
    pub spawned: u32,
    pub merges_started: u32,
    pub merges_completed: u32,
    pub merges_aborted: u32,
    pub kills: u32,
    pub despawned: u32,
    pub enemies: usize,
    pub projectiles: usize,
}

pub struct Simulation {
    config: SimConfig,
    world: GeneratedWorld,
    registry: EnemyRegistry,
    scheduler: SpawnScheduler,
    behavior: BehaviorEngine,
    collision: CollisionResolver,
    merges: MergeCoordinator,
    projectiles: ProjectileSystem,
    outbox: EventOutbox,
    metrics: Arc<SimMetrics>,
    player_stats: PlayerStats,
    player_position: Vec2,
    game_time: f32,
    tick: u64,
}

impl Simulation {
    /// Build a simulation around an already generated world
    pub fn new(config: SimConfig, world: GeneratedWorld) -> Self {
        let seed = world.seed;
        Self {
            registry: EnemyRegistry::new(config.max_enemies, seed),
            scheduler: SpawnScheduler::new(seed),
            behavior: BehaviorEngine::new(seed),
            collision: CollisionResolver::new(config.merge_threshold),
            merges: MergeCoordinator::new(config.merge_duration),
            projectiles: ProjectileSystem::new(),
            outbox: EventOutbox::new(config.event_capacity),
            metrics: Arc::new(SimMetrics::new()),
            player_stats: PlayerStats::default(),
            player_position: Vec2::ZERO,
            game_time: 0.0,
            tick: 0,
            config,
            world,
        }
    }

    /// Generate the world from the config's seed and difficulty
    pub fn from_config(config: SimConfig) -> Self {
        let world = world_gen::generate_with_duration(config.seed, config.difficulty, config.duration);
        Self::new(config, world)
    }

    /// Regenerate the world for a new seed and start over
    pub fn start_session(&mut self, seed: u32, difficulty: f32) {
        self.config.seed = seed;
        self.config.difficulty = difficulty;
        self.world = world_gen::generate_with_duration(seed, difficulty, self.config.duration);
        self.reset();
        info!(
            seed,
            difficulty,
            spawn_events = self.world.spawn_events.len(),
            world_events = self.world.world_events.len(),
            "Session started"
        );
    }

    /// Clear every stage and the game clock, keeping the current world
    pub fn reset(&mut self) {
        let seed = self.world.seed;
        self.registry.reset(seed);
        self.scheduler.reset(seed);
        self.behavior.reset(seed);
        self.collision.reset();
        self.merges.reset();
        self.projectiles.reset();
        self.outbox.clear();
        self.metrics.reset();
        self.player_position = Vec2::ZERO;
        self.game_time = 0.0;
        self.tick = 0;
    }

    pub fn tick(&mut self, input: &TickInput) -> TickSummary {
        let started = Instant::now();
        let dt = input.dt.max(0.0);
        let player = input.player_position;

        self.tick += 1;
        self.game_time += dt;
        self.player_position = player;

        let mut summary = TickSummary {
            tick: self.tick,
            game_time: self.game_time,
            ..Default::default()
        };

        // 1-2. Timeline and instantiation
        let rejected_before = self.registry.rejected_spawns();
        let spawn = self
            .scheduler
            .update(&self.world, &mut self.registry, player, self.game_time);
        for id in &spawn.spawned {
            if let Some(enemy) = self.registry.get(*id) {
                self.outbox.publish(SimEvent::EnemySpawned { enemy: enemy.clone() });
            }
        }
        for event in spawn.fired {
            self.outbox.publish(SimEvent::WorldEventFired { event });
        }
        summary.spawned = spawn.spawned.len() as u32;

        // 3. Movement
        self.behavior
            .update(&mut self.registry, player, &input.modifiers, dt);

        // 4-5. Collision hands merge candidates to the coordinator
        let contacts = self.collision.resolve(&mut self.registry, dt);
        for (a, b) in contacts.merge_candidates {
            match self.merges.begin(&mut self.registry, a, b, self.game_time) {
                Ok(()) => {
                    summary.merges_started += 1;
                    if let Some(e) = self.registry.get(a) {
                        self.outbox.publish(SimEvent::MergeStarted { a, b, tier: e.tier });
                    }
                }
                Err(reason) => debug!(a, b, %reason, "Merge not started"),
            }
        }
        for event in self.merges.update(&mut self.registry, dt) {
            match &event {
                SimEvent::MergeCompleted { .. } => summary.merges_completed += 1,
                SimEvent::MergeAborted { .. } => summary.merges_aborted += 1,
                SimEvent::EnemySpawned { .. } => summary.spawned += 1,
                _ => {}
            }
            self.outbox.publish(event);
        }

        // 6. Projectiles
        let report = self.projectiles.update(&mut self.registry, player, dt);
        for knockback in &report.knockbacks {
            self.outbox.publish(SimEvent::Knockback {
                enemy_id: knockback.enemy_id,
                position: knockback.position,
                velocity: knockback.velocity,
            });
        }
        for &id in &report.kills {
            if let Some(e) = self.registry.get(id) {
                self.outbox.publish(SimEvent::EnemyKilled {
                    id,
                    tier: e.tier,
                    position: e.position,
                });
            }
        }
        summary.kills = report.kills.len() as u32;

        // 7. Cleanup: dead enemies were already reported as kills
        for enemy in self.registry.cleanup(player, CLEANUP_MARGIN) {
            if enemy.is_alive() {
                summary.despawned += 1;
                self.outbox.publish(SimEvent::EnemyDespawned { id: enemy.id });
            }
        }

        summary.enemies = self.registry.len();
        summary.projectiles = self.projectiles.len();
        self.record_metrics(&summary, self.registry.rejected_spawns() - rejected_before, started);
        trace!(?summary, "Tick complete");
        summary
    }

    fn record_metrics(&self, summary: &TickSummary, rejected: u64, started: Instant) {
        let m = &self.metrics;
        m.enemies_alive.store(summary.enemies as u64, Ordering::Relaxed);
        m.projectiles_alive.store(summary.projectiles as u64, Ordering::Relaxed);
        SimMetrics::add(&m.spawns, summary.spawned as u64);
        SimMetrics::add(&m.spawn_rejections, rejected);
        SimMetrics::add(&m.merges_started, summary.merges_started as u64);
        SimMetrics::add(&m.merges_completed, summary.merges_completed as u64);
        SimMetrics::add(&m.merges_aborted, summary.merges_aborted as u64);
        SimMetrics::add(&m.kills, summary.kills as u64);
        SimMetrics::add(&m.despawns, summary.despawned as u64);
        m.events_dropped.store(self.outbox.dropped_count(), Ordering::Relaxed);
        m.game_time_ms.store((self.game_time * 1000.0) as u64, Ordering::Relaxed);
        m.record_tick_time(started.elapsed());
    }

    /// Fire from the last known player position with the current upgrades
    pub fn fire(&mut self) -> Option<ProjectileId> {
        let id = self
            .projectiles
            .fire(self.player_position, &self.registry, &self.player_stats)?;
        if let Some(p) = self.projectiles.get(id) {
            self.outbox.publish(SimEvent::ProjectileFired {
                id,
                position: p.position,
                velocity: p.velocity,
            });
        }
        SimMetrics::add(&self.metrics.projectiles_fired, 1);
        Some(id)
    }

    pub fn set_player_stats(&mut self, stats: PlayerStats) {
        self.player_stats = stats;
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.outbox.subscribe()
    }

    pub fn metrics(&self) -> Arc<SimMetrics> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &GeneratedWorld {
        &self.world
    }

    pub fn registry(&self) -> &EnemyRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EnemyRegistry {
        &mut self.registry
    }

    pub fn projectiles(&self) -> &ProjectileSystem {
        &self.projectiles
    }

    pub fn merges(&self) -> &MergeCoordinator {
        &self.merges
    }

    #[inline]
    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    /// True once the session clock has passed the world's duration
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.game_time >= self.world.total_duration
    }
}
