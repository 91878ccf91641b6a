//! Spawn scheduling
//!
//! Walks the generated timeline with two cursors and turns due entries into
//! registry spawns. Wave formations are queued point by point and released as
//! their delays elapse.

use tracing::{debug, info};

use crate::game::constants::spawn::{FORMATION_RADIUS, GROUP_ANGLE_SPREAD};
use crate::game::formation;
use crate::game::registry::EnemyRegistry;
use crate::game::rng::SimRng;
use crate::game::state::{EnemyId, SpawnOverrides, Tier};
use crate::game::world_gen::{GeneratedWorld, WorldEvent, WorldEventKind};
use crate::util::vec2::Vec2;

/// Stream index for scheduler placement rolls
const SCHEDULER_STREAM: u32 = 3;

/// A queued formation point
#[derive(Debug, Clone, Copy)]
struct PendingSpawn {
    batch: u32,
    due: f32,
    position: Vec2,
    tier: Tier,
}

/// What one scheduler pass produced
#[derive(Debug, Default)]
pub struct SpawnOutcome {
    pub spawned: Vec<EnemyId>,
    /// World events whose time came up this pass, in timeline order
    pub fired: Vec<WorldEvent>,
    /// Spawns skipped because the registry was full
    pub dropped: u32,
}

pub struct SpawnScheduler {
    spawn_cursor: usize,
    event_cursor: usize,
    pending: Vec<PendingSpawn>,
    next_batch: u32,
    rng: SimRng,
}

impl SpawnScheduler {
    pub fn new(seed: u32) -> Self {
        Self {
            spawn_cursor: 0,
            event_cursor: 0,
            pending: Vec::new(),
            next_batch: 0,
            rng: SimRng::derive(seed, SCHEDULER_STREAM),
        }
    }

    pub fn reset(&mut self, seed: u32) {
        *self = Self::new(seed);
    }

    /// Formation points waiting for their delay
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True once every timeline entry has been consumed and nothing is queued
    pub fn is_exhausted(&self, world: &GeneratedWorld) -> bool {
        self.spawn_cursor >= world.spawn_events.len()
            && self.event_cursor >= world.world_events.len()
            && self.pending.is_empty()
    }

    /// Consume every timeline entry due at `game_time`
    pub fn update(
        &mut self,
        world: &GeneratedWorld,
        registry: &mut EnemyRegistry,
        player: Vec2,
        game_time: f32,
    ) -> SpawnOutcome {
        let mut outcome = SpawnOutcome::default();

        while let Some(event) = world.spawn_events.get(self.spawn_cursor) {
            if event.time > game_time {
                break;
            }
            self.spawn_cursor += 1;

            if event.tier == Tier::Boss {
                info!(time = event.time, "Boss arriving");
            }

            for i in 0..event.count {
                let angle = event
                    .angle
                    .map(|a| a + self.rng.range(-GROUP_ANGLE_SPREAD, GROUP_ANGLE_SPREAD));
                match registry.spawn_at_edge(player, event.tier, game_time, angle) {
                    Some(id) => outcome.spawned.push(id),
                    None => {
                        outcome.dropped += event.count - i;
                        break;
                    }
                }
            }
        }

        while let Some(event) = world.world_events.get(self.event_cursor) {
            if event.time > game_time {
                break;
            }
            self.event_cursor += 1;

            if let WorldEventKind::EnemyWave { formation, tier, count } = event.kind {
                self.queue_wave(formation, tier, count, player, game_time);
            }
            outcome.fired.push(event.clone());
        }

        self.release_pending(registry, game_time, &mut outcome);
        outcome
    }

    fn queue_wave(
        &mut self,
        shape: formation::Formation,
        tier: Tier,
        count: u32,
        player: Vec2,
        game_time: f32,
    ) {
        let center = player + Vec2::from_angle(self.rng.angle()) * FORMATION_RADIUS;
        let facing = (player - center).normalize();
        let batch = self.next_batch;
        self.next_batch = self.next_batch.wrapping_add(1);

        let points = formation::layout(shape, count, facing, &mut self.rng);
        debug!(?shape, ?tier, count, "Queued enemy wave");
        self.pending.extend(points.iter().map(|p| PendingSpawn {
            batch,
            due: game_time + p.delay,
            position: center + p.offset,
            tier,
        }));
    }

    fn release_pending(&mut self, registry: &mut EnemyRegistry, game_time: f32, outcome: &mut SpawnOutcome) {
        let mut full_batches: Vec<u32> = Vec::new();
        let mut i = 0;

        while i < self.pending.len() {
            let point = self.pending[i];
            if point.due > game_time || full_batches.contains(&point.batch) {
                i += 1;
                continue;
            }
            self.pending.remove(i);
            match registry.spawn_at_tier(point.position, point.tier, game_time, SpawnOverrides::default()) {
                Some(id) => outcome.spawned.push(id),
                None => {
                    outcome.dropped += 1;
                    full_batches.push(point.batch);
                }
            }
        }

        if !full_batches.is_empty() {
            let before = self.pending.len();
            self.pending.retain(|p| !full_batches.contains(&p.batch));
            let dropped = before - self.pending.len();
            outcome.dropped += dropped as u32;
            debug!(dropped, "Dropped formation points at enemy cap");
        }
    }
}
