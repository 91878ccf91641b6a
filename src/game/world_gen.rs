//! Deterministic session timeline generation
//!
//! `generate` is a pure function of `(seed, difficulty)`: the same inputs always
//! produce the same spawn schedule, world events and black hole.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::constants::world_gen::*;
use crate::game::formation::Formation;
use crate::game::rng::SimRng;
use crate::game::state::Tier;
use crate::util::vec2::Vec2;

#[derive(Debug, Error, PartialEq)]
pub enum WorldGenError {
    #[error("difficulty must be finite, got {0}")]
    NonFiniteDifficulty(f32),
    #[error("difficulty must be non-negative, got {0}")]
    NegativeDifficulty(f32),
    #[error("session duration must be finite and longer than {min}s, got {got}")]
    InvalidDuration { got: f32, min: f32 },
}

/// Reject difficulty values the generator cannot use
pub fn validate_inputs(difficulty: f32) -> Result<f32, WorldGenError> {
    if !difficulty.is_finite() {
        return Err(WorldGenError::NonFiniteDifficulty(difficulty));
    }
    if difficulty < 0.0 {
        return Err(WorldGenError::NegativeDifficulty(difficulty));
    }
    Ok(difficulty)
}

pub fn validate_duration(duration: f32) -> Result<f32, WorldGenError> {
    if !duration.is_finite() || duration <= FIRST_SPAWN_TIME {
        return Err(WorldGenError::InvalidDuration {
            got: duration,
            min: FIRST_SPAWN_TIME,
        });
    }
    Ok(duration)
}

/// One scheduled batch of enemies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawnEvent {
    pub time: f32,
    pub tier: Tier,
    pub count: u32,
    /// Shared arrival angle for a grouped batch
    pub angle: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    Heal,
    Magnet,
    PowerUp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEventKind {
    HazardPulse { strength: f32 },
    EnemyWave { formation: Formation, tier: Tier, count: u32 },
    Reward { kind: RewardKind },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub time: f32,
    pub kind: WorldEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackHoleConfig {
    pub position: Vec2,
    pub mass: f32,
    pub pull_radius: f32,
    pub consume_radius: f32,
}

/// Immutable session timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedWorld {
    pub seed: u32,
    pub difficulty: f32,
    /// Sorted by `time`
    pub spawn_events: Vec<EnemySpawnEvent>,
    /// Sorted by `time`
    pub world_events: Vec<WorldEvent>,
    pub black_hole: BlackHoleConfig,
    pub total_duration: f32,
}

impl GeneratedWorld {
    pub fn boss_events(&self) -> impl Iterator<Item = &EnemySpawnEvent> {
        self.spawn_events.iter().filter(|e| e.tier == Tier::Boss)
    }
}

/// Generate a default-length session
pub fn generate(seed: u32, difficulty: f32) -> GeneratedWorld {
    generate_with_duration(seed, difficulty, DEFAULT_DURATION)
}

/// Generate a session of `duration` seconds
///
/// Inputs are expected to have passed `validate_inputs`/`validate_duration`;
/// anything else is coerced to a usable value instead of failing.
pub fn generate_with_duration(seed: u32, difficulty: f32, duration: f32) -> GeneratedWorld {
    let duration = if duration.is_finite() && duration > FIRST_SPAWN_TIME {
        duration
    } else {
        DEFAULT_DURATION
    };
    let d = normalized_difficulty(difficulty);
    let mut rng = SimRng::new(seed);

    let spawn_events = spawn_timeline(&mut rng, d, duration);
    let world_events = world_event_timeline(&mut rng, d, duration);
    let black_hole = black_hole(&mut rng, d);

    GeneratedWorld {
        seed,
        difficulty,
        spawn_events,
        world_events,
        black_hole,
        total_duration: duration,
    }
}

#[inline]
fn normalized_difficulty(difficulty: f32) -> f32 {
    if difficulty.is_finite() {
        (difficulty / DIFFICULTY_CEILING).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn roll_tier(rng: &mut SimRng, progress: f32, d: f32) -> Tier {
    let small_cut = (0.85 - 0.45 * progress - 0.20 * d).max(0.25);
    let medium_cut = (small_cut + 0.12 + 0.20 * progress + 0.08 * d).min(0.97);
    let roll = rng.next_f32();
    if roll < small_cut {
        Tier::Small
    } else if roll < medium_cut {
        Tier::Medium
    } else {
        Tier::Large
    }
}

fn roll_count(rng: &mut SimRng, tier: Tier) -> u32 {
    match tier {
        Tier::Small => rng.range_inclusive(2, 4),
        Tier::Medium => rng.range_inclusive(1, 2),
        Tier::Large | Tier::Boss => 1,
    }
}

fn spawn_timeline(rng: &mut SimRng, d: f32, duration: f32) -> Vec<EnemySpawnEvent> {
    let mut events = Vec::new();
    let mut t = FIRST_SPAWN_TIME;

    while t < duration {
        let progress = t / duration;
        let interval = (MAX_INTERVAL - INTERVAL_RAMP * progress).max(MIN_INTERVAL)
            * rng.range(JITTER_MIN, JITTER_MAX);
        let tier = roll_tier(rng, progress, d);
        let count = roll_count(rng, tier);
        let angle = if rng.chance(GROUPED_ANGLE_CHANCE) {
            Some(rng.angle())
        } else {
            None
        };
        events.push(EnemySpawnEvent { time: t, tier, count, angle });
        t += interval;
    }

    events.push(EnemySpawnEvent {
        time: BOSS_SPAWN_TIME,
        tier: Tier::Boss,
        count: 1,
        angle: None,
    });
    // Stable: the boss lands after any regular event sharing its timestamp
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events
}

fn world_event_timeline(rng: &mut SimRng, d: f32, duration: f32) -> Vec<WorldEvent> {
    let mut events = Vec::new();

    let mut t = HAZARD_FIRST;
    while t < duration {
        let strength = rng.range(0.5, 1.0) * (1.0 + d);
        events.push(WorldEvent {
            time: t,
            kind: WorldEventKind::HazardPulse { strength },
        });
        t += HAZARD_INTERVAL;
    }

    for i in 0..WAVE_COUNT {
        let time = duration * (i + 1) as f32 / (WAVE_COUNT + 1) as f32;
        let formation = Formation::ALL[rng.range_inclusive(0, Formation::ALL.len() as u32 - 1) as usize];
        let tier = if rng.chance(0.25 + 0.15 * i as f32 + 0.2 * d) {
            Tier::Medium
        } else {
            Tier::Small
        };
        let count = match tier {
            Tier::Small => rng.range_inclusive(6, 10),
            _ => rng.range_inclusive(3, 5),
        };
        events.push(WorldEvent {
            time,
            kind: WorldEventKind::EnemyWave { formation, tier, count },
        });
    }

    let reward_chance = REWARD_BASE_CHANCE + REWARD_DIFFICULTY_CHANCE * d;
    let mut t = REWARD_FIRST;
    while t < duration {
        if rng.chance(reward_chance) {
            let kind = match rng.range_inclusive(0, 2) {
                0 => RewardKind::Heal,
                1 => RewardKind::Magnet,
                _ => RewardKind::PowerUp,
            };
            events.push(WorldEvent {
                time: t,
                kind: WorldEventKind::Reward { kind },
            });
        }
        t += REWARD_INTERVAL;
    }

    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events
}

fn black_hole(rng: &mut SimRng, d: f32) -> BlackHoleConfig {
    let angle = rng.angle();
    let distance = rng.range(BLACK_HOLE_MIN_DISTANCE, BLACK_HOLE_MAX_DISTANCE);
    let mass = rng.range(BLACK_HOLE_MIN_MASS, BLACK_HOLE_MAX_MASS) * (1.0 + 0.5 * d);
    BlackHoleConfig {
        position: Vec2::from_angle(angle) * distance,
        mass,
        pull_radius: rng.range(400.0, 600.0),
        consume_radius: rng.range(40.0, 60.0),
    }
}
