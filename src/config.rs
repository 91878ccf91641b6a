use std::str::FromStr;

use thiserror::Error;

use crate::game::constants::{merge, physics, spawn, world_gen};
use crate::game::events::DEFAULT_EVENT_CAPACITY;
use crate::game::world_gen::{validate_duration, WorldGenError};

/// Simulation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Session seed; every random draw derives from it
    pub seed: u32,
    /// Difficulty fed to the world generator (0-10 typical)
    pub difficulty: f32,
    /// Session length in seconds
    pub duration: f32,
    /// Fixed simulation rate in Hz
    pub tick_rate: u32,
    /// Live enemy cap
    pub max_enemies: usize,
    /// Seconds of overlap before a same-tier pair merges
    pub merge_threshold: f32,
    /// Merge animation length in seconds
    pub merge_duration: f32,
    /// Default stage friction
    pub friction: f32,
    /// Event outbox capacity
    pub event_capacity: usize,
    /// How long the headless runner simulates; `None` runs the whole session
    pub run_seconds: Option<f32>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("tick_rate must be 1-1000, got {0}")]
    TickRate(u32),
    #[error("max_enemies must be at least 1")]
    NoEnemies,
    #[error("{name} must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("difficulty must be finite and non-negative, got {0}")]
    Difficulty(f32),
    #[error("friction must be finite and non-negative, got {0}")]
    Friction(f32),
    #[error("event_capacity must be at least 1")]
    EventCapacity,
    #[error(transparent)]
    World(#[from] WorldGenError),
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            difficulty: 5.0,
            duration: world_gen::DEFAULT_DURATION,
            tick_rate: physics::TICK_RATE,
            max_enemies: spawn::MAX_ENEMY_COUNT,
            merge_threshold: merge::THRESHOLD,
            merge_duration: merge::DURATION,
            friction: physics::DEFAULT_FRICTION,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            run_seconds: None,
        }
    }
}

/// Parse `name` from the environment, keeping `current` on a missing,
/// unparsable or rejected value
fn env_or<T>(name: &str, current: T, accept: impl Fn(&T) -> bool) -> T
where
    T: FromStr,
{
    let Ok(raw) = std::env::var(name) else {
        return current;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) if accept(&parsed) => parsed,
        Ok(_) => {
            tracing::warn!("{} '{}' out of range, using default", name, raw);
            current
        }
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
            current
        }
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    ///
    /// A missing `SIM_SEED` gets a fresh random seed, logged so the session
    /// can be replayed.
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        config.seed = match std::env::var("SIM_SEED") {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(seed) => seed,
                Err(_) => {
                    let seed = rand::random::<u32>();
                    tracing::warn!("Invalid SIM_SEED '{}', using random seed {}", raw, seed);
                    seed
                }
            },
            Err(_) => {
                let seed = rand::random::<u32>();
                tracing::info!("SIM_SEED not set, using random seed {}", seed);
                seed
            }
        };

        config.difficulty = env_or("SIM_DIFFICULTY", config.difficulty, |d: &f32| {
            d.is_finite() && *d >= 0.0
        });
        config.duration = env_or("SIM_DURATION", config.duration, |d: &f32| {
            validate_duration(*d).is_ok()
        });
        config.tick_rate = env_or("SIM_TICK_RATE", config.tick_rate, |r: &u32| (1..=1000).contains(r));
        config.max_enemies = env_or("SIM_MAX_ENEMIES", config.max_enemies, |n: &usize| {
            (1..=10_000).contains(n)
        });
        config.merge_threshold = env_or("SIM_MERGE_THRESHOLD", config.merge_threshold, |t: &f32| {
            t.is_finite() && *t > 0.0
        });
        config.merge_duration = env_or("SIM_MERGE_DURATION", config.merge_duration, |t: &f32| {
            t.is_finite() && *t > 0.0
        });
        config.friction = env_or("SIM_FRICTION", config.friction, |f: &f32| f.is_finite() && *f >= 0.0);
        config.event_capacity = env_or("SIM_EVENT_CAPACITY", config.event_capacity, |c: &usize| *c > 0);

        if std::env::var("SIM_RUN_SECONDS").is_ok() {
            let run = env_or("SIM_RUN_SECONDS", -1.0, |s: &f32| s.is_finite() && *s > 0.0);
            config.run_seconds = (run > 0.0).then_some(run);
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        if self.max_enemies == 0 {
            return Err(ConfigError::NoEnemies);
        }
        if !self.difficulty.is_finite() || self.difficulty < 0.0 {
            return Err(ConfigError::Difficulty(self.difficulty));
        }
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(ConfigError::Friction(self.friction));
        }
        validate_duration(self.duration)?;
        for (name, value) in [
            ("merge_threshold", self.merge_threshold),
            ("merge_duration", self.merge_duration),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if let Some(value) = self.run_seconds {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name: "run_seconds", value });
            }
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::EventCapacity);
        }
        Ok(())
    }

    /// Fixed timestep in seconds
    #[inline]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Seconds the headless runner should simulate
    pub fn run_length(&self) -> f32 {
        self.run_seconds.unwrap_or(self.duration)
    }
}
