//! Survival Simulation Core
//!
//! Real-time enemy simulation for a top-down survival mode: seeded world
//! generation, spawn scheduling, per-variant behaviors, pairwise collision,
//! same-tier merging and auto-aimed projectiles.
//!
//! # Features
//!
//! - `metrics_extended` - Tick-time percentiles in `SimMetrics` (enabled by default)

pub mod config;
pub mod game;
pub mod metrics;
pub mod util;
