//! Prometheus-compatible simulation metrics
//!
//! Counters are plain atomics so a reader on another thread can scrape them
//! while the simulation ticks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Samples kept for tick-time percentiles
const TICK_HISTORY_LEN: usize = 1000;

#[derive(Debug)]
pub struct SimMetrics {
    // Population
    pub enemies_alive: AtomicU64,
    pub projectiles_alive: AtomicU64,

    // Lifecycle counters
    pub spawns: AtomicU64,
    pub spawn_rejections: AtomicU64,
    pub merges_started: AtomicU64,
    pub merges_completed: AtomicU64,
    pub merges_aborted: AtomicU64,
    pub kills: AtomicU64,
    pub despawns: AtomicU64,
    pub projectiles_fired: AtomicU64,
    pub events_dropped: AtomicU64,

    // Tick timing (microseconds)
    pub tick_count: AtomicU64,
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,
    pub tick_time_p99_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,

    // Session
    pub game_time_ms: AtomicU64,
    start_time: Instant,

    // Rolling tick times for percentile calculation
    tick_history: RwLock<VecDeque<u64>>,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self {
            enemies_alive: AtomicU64::new(0),
            projectiles_alive: AtomicU64::new(0),
            spawns: AtomicU64::new(0),
            spawn_rejections: AtomicU64::new(0),
            merges_started: AtomicU64::new(0),
            merges_completed: AtomicU64::new(0),
            merges_aborted: AtomicU64::new(0),
            kills: AtomicU64::new(0),
            despawns: AtomicU64::new(0),
            projectiles_fired: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            tick_count: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            tick_time_p99_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            game_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(TICK_HISTORY_LEN)),
        }
    }

    #[inline]
    pub fn add(counter: &AtomicU64, n: u64) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    /// Record a tick time and update percentiles
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);
        self.tick_count.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics_extended")]
        {
            let mut history = self.tick_history.write();
            history.push_back(us);
            while history.len() > TICK_HISTORY_LEN {
                history.pop_front();
            }

            if history.len() >= 10 {
                let mut sorted: Vec<u64> = history.iter().copied().collect();
                sorted.sort_unstable();

                let p95_idx = (sorted.len() as f32 * 0.95) as usize;
                let p99_idx = (sorted.len() as f32 * 0.99) as usize;

                self.tick_time_p95_us.store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
                self.tick_time_p99_us.store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
                self.tick_time_max_us.store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
            }
        }
    }

    /// Zero every counter for a new session
    pub fn reset(&self) {
        for counter in [
            &self.enemies_alive,
            &self.projectiles_alive,
            &self.spawns,
            &self.spawn_rejections,
            &self.merges_started,
            &self.merges_completed,
            &self.merges_aborted,
            &self.kills,
            &self.despawns,
            &self.projectiles_fired,
            &self.events_dropped,
            &self.tick_count,
            &self.tick_time_us,
            &self.tick_time_p95_us,
            &self.tick_time_p99_us,
            &self.tick_time_max_us,
            &self.game_time_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.tick_history.write().clear();
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("survival_sim_enemies", "Live enemies", "gauge",
            self.enemies_alive.load(Ordering::Relaxed));
        metric!("survival_sim_projectiles", "Live projectiles", "gauge",
            self.projectiles_alive.load(Ordering::Relaxed));

        metric!("survival_sim_spawns_total", "Enemies spawned", "counter",
            self.spawns.load(Ordering::Relaxed));
        metric!("survival_sim_spawn_rejections_total", "Spawns refused at the enemy cap", "counter",
            self.spawn_rejections.load(Ordering::Relaxed));
        metric!("survival_sim_merges_started_total", "Merges begun", "counter",
            self.merges_started.load(Ordering::Relaxed));
        metric!("survival_sim_merges_completed_total", "Merges completed", "counter",
            self.merges_completed.load(Ordering::Relaxed));
        metric!("survival_sim_merges_aborted_total", "Merges aborted", "counter",
            self.merges_aborted.load(Ordering::Relaxed));
        metric!("survival_sim_kills_total", "Enemies killed by projectiles", "counter",
            self.kills.load(Ordering::Relaxed));
        metric!("survival_sim_despawns_total", "Enemies removed for distance", "counter",
            self.despawns.load(Ordering::Relaxed));
        metric!("survival_sim_projectiles_fired_total", "Projectiles fired", "counter",
            self.projectiles_fired.load(Ordering::Relaxed));
        metric!("survival_sim_events_dropped_total", "Events dropped by a full outbox", "counter",
            self.events_dropped.load(Ordering::Relaxed));

        metric!("survival_sim_tick_count", "Total ticks processed", "counter",
            self.tick_count.load(Ordering::Relaxed));
        metric!("survival_sim_tick_time_microseconds", "Current tick time in microseconds", "gauge",
            self.tick_time_us.load(Ordering::Relaxed));
        #[cfg(feature = "metrics_extended")]
        {
            metric!("survival_sim_tick_time_p95_microseconds", "95th percentile tick time", "gauge",
                self.tick_time_p95_us.load(Ordering::Relaxed));
            metric!("survival_sim_tick_time_p99_microseconds", "99th percentile tick time", "gauge",
                self.tick_time_p99_us.load(Ordering::Relaxed));
            metric!("survival_sim_tick_time_max_microseconds", "Maximum tick time", "gauge",
                self.tick_time_max_us.load(Ordering::Relaxed));
        }

        metric!("survival_sim_game_time_seconds", "Simulated game time", "gauge",
            self.game_time_ms.load(Ordering::Relaxed) as f64 / 1000.0);
        metric!("survival_sim_uptime_seconds", "Process uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }
}

impl Default for SimMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = SimMetrics::new();
        assert_eq!(metrics.enemies_alive.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.tick_count.load(Ordering::Relaxed), 0);
    }

    #[test]
    #[cfg(feature = "metrics_extended")]
    fn test_record_tick_time() {
        let metrics = SimMetrics::new();
        for i in 0..100 {
            metrics.record_tick_time(Duration::from_micros(100 + i * 10));
        }
        assert_eq!(metrics.tick_count.load(Ordering::Relaxed), 100);
        assert!(metrics.tick_time_p95_us.load(Ordering::Relaxed) >= 1000);
        assert!(metrics.tick_time_p99_us.load(Ordering::Relaxed) >= metrics.tick_time_p95_us.load(Ordering::Relaxed));
        assert_eq!(metrics.tick_time_max_us.load(Ordering::Relaxed), 1090);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = SimMetrics::new();
        metrics.enemies_alive.store(42, Ordering::Relaxed);
        SimMetrics::add(&metrics.merges_completed, 3);

        let output = metrics.to_prometheus();
        assert!(output.contains("survival_sim_enemies 42"));
        assert!(output.contains("survival_sim_merges_completed_total 3"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let metrics = SimMetrics::new();
        SimMetrics::add(&metrics.kills, 5);
        metrics.record_tick_time(Duration::from_micros(50));
        metrics.reset();
        assert_eq!(metrics.kills.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.tick_count.load(Ordering::Relaxed), 0);
    }
}
