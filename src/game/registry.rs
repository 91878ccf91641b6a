//! Live enemy storage, id allocation and admission control
//!
//! Enemies live in a `Vec` ordered by id. Ids are allocated from a monotonic
//! counter, so pushes keep the order and lookups are a binary search.

use tracing::debug;

use crate::game::constants::difficulty_multiplier;
use crate::game::constants::enemy::{
    BASE_HEALTH, BASE_MASS, BASE_SPEED, SPEED_JITTER_MAX, SPEED_JITTER_MIN,
};
use crate::game::constants::spawn::{EDGE_SPAWN_DISTANCE, MAX_ENEMY_COUNT};
use crate::game::rng::SimRng;
use crate::game::state::{Enemy, EnemyId, SpawnOverrides, Tier};
use crate::util::vec2::Vec2;

/// Stream index for the registry's stat rolls
const REGISTRY_STREAM: u32 = 2;

/// Result of applying damage to an enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub remaining: f32,
    /// Health crossed from positive to zero or below on this hit
    pub killed: bool,
}

pub struct EnemyRegistry {
    enemies: Vec<Enemy>,
    next_id: EnemyId,
    max_enemy_count: usize,
    rng: SimRng,
    /// Spawns refused by the cap since the last reset
    rejected: u64,
}

impl EnemyRegistry {
    pub fn new(max_enemy_count: usize, seed: u32) -> Self {
        Self {
            enemies: Vec::with_capacity(max_enemy_count),
            next_id: 1,
            max_enemy_count,
            rng: SimRng::derive(seed, REGISTRY_STREAM),
            rejected: 0,
        }
    }

    /// Drop every enemy and restart id allocation
    pub fn reset(&mut self, seed: u32) {
        self.enemies.clear();
        self.next_id = 1;
        self.rng = SimRng::derive(seed, REGISTRY_STREAM);
        self.rejected = 0;
    }

    #[inline]
    pub fn can_spawn(&self) -> bool {
        self.enemies.len() < self.max_enemy_count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    #[inline]
    pub fn max_enemy_count(&self) -> usize {
        self.max_enemy_count
    }

    #[inline]
    pub fn rejected_spawns(&self) -> u64 {
        self.rejected
    }

    /// Create an enemy of `tier` at `position`
    ///
    /// Returns `None` at the cap. Stats scale with the difficulty ramp at
    /// `game_time`; the variant is drawn from the tier table unless overridden.
    pub fn spawn_at_tier(
        &mut self,
        position: Vec2,
        tier: Tier,
        game_time: f32,
        overrides: SpawnOverrides,
    ) -> Option<EnemyId> {
        if !self.can_spawn() {
            self.rejected += 1;
            debug!(?tier, len = self.enemies.len(), "Spawn rejected at enemy cap");
            return None;
        }

        let variant = match overrides.variant {
            Some(v) => v,
            None => tier.pick_variant(&mut self.rng),
        };
        let tier_stats = tier.stats();
        let variant_stats = variant.stats();

        let max_health = BASE_HEALTH
            * difficulty_multiplier(game_time)
            * tier_stats.health_mult
            * variant_stats.health_mult;
        let health = match overrides.health_ratio {
            Some(ratio) => max_health * ratio.clamp(0.0, 1.0),
            None => max_health,
        };
        let speed = BASE_SPEED
            * self.rng.range(SPEED_JITTER_MIN, SPEED_JITTER_MAX)
            * tier_stats.speed_mult
            * variant_stats.speed_mult;
        let behavior = variant.initial_behavior(&mut self.rng);

        let id = self.next_id;
        self.next_id += 1;

        self.enemies.push(Enemy {
            position,
            velocity: overrides.velocity.unwrap_or(Vec2::ZERO),
            size: tier_stats.base_size * variant_stats.size_mult,
            mass: BASE_MASS * tier_stats.health_mult * variant_stats.mass_mult,
            speed,
            merging: false,
            health,
            max_health,
            behavior,
            merge_target: None,
            id,
            tier,
            variant,
            alpha: 1.0,
            render_scale: 1.0,
            spawned_at: game_time,
        });

        Some(id)
    }

    /// Spawn on the ring around the player, at `angle` or a random one
    pub fn spawn_at_edge(
        &mut self,
        player: Vec2,
        tier: Tier,
        game_time: f32,
        angle: Option<f32>,
    ) -> Option<EnemyId> {
        if !self.can_spawn() {
            self.rejected += 1;
            return None;
        }
        let angle = match angle {
            Some(a) => a,
            None => self.rng.angle(),
        };
        let position = player + Vec2::from_angle(angle) * EDGE_SPAWN_DISTANCE;
        self.spawn_at_tier(position, tier, game_time, SpawnOverrides::default())
    }

    #[inline]
    fn index_of(&self, id: EnemyId) -> Option<usize> {
        self.enemies.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.index_of(id).map(|i| &self.enemies[i])
    }

    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.index_of(id).map(move |i| &mut self.enemies[i])
    }

    /// Two distinct enemies mutably at once
    pub fn get_pair_mut(&mut self, a: EnemyId, b: EnemyId) -> Option<(&mut Enemy, &mut Enemy)> {
        if a == b {
            return None;
        }
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        if ia < ib {
            let (left, right) = self.enemies.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.enemies.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// Enemies in id order
    #[inline]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    #[inline]
    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    pub fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        let index = self.index_of(id)?;
        Some(self.enemies.remove(index))
    }

    /// Subtract `amount` from an enemy's health
    pub fn apply_damage(&mut self, id: EnemyId, amount: f32) -> Option<DamageOutcome> {
        let enemy = self.get_mut(id)?;
        let was_alive = enemy.is_alive();
        enemy.health -= amount;
        Some(DamageOutcome {
            remaining: enemy.health,
            killed: was_alive && !enemy.is_alive(),
        })
    }

    /// Add `delta` to an enemy's velocity, returning the new velocity
    pub fn apply_knockback(&mut self, id: EnemyId, delta: Vec2) -> Option<Vec2> {
        let enemy = self.get_mut(id)?;
        enemy.velocity += delta;
        Some(enemy.velocity)
    }

    /// Remove enemies that are dead or farther than `margin` from the camera
    ///
    /// Returns the removed enemies so callers can report them.
    pub fn cleanup(&mut self, camera: Vec2, margin: f32) -> Vec<Enemy> {
        let margin_sq = margin * margin;
        let mut removed = Vec::new();
        self.enemies.retain(|e| {
            let keep = e.is_alive() && e.position.distance_sq_to(camera) <= margin_sq;
            if !keep {
                removed.push(e.clone());
            }
            keep
        });
        removed
    }
}

impl Default for EnemyRegistry {
    fn default() -> Self {
        Self::new(MAX_ENEMY_COUNT, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Variant;

    fn fill(registry: &mut EnemyRegistry) -> Vec<EnemyId> {
        let mut ids = Vec::new();
        while let Some(id) = registry.spawn_at_tier(
            Vec2::new(ids.len() as f32 * 10.0, 0.0),
            Tier::Small,
            0.0,
            SpawnOverrides::default(),
        ) {
            ids.push(id);
        }
        ids
    }

    #[test]
    fn test_admission_at_cap() {
        let mut registry = EnemyRegistry::new(50, 1);
        let ids = fill(&mut registry);
        assert_eq!(ids.len(), 50);
        assert_eq!(registry.len(), 50);
        assert!(!registry.can_spawn());
        assert!(registry
            .spawn_at_edge(Vec2::ZERO, Tier::Small, 0.0, None)
            .is_none());
        assert_eq!(registry.rejected_spawns(), 2);

        registry.remove(ids[10]);
        assert!(registry.can_spawn());
        assert!(registry
            .spawn_at_tier(Vec2::ZERO, Tier::Small, 0.0, SpawnOverrides::default())
            .is_some());
        assert!(!registry.can_spawn());
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut registry = EnemyRegistry::new(10, 1);
        let ids = fill(&mut registry);
        registry.remove(ids[3]);
        let fresh = registry
            .spawn_at_tier(Vec2::ZERO, Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        assert!(ids.iter().all(|&id| id != fresh));
        let stored: Vec<EnemyId> = registry.iter().map(|e| e.id).collect();
        assert!(stored.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(registry.get(fresh).map(|e| e.id), Some(fresh));
        assert!(registry.get(ids[3]).is_none());
    }

    #[test]
    fn test_stats_derivation() {
        let mut registry = EnemyRegistry::new(10, 3);
        let overrides = SpawnOverrides {
            variant: Some(Variant::Drifter),
            ..Default::default()
        };
        let id = registry
            .spawn_at_tier(Vec2::ZERO, Tier::Medium, 0.0, overrides)
            .unwrap();
        let e = registry.get(id).unwrap();
        let tier = Tier::Medium.stats();
        assert!((e.max_health - BASE_HEALTH * tier.health_mult).abs() < 1e-5);
        assert_eq!(e.health, e.max_health);
        assert!((e.mass - BASE_MASS * tier.health_mult).abs() < 1e-5);
        assert!((e.size - tier.base_size).abs() < 1e-5);
        let min_speed = BASE_SPEED * SPEED_JITTER_MIN * tier.speed_mult;
        let max_speed = BASE_SPEED * SPEED_JITTER_MAX * tier.speed_mult;
        assert!(e.speed >= min_speed && e.speed <= max_speed);
    }

    #[test]
    fn test_health_scales_with_game_time() {
        let mut registry = EnemyRegistry::new(10, 3);
        let overrides = SpawnOverrides {
            variant: Some(Variant::Drifter),
            ..Default::default()
        };
        let early = registry.spawn_at_tier(Vec2::ZERO, Tier::Small, 0.0, overrides).unwrap();
        let late = registry.spawn_at_tier(Vec2::ZERO, Tier::Small, 600.0, overrides).unwrap();
        let early_hp = registry.get(early).unwrap().max_health;
        let late_hp = registry.get(late).unwrap().max_health;
        assert!((late_hp / early_hp - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_health_ratio_override() {
        let mut registry = EnemyRegistry::new(10, 3);
        let overrides = SpawnOverrides {
            health_ratio: Some(0.5),
            velocity: Some(Vec2::new(3.0, 0.0)),
            ..Default::default()
        };
        let id = registry.spawn_at_tier(Vec2::ZERO, Tier::Large, 0.0, overrides).unwrap();
        let e = registry.get(id).unwrap();
        assert!((e.health_ratio() - 0.5).abs() < 1e-5);
        assert_eq!(e.velocity, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_spawn_at_edge_distance() {
        let mut registry = EnemyRegistry::new(10, 3);
        let player = Vec2::new(100.0, -50.0);
        let id = registry.spawn_at_edge(player, Tier::Small, 0.0, Some(0.0)).unwrap();
        let e = registry.get(id).unwrap();
        assert!(e.position.approx_eq(Vec2::new(800.0, -50.0), 1e-3));

        let id = registry.spawn_at_edge(player, Tier::Small, 0.0, None).unwrap();
        let d = registry.get(id).unwrap().position.distance_to(player);
        assert!((d - EDGE_SPAWN_DISTANCE).abs() < 1e-2);
    }

    #[test]
    fn test_apply_damage_reports_kill_once() {
        let mut registry = EnemyRegistry::new(10, 3);
        let id = registry
            .spawn_at_tier(Vec2::ZERO, Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        let hp = registry.get(id).unwrap().health;
        let hit = registry.apply_damage(id, hp).unwrap();
        assert!(hit.killed);
        let again = registry.apply_damage(id, 1.0).unwrap();
        assert!(!again.killed);
        assert!(registry.apply_damage(999, 1.0).is_none());
    }

    #[test]
    fn test_apply_knockback_adds_velocity() {
        let mut registry = EnemyRegistry::new(10, 3);
        let id = registry
            .spawn_at_tier(
                Vec2::ZERO,
                Tier::Small,
                0.0,
                SpawnOverrides {
                    velocity: Some(Vec2::new(10.0, 0.0)),
                    ..Default::default()
                },
            )
            .unwrap();
        let v = registry.apply_knockback(id, Vec2::new(0.0, -4.0)).unwrap();
        assert_eq!(v, Vec2::new(10.0, -4.0));
        assert_eq!(registry.get(id).unwrap().velocity, v);
        assert!(registry.apply_knockback(999, Vec2::UP).is_none());
    }

    #[test]
    fn test_cleanup_removes_dead_and_distant() {
        let mut registry = EnemyRegistry::new(10, 3);
        let near = registry
            .spawn_at_tier(Vec2::new(10.0, 0.0), Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        let far = registry
            .spawn_at_tier(Vec2::new(5000.0, 0.0), Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        let dead = registry
            .spawn_at_tier(Vec2::ZERO, Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        registry.get_mut(dead).unwrap().health = 0.0;

        let removed: Vec<EnemyId> = registry
            .cleanup(Vec2::ZERO, 1400.0)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(removed, vec![far, dead]);
        assert!(registry.get(near).is_some());
    }

    #[test]
    fn test_get_pair_mut() {
        let mut registry = EnemyRegistry::new(10, 3);
        let a = registry
            .spawn_at_tier(Vec2::ZERO, Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        let b = registry
            .spawn_at_tier(Vec2::RIGHT, Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        let (eb, ea) = registry.get_pair_mut(b, a).unwrap();
        assert_eq!(eb.id, b);
        assert_eq!(ea.id, a);
        assert!(registry.get_pair_mut(a, a).is_none());
    }

    #[test]
    fn test_reset_restarts_ids() {
        let mut registry = EnemyRegistry::new(10, 3);
        let first = registry
            .spawn_at_tier(Vec2::ZERO, Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        registry.reset(3);
        assert!(registry.is_empty());
        let again = registry
            .spawn_at_tier(Vec2::ZERO, Tier::Small, 0.0, SpawnOverrides::default())
            .unwrap();
        assert_eq!(first, again);
    }
}
