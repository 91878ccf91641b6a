//! Player projectiles: auto-aim, bounces, damage and knockback

use smallvec::SmallVec;

use crate::game::constants::projectile::*;
use crate::game::registry::EnemyRegistry;
use crate::game::state::{EnemyId, PlayerStats, Projectile, ProjectileId};
use crate::util::vec2::Vec2;

/// Velocity change applied to an enemy by a hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knockback {
    pub enemy_id: EnemyId,
    /// Enemy position at the moment of the hit
    pub position: Vec2,
    /// Enemy velocity after the knockback
    pub velocity: Vec2,
}

#[derive(Debug, Default)]
pub struct ProjectileReport {
    /// Enemies whose health crossed to zero this update
    pub kills: SmallVec<[EnemyId; 8]>,
    pub knockbacks: Vec<Knockback>,
    pub hits: u32,
    pub bounces: u32,
    /// Projectiles removed this update (spent or out of bounds)
    pub destroyed: u32,
}

pub struct ProjectileSystem {
    projectiles: Vec<Projectile>,
    next_id: ProjectileId,
}

impl ProjectileSystem {
    pub fn new() -> Self {
        Self {
            projectiles: Vec::with_capacity(MAX_PROJECTILES),
            next_id: 1,
        }
    }

    pub fn reset(&mut self) {
        self.projectiles.clear();
        self.next_id = 1;
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Nearest live enemy to `from`
    pub fn nearest_target(registry: &EnemyRegistry, from: Vec2) -> Option<EnemyId> {
        registry
            .iter()
            .filter(|e| e.is_alive())
            .min_by(|a, b| {
                a.position
                    .distance_sq_to(from)
                    .total_cmp(&b.position.distance_sq_to(from))
            })
            .map(|e| e.id)
    }

    /// Fire from `player` at the nearest live enemy, or straight up if none
    ///
    /// Returns `None` at the projectile cap.
    pub fn fire(&mut self, player: Vec2, registry: &EnemyRegistry, stats: &PlayerStats) -> Option<ProjectileId> {
        if self.projectiles.len() >= MAX_PROJECTILES {
            return None;
        }

        let direction = Self::nearest_target(registry, player)
            .and_then(|id| registry.get(id))
            .map(|target| (target.position - player).normalize_or(Vec2::UP))
            .unwrap_or(Vec2::UP);

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        self.projectiles.push(Projectile {
            id,
            position: player,
            velocity: direction * (BASE_SPEED * stats.speed_mult),
            size: BASE_SIZE * stats.size_mult,
            mass: BASE_MASS * stats.mass_mult,
            damage: BASE_DAMAGE * stats.damage_mult,
            bounces: 0,
            max_bounces: stats.bounces,
            last_hit: None,
        });
        Some(id)
    }

    /// Move projectiles, bounce them off the view edge, and resolve hits
    pub fn update(&mut self, registry: &mut EnemyRegistry, camera: Vec2, dt: f32) -> ProjectileReport {
        let mut report = ProjectileReport::default();
        let before = self.projectiles.len();

        self.projectiles.retain_mut(|p| {
            p.position += p.velocity * dt;

            if !bounce_off_view(p, camera, &mut report) {
                return false;
            }

            hit_enemies(p, registry, &mut report)
        });

        report.destroyed = (before - self.projectiles.len()) as u32;
        report
    }
}

impl Default for ProjectileSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Reflect at the view edge while bounces remain; false once beyond the margin
fn bounce_off_view(p: &mut Projectile, camera: Vec2, report: &mut ProjectileReport) -> bool {
    let rel = p.position - camera;
    if rel.x.abs() > VIEW_HALF_WIDTH + WORLD_MARGIN || rel.y.abs() > VIEW_HALF_HEIGHT + WORLD_MARGIN {
        return false;
    }

    if rel.x.abs() > VIEW_HALF_WIDTH && rel.x * p.velocity.x > 0.0 && p.has_bounces_left() {
        p.velocity.x = -p.velocity.x;
        p.bounces += 1;
        report.bounces += 1;
    }
    if rel.y.abs() > VIEW_HALF_HEIGHT && rel.y * p.velocity.y > 0.0 && p.has_bounces_left() {
        p.velocity.y = -p.velocity.y;
        p.bounces += 1;
        report.bounces += 1;
    }
    true
}

/// First contact wins; returns false if the projectile is spent
fn hit_enemies(p: &mut Projectile, registry: &mut EnemyRegistry, report: &mut ProjectileReport) -> bool {
    let radius = p.radius();

    let contact = registry.iter().find_map(|enemy| {
        if !enemy.is_alive() || p.last_hit == Some(enemy.id) {
            return None;
        }
        let reach = radius + enemy.radius();
        (p.position.distance_sq_to(enemy.position) < reach * reach)
            .then_some((enemy.id, enemy.position, enemy.mass, reach))
    });
    let Some((id, position, mass, reach)) = contact else {
        return true;
    };

    report.hits += 1;
    if registry.apply_damage(id, p.damage).is_some_and(|outcome| outcome.killed) {
        report.kills.push(id);
    }
    if let Some(velocity) = registry.apply_knockback(id, p.velocity * (p.mass / mass * KNOCKBACK_SCALE)) {
        report.knockbacks.push(Knockback {
            enemy_id: id,
            position,
            velocity,
        });
    }

    if !p.has_bounces_left() {
        return false;
    }

    let fallback = -p.velocity.normalize_or(Vec2::UP);
    let normal = (p.position - position).normalize_or(fallback);
    if p.velocity.dot(normal) < 0.0 {
        p.velocity = p.velocity.reflect(normal);
    }
    p.position = position + normal * (reach + 0.5);
    p.bounces += 1;
    p.last_hit = Some(id);
    report.bounces += 1;
    true
}
