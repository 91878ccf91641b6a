//! Same-tier enemy merging
//!
//! A merge pulls both sources toward their mass-weighted centroid over a short
//! animation, then replaces them with one enemy of the next tier that carries
//! their combined momentum and averaged health ratio.

use thiserror::Error;
use tracing::{debug, warn};

use crate::game::constants::merge::{DURATION, SHRINK};
use crate::game::events::SimEvent;
use crate::game::registry::EnemyRegistry;
use crate::game::state::{Enemy, EnemyId, SpawnOverrides, Tier};
use crate::util::vec2::Vec2;

/// Why `begin` refused a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MergeRejection {
    #[error("enemy {0} does not exist")]
    Missing(EnemyId),
    #[error("enemy {0} cannot merge with itself")]
    SelfPair(EnemyId),
    #[error("enemy {0} is already merging")]
    AlreadyMerging(EnemyId),
    #[error("tiers differ")]
    TierMismatch,
    #[error("tier {0:?} cannot merge")]
    NotMergeable(Tier),
}

/// In-flight merge animation
#[derive(Debug, Clone)]
pub struct PendingMerge {
    pub a: EnemyId,
    pub b: EnemyId,
    pub tier: Tier,
    pub start_a: Vec2,
    pub start_b: Vec2,
    pub centroid: Vec2,
    pub elapsed: f32,
    /// Game time at `begin`; the successor's stats use `started_at + duration`
    pub started_at: f32,
}

pub struct MergeCoordinator {
    pending: Vec<PendingMerge>,
    duration: f32,
}

impl MergeCoordinator {
    pub fn new(duration: f32) -> Self {
        Self {
            pending: Vec::new(),
            duration: duration.max(f32::EPSILON),
        }
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> &[PendingMerge] {
        &self.pending
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Start merging `a` and `b`
    ///
    /// Both must exist, be idle, share a tier, and that tier must have a
    /// mergeable successor. On success both are flagged and cross-linked.
    pub fn begin(
        &mut self,
        registry: &mut EnemyRegistry,
        a: EnemyId,
        b: EnemyId,
        game_time: f32,
    ) -> Result<(), MergeRejection> {
        if a == b {
            return Err(MergeRejection::SelfPair(a));
        }
        for id in [a, b] {
            if registry.get(id).is_none() {
                return Err(MergeRejection::Missing(id));
            }
        }
        let Some((ea, eb)) = registry.get_pair_mut(a, b) else {
            return Err(MergeRejection::Missing(b));
        };

        if ea.merging {
            return Err(MergeRejection::AlreadyMerging(a));
        }
        if eb.merging {
            return Err(MergeRejection::AlreadyMerging(b));
        }
        if ea.tier != eb.tier {
            return Err(MergeRejection::TierMismatch);
        }
        if !ea.tier.can_merge() {
            return Err(MergeRejection::NotMergeable(ea.tier));
        }

        let total = ea.mass + eb.mass;
        let centroid = (ea.position * ea.mass + eb.position * eb.mass) * (1.0 / total);

        ea.merging = true;
        ea.merge_target = Some(b);
        eb.merging = true;
        eb.merge_target = Some(a);

        self.pending.push(PendingMerge {
            a,
            b,
            tier: ea.tier,
            start_a: ea.position,
            start_b: eb.position,
            centroid,
            elapsed: 0.0,
            started_at: game_time,
        });
        Ok(())
    }

    /// Advance every pending merge by `dt`
    ///
    /// Returns completion and abort notifications, plus a spawn snapshot for
    /// each successor.
    pub fn update(&mut self, registry: &mut EnemyRegistry, dt: f32) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let duration = self.duration;

        self.pending.retain_mut(|merge| {
            let intact = matches!(
                registry.get_pair_mut(merge.a, merge.b),
                Some((ea, eb)) if ea.is_alive() && eb.is_alive()
            );
            if !intact {
                abort(registry, merge);
                events.push(SimEvent::MergeAborted { a: merge.a, b: merge.b });
                return false;
            }

            merge.elapsed += dt;
            let progress = (merge.elapsed / duration).min(1.0);
            let eased = progress * progress;

            if let Some((ea, eb)) = registry.get_pair_mut(merge.a, merge.b) {
                ea.position = merge.start_a.lerp(merge.centroid, eased);
                eb.position = merge.start_b.lerp(merge.centroid, eased);
                ea.render_scale = 1.0 - SHRINK * eased;
                eb.render_scale = 1.0 - SHRINK * eased;
            }

            if progress >= 1.0 {
                complete(registry, merge, duration, &mut events);
                return false;
            }
            true
        });

        events
    }
}

impl Default for MergeCoordinator {
    fn default() -> Self {
        Self::new(DURATION)
    }
}

/// Unflag whichever participants are still around
fn abort(registry: &mut EnemyRegistry, merge: &PendingMerge) {
    for id in [merge.a, merge.b] {
        if let Some(e) = registry.get_mut(id) {
            e.merging = false;
            e.merge_target = None;
            e.render_scale = 1.0;
        }
    }
    debug!(a = merge.a, b = merge.b, "Merge aborted");
}

fn complete(registry: &mut EnemyRegistry, merge: &PendingMerge, duration: f32, events: &mut Vec<SimEvent>) {
    let Some(successor) = merge.tier.successor() else {
        warn!(tier = ?merge.tier, "Merge of a tier with no successor");
        abort(registry, merge);
        events.push(SimEvent::MergeAborted { a: merge.a, b: merge.b });
        return;
    };

    let (Some(ea), Some(eb)) = (registry.remove(merge.a), registry.remove(merge.b)) else {
        warn!(a = merge.a, b = merge.b, "Merge participants vanished on completion");
        events.push(SimEvent::MergeAborted { a: merge.a, b: merge.b });
        return;
    };

    let total_mass = ea.mass + eb.mass;
    let velocity = (ea.momentum() + eb.momentum()) * (1.0 / total_mass);
    let health_ratio = (ea.health_ratio() + eb.health_ratio()) * 0.5;
    let overrides = SpawnOverrides {
        variant: Some(heavier(&ea, &eb).variant),
        velocity: Some(velocity),
        health_ratio: Some(health_ratio),
    };

    let game_time = merge.started_at + duration;
    match registry.spawn_at_tier(merge.centroid, successor, game_time, overrides) {
        Some(new_id) => {
            debug!(a = ea.id, b = eb.id, new_id, tier = ?successor, "Merge completed");
            events.push(SimEvent::MergeCompleted {
                a: ea.id,
                b: eb.id,
                x: merge.centroid.x,
                y: merge.centroid.y,
                mass1: ea.mass,
                mass2: eb.mass,
                total_mass,
                new_id,
                tier: successor,
            });
            if let Some(enemy) = registry.get(new_id) {
                events.push(SimEvent::EnemySpawned { enemy: enemy.clone() });
            }
        }
        None => {
            warn!(a = ea.id, b = eb.id, "Successor spawn refused after merge");
        }
    }
}

/// Heavier of two enemies; the lower id wins a tie
fn heavier<'a>(a: &'a Enemy, b: &'a Enemy) -> &'a Enemy {
    if a.mass > b.mass || (a.mass == b.mass && a.id < b.id) {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Variant;

    const TICK: f32 = 1.0 / 60.0;

    fn spawn(registry: &mut EnemyRegistry, tier: Tier, variant: Variant, position: Vec2, velocity: Vec2) -> EnemyId {
        registry
            .spawn_at_tier(
                position,
                tier,
                0.0,
                SpawnOverrides {
                    variant: Some(variant),
                    velocity: Some(velocity),
                    health_ratio: None,
                },
            )
            .unwrap()
    }

    fn run_to_completion(coordinator: &mut MergeCoordinator, registry: &mut EnemyRegistry) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for _ in 0..120 {
            events.extend(coordinator.update(registry, TICK));
            if coordinator.is_idle() {
                break;
            }
        }
        events
    }

    #[test]
    fn test_begin_flags_and_links() {
        let mut registry = EnemyRegistry::new(10, 1);
        let mut coordinator = MergeCoordinator::default();
        let a = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let b = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::new(10.0, 0.0), Vec2::ZERO);

        coordinator.begin(&mut registry, a, b, 3.0).unwrap();
        let ea = registry.get(a).unwrap();
        let eb = registry.get(b).unwrap();
        assert!(ea.merging && eb.merging);
        assert_eq!(ea.merge_target, Some(b));
        assert_eq!(eb.merge_target, Some(a));
        assert_eq!(coordinator.pending()[0].started_at, 3.0);

        assert_eq!(
            coordinator.begin(&mut registry, a, b, 3.0),
            Err(MergeRejection::AlreadyMerging(a))
        );
    }

    #[test]
    fn test_begin_rejections() {
        let mut registry = EnemyRegistry::new(10, 1);
        let mut coordinator = MergeCoordinator::default();
        let small = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let medium = spawn(&mut registry, Tier::Medium, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let boss1 = spawn(&mut registry, Tier::Boss, Variant::Charger, Vec2::ZERO, Vec2::ZERO);
        let boss2 = spawn(&mut registry, Tier::Boss, Variant::Charger, Vec2::ZERO, Vec2::ZERO);

        assert_eq!(
            coordinator.begin(&mut registry, small, medium, 0.0),
            Err(MergeRejection::TierMismatch)
        );
        assert_eq!(
            coordinator.begin(&mut registry, boss1, boss2, 0.0),
            Err(MergeRejection::NotMergeable(Tier::Boss))
        );
        assert_eq!(
            coordinator.begin(&mut registry, small, 999, 0.0),
            Err(MergeRejection::Missing(999))
        );
        assert_eq!(
            coordinator.begin(&mut registry, small, small, 0.0),
            Err(MergeRejection::SelfPair(small))
        );
        assert!(coordinator.is_idle());
        assert!(!registry.get(boss1).unwrap().merging);
    }

    #[test]
    fn test_animation_moves_toward_centroid_and_shrinks() {
        let mut registry = EnemyRegistry::new(10, 1);
        let mut coordinator = MergeCoordinator::default();
        let a = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let b = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::new(20.0, 0.0), Vec2::ZERO);
        coordinator.begin(&mut registry, a, b, 0.0).unwrap();

        coordinator.update(&mut registry, DURATION * 0.5);
        let ea = registry.get(a).unwrap();
        // progress 0.5, eased 0.25
        assert!((ea.position.x - 2.5).abs() < 1e-4);
        assert!((ea.render_scale - (1.0 - SHRINK * 0.25)).abs() < 1e-5);
    }

    #[test]
    fn test_completion_conserves_momentum() {
        let mut registry = EnemyRegistry::new(10, 1);
        let mut coordinator = MergeCoordinator::default();
        let a = spawn(&mut registry, Tier::Small, Variant::Charger, Vec2::ZERO, Vec2::new(12.0, -4.0));
        let b = spawn(&mut registry, Tier::Small, Variant::Weaver, Vec2::new(8.0, 0.0), Vec2::new(-3.0, 9.0));
        let before = registry.get(a).unwrap().momentum() + registry.get(b).unwrap().momentum();
        let total = registry.get(a).unwrap().mass + registry.get(b).unwrap().mass;

        coordinator.begin(&mut registry, a, b, 0.0).unwrap();
        let events = run_to_completion(&mut coordinator, &mut registry);

        let new_id = events
            .iter()
            .find_map(|e| match e {
                SimEvent::MergeCompleted { a: src_a, b: src_b, new_id, total_mass, tier, .. } => {
                    assert_eq!((*src_a, *src_b), (a, b));
                    assert!((total_mass - total).abs() < 1e-5);
                    assert_eq!(*tier, Tier::Medium);
                    Some(*new_id)
                }
                _ => None,
            })
            .unwrap();

        assert!(registry.get(a).is_none());
        assert!(registry.get(b).is_none());
        let merged = registry.get(new_id).unwrap();
        assert!((merged.velocity * total).approx_eq(before, 1e-3));
        // Charger is heavier than Weaver
        assert_eq!(merged.variant, Variant::Charger);
        assert!(!merged.merging);
        assert_eq!(merged.render_scale, 1.0);
        assert!(events.iter().any(|e| matches!(e, SimEvent::EnemySpawned { .. })));
    }

    #[test]
    fn test_health_ratio_carried() {
        let mut registry = EnemyRegistry::new(10, 1);
        let mut coordinator = MergeCoordinator::default();
        let a = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let b = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::new(5.0, 0.0), Vec2::ZERO);
        let half = registry.get(a).unwrap().max_health * 0.5;
        registry.get_mut(a).unwrap().health = half;

        coordinator.begin(&mut registry, a, b, 0.0).unwrap();
        let events = run_to_completion(&mut coordinator, &mut registry);
        let new_id = events
            .iter()
            .find_map(|e| match e {
                SimEvent::MergeCompleted { new_id, .. } => Some(*new_id),
                _ => None,
            })
            .unwrap();
        assert!((registry.get(new_id).unwrap().health_ratio() - 0.75).abs() < 1e-4);
    }

    #[test]
    fn test_tie_keeps_lower_id_variant() {
        let mut registry = EnemyRegistry::new(10, 1);
        let mut coordinator = MergeCoordinator::default();
        // Orbiter and Phantom differ in mass; force a tie
        let a = spawn(&mut registry, Tier::Small, Variant::Orbiter, Vec2::ZERO, Vec2::ZERO);
        let b = spawn(&mut registry, Tier::Small, Variant::Phantom, Vec2::new(5.0, 0.0), Vec2::ZERO);
        registry.get_mut(b).unwrap().mass = registry.get(a).unwrap().mass;

        coordinator.begin(&mut registry, a, b, 0.0).unwrap();
        let events = run_to_completion(&mut coordinator, &mut registry);
        let new_id = events
            .iter()
            .find_map(|e| match e {
                SimEvent::MergeCompleted { new_id, .. } => Some(*new_id),
                _ => None,
            })
            .unwrap();
        assert_eq!(registry.get(new_id).unwrap().variant, Variant::Orbiter);
    }

    #[test]
    fn test_abort_when_participant_dies() {
        let mut registry = EnemyRegistry::new(10, 1);
        let mut coordinator = MergeCoordinator::default();
        let a = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let b = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::new(5.0, 0.0), Vec2::ZERO);
        coordinator.begin(&mut registry, a, b, 0.0).unwrap();
        coordinator.update(&mut registry, TICK);

        registry.get_mut(b).unwrap().health = 0.0;
        let events = coordinator.update(&mut registry, TICK);
        assert!(matches!(events.as_slice(), [SimEvent::MergeAborted { .. }]));
        assert!(coordinator.is_idle());

        let survivor = registry.get(a).unwrap();
        assert!(!survivor.merging);
        assert_eq!(survivor.merge_target, None);
        assert_eq!(survivor.render_scale, 1.0);
    }

    #[test]
    fn test_abort_when_participant_removed() {
        let mut registry = EnemyRegistry::new(10, 1);
        let mut coordinator = MergeCoordinator::default();
        let a = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let b = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::new(5.0, 0.0), Vec2::ZERO);
        coordinator.begin(&mut registry, a, b, 0.0).unwrap();
        registry.remove(a);

        let events = coordinator.update(&mut registry, TICK);
        assert_eq!(events.len(), 1);
        assert!(!registry.get(b).unwrap().merging);
    }

    #[test]
    fn test_heavier_tie_break() {
        let mut registry = EnemyRegistry::new(10, 1);
        let a = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let b = spawn(&mut registry, Tier::Small, Variant::Drifter, Vec2::ZERO, Vec2::ZERO);
        let ea = registry.get(a).unwrap().clone();
        let eb = registry.get(b).unwrap().clone();
        assert_eq!(heavier(&ea, &eb).id, a);
        assert_eq!(heavier(&eb, &ea).id, a);
    }
}
