//! Pairwise enemy collision and overlap tracking
//!
//! All pairs are tested each tick with an axis-aligned early-out; the enemy
//! cap bounds the pass.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::game::constants::collision::MAX_CHECK_DISTANCE;
use crate::game::constants::merge::THRESHOLD;
use crate::game::registry::EnemyRegistry;
use crate::game::state::{Enemy, EnemyId};
use crate::util::vec2::{Vec2, EPSILON};

/// Accumulated overlap seconds per same-tier pair
type OverlapMap = HashMap<u64, f32, FxBuildHasher>;

/// Pairs whose overlap reached the merge threshold this pass
pub type MergeCandidates = SmallVec<[(EnemyId, EnemyId); 4]>;

/// Order-independent key for a pair of ids
#[inline]
pub fn pair_key(a: EnemyId, b: EnemyId) -> u64 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    ((lo as u64) << 32) | hi as u64
}

#[derive(Debug, Default)]
pub struct CollisionOutcome {
    pub merge_candidates: MergeCandidates,
    /// Overlapping pairs separated physically
    pub contacts: u32,
}

pub struct CollisionResolver {
    overlap: OverlapMap,
    /// Next tick's map, swapped in at the end of each pass
    scratch: OverlapMap,
    merge_threshold: f32,
}

impl CollisionResolver {
    pub fn new(merge_threshold: f32) -> Self {
        Self {
            overlap: OverlapMap::with_capacity_and_hasher(64, FxBuildHasher),
            scratch: OverlapMap::with_capacity_and_hasher(64, FxBuildHasher),
            merge_threshold,
        }
    }

    pub fn reset(&mut self) {
        self.overlap.clear();
        self.scratch.clear();
    }

    /// Seconds a pair has been overlapping, if it currently is
    pub fn overlap_time(&self, a: EnemyId, b: EnemyId) -> Option<f32> {
        self.overlap.get(&pair_key(a, b)).copied()
    }

    #[inline]
    pub fn tracked_pairs(&self) -> usize {
        self.overlap.len()
    }

    /// Resolve every overlapping pair of live, non-merging enemies
    ///
    /// Same-tier mergeable pairs accumulate overlap time; a pair reaching the
    /// threshold is returned as a merge candidate instead of being separated.
    /// A pair touching an enemy already promoted this pass is separated and
    /// keeps its accumulated time.
    /// Entries for pairs that did not overlap this pass are dropped.
    pub fn resolve(&mut self, registry: &mut EnemyRegistry, dt: f32) -> CollisionOutcome {
        let mut outcome = CollisionOutcome::default();
        // Each enemy joins at most one candidate per pass
        let mut promoted: SmallVec<[EnemyId; 8]> = SmallVec::new();
        self.scratch.clear();

        let enemies = registry.enemies_mut();
        let n = enemies.len();

        for i in 0..n {
            let (head, tail) = enemies.split_at_mut(i + 1);
            let a = &mut head[i];
            if a.merging || !a.is_alive() {
                continue;
            }

            for b in tail.iter_mut() {
                if b.merging || !b.is_alive() {
                    continue;
                }

                let delta = b.position - a.position;
                if delta.x.abs() > MAX_CHECK_DISTANCE || delta.y.abs() > MAX_CHECK_DISTANCE {
                    continue;
                }

                let dist = delta.length();
                let min_dist = a.radius() + b.radius();
                if dist >= min_dist {
                    continue;
                }

                if a.tier == b.tier && a.tier.can_merge() {
                    let key = pair_key(a.id, b.id);
                    let elapsed = self.overlap.get(&key).copied().unwrap_or(0.0) + dt;
                    let free = !promoted.contains(&a.id) && !promoted.contains(&b.id);
                    if elapsed >= self.merge_threshold && free {
                        outcome.merge_candidates.push((a.id, b.id));
                        promoted.push(a.id);
                        promoted.push(b.id);
                        continue;
                    }
                    self.scratch.insert(key, elapsed);
                }

                let normal = if dist < EPSILON {
                    Vec2::RIGHT
                } else {
                    delta * (1.0 / dist)
                };
                separate(a, b, normal, min_dist - dist);
                outcome.contacts += 1;
            }
        }

        std::mem::swap(&mut self.overlap, &mut self.scratch);
        outcome
    }
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(THRESHOLD)
    }
}

/// Inelastic normal impulse plus a half-penetration push each
///
/// `normal` points from `a` to `b`.
fn separate(a: &mut Enemy, b: &mut Enemy, normal: Vec2, penetration: f32) {
    let approach = (b.velocity - a.velocity).dot(normal);
    if approach < 0.0 {
        let inv_a = 1.0 / a.mass;
        let inv_b = 1.0 / b.mass;
        let impulse = -approach / (inv_a + inv_b);
        a.velocity -= normal * (impulse * inv_a);
        b.velocity += normal * (impulse * inv_b);
    }

    let push = normal * (penetration * 0.5);
    a.position -= push;
    b.position += push;
}
