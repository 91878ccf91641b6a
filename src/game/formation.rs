//! Formation layouts for enemy waves
//!
//! A formation is a set of offsets around a center with a per-point delay, so
//! a wave fills in over a fraction of a second instead of popping in at once.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::rng::SimRng;
use crate::util::vec2::Vec2;

/// Ring radius around the formation center
const RING_RADIUS: f32 = 120.0;
/// Spacing between neighbours in a line
const LINE_SPACING: f32 = 48.0;
/// Arc radius and half-angle
const ARC_RADIUS: f32 = 160.0;
const ARC_HALF_ANGLE: f32 = std::f32::consts::FRAC_PI_3;
/// Cluster scatter radius
const CLUSTER_RADIUS: f32 = 80.0;

/// Stagger between consecutive points (seconds)
const RING_STAGGER: f32 = 0.08;
const LINE_STAGGER: f32 = 0.05;
const ARC_STAGGER: f32 = 0.1;
const CLUSTER_MAX_DELAY: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    Ring,
    Line,
    Arc,
    Cluster,
}

impl Formation {
    pub const ALL: [Formation; 4] = [
        Formation::Ring,
        Formation::Line,
        Formation::Arc,
        Formation::Cluster,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationPoint {
    /// Offset from the formation center
    pub offset: Vec2,
    /// Seconds after the wave fires before this point spawns
    pub delay: f32,
}

pub type FormationPoints = SmallVec<[FormationPoint; 16]>;

/// Lay out `count` points. `facing` is the unit direction from the center
/// toward the player; lines and arcs are oriented across it.
pub fn layout(formation: Formation, count: u32, facing: Vec2, rng: &mut SimRng) -> FormationPoints {
    let facing = facing.normalize_or(Vec2::RIGHT);
    let across = facing.perpendicular();
    let n = count as usize;
    let mut points = FormationPoints::with_capacity(n);

    match formation {
        Formation::Ring => {
            let step = std::f32::consts::TAU / count.max(1) as f32;
            for i in 0..n {
                points.push(FormationPoint {
                    offset: Vec2::from_angle(step * i as f32) * RING_RADIUS,
                    delay: i as f32 * RING_STAGGER,
                });
            }
        }
        Formation::Line => {
            let half = (n.saturating_sub(1)) as f32 * 0.5;
            for i in 0..n {
                points.push(FormationPoint {
                    offset: across * ((i as f32 - half) * LINE_SPACING),
                    delay: i as f32 * LINE_STAGGER,
                });
            }
        }
        Formation::Arc => {
            // Bowed away from the player, centered on the facing axis
            let base = (-facing).angle();
            let span = if n > 1 { 2.0 * ARC_HALF_ANGLE / (n - 1) as f32 } else { 0.0 };
            let start = if n > 1 { base - ARC_HALF_ANGLE } else { base };
            for i in 0..n {
                let offset = Vec2::from_angle(start + span * i as f32) * ARC_RADIUS
                    + facing * ARC_RADIUS;
                points.push(FormationPoint {
                    offset,
                    delay: i as f32 * ARC_STAGGER,
                });
            }
        }
        Formation::Cluster => {
            for _ in 0..n {
                let r = CLUSTER_RADIUS * rng.next_f32().sqrt();
                points.push(FormationPoint {
                    offset: Vec2::from_angle(rng.angle()) * r,
                    delay: rng.range(0.0, CLUSTER_MAX_DELAY),
                });
            }
        }
    }

    points
}
