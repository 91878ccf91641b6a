//! Entity definitions shared by every simulation stage
//!
//! Enemies, projectiles, the tier/variant stat tables and the per-tick inputs
//! supplied by stage configuration.

use serde::{Deserialize, Serialize};

use crate::game::constants::behavior::CHARGE_COOLDOWN;
use crate::game::constants::behavior::TELEPORT_COOLDOWN;
use crate::game::constants::physics::DEFAULT_FRICTION;
use crate::game::rng::SimRng;
use crate::util::vec2::Vec2;

/// Stable enemy identifier, unique for the lifetime of a session
pub type EnemyId = u32;

/// Projectile identifier
pub type ProjectileId = u32;

/// Ordered enemy size/strength class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Small,
    Medium,
    Large,
    Boss,
}

/// Per-tier stat row
#[derive(Debug, Clone, Copy)]
pub struct TierStats {
    pub health_mult: f32,
    pub speed_mult: f32,
    pub base_size: f32,
    /// Two overlapping enemies of this tier may combine into the next one
    pub mergeable: bool,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Small, Tier::Medium, Tier::Large, Tier::Boss];

    pub fn stats(&self) -> TierStats {
        match self {
            Tier::Small => TierStats { health_mult: 1.0, speed_mult: 1.0, base_size: 24.0, mergeable: true },
            Tier::Medium => TierStats { health_mult: 3.0, speed_mult: 0.85, base_size: 36.0, mergeable: true },
            Tier::Large => TierStats { health_mult: 8.0, speed_mult: 0.7, base_size: 52.0, mergeable: false },
            Tier::Boss => TierStats { health_mult: 40.0, speed_mult: 0.55, base_size: 96.0, mergeable: false },
        }
    }

    /// Next tier up; `None` for the terminal boss tier
    pub fn successor(&self) -> Option<Tier> {
        match self {
            Tier::Small => Some(Tier::Medium),
            Tier::Medium => Some(Tier::Large),
            Tier::Large => Some(Tier::Boss),
            Tier::Boss => None,
        }
    }

    /// Whether a same-tier pair of this tier can start a merge
    pub fn can_merge(&self) -> bool {
        self.stats().mergeable && self.successor().is_some()
    }

    /// Weighted variant table used when a spawn does not pin the variant
    fn variant_weights(&self) -> &'static [(Variant, f32)] {
        match self {
            Tier::Small => &[
                (Variant::Drifter, 40.0),
                (Variant::Weaver, 25.0),
                (Variant::Skirmisher, 20.0),
                (Variant::Orbiter, 15.0),
            ],
            Tier::Medium => &[
                (Variant::Drifter, 30.0),
                (Variant::Charger, 25.0),
                (Variant::Orbiter, 20.0),
                (Variant::Phantom, 15.0),
                (Variant::Weaver, 10.0),
            ],
            Tier::Large => &[
                (Variant::Charger, 40.0),
                (Variant::Drifter, 30.0),
                (Variant::Phantom, 30.0),
            ],
            Tier::Boss => &[(Variant::Charger, 60.0), (Variant::Orbiter, 40.0)],
        }
    }

    pub fn pick_variant(&self, rng: &mut SimRng) -> Variant {
        let table = self.variant_weights();
        let total: f32 = table.iter().map(|(_, w)| w).sum();
        let mut roll = rng.next_f32() * total;
        for &(variant, weight) in table {
            if roll < weight {
                return variant;
            }
            roll -= weight;
        }
        table[table.len() - 1].0
    }
}

/// Named sub-type selecting behavior and stat multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Straight chaser
    Drifter,
    /// Rests, then bursts toward the player
    Charger,
    /// Circles the player
    Orbiter,
    /// Sinusoidal approach
    Weaver,
    /// Fades and blinks toward the player
    Phantom,
    /// Keeps its distance
    Skirmisher,
}

#[derive(Debug, Clone, Copy)]
pub struct VariantStats {
    pub speed_mult: f32,
    pub health_mult: f32,
    pub mass_mult: f32,
    pub size_mult: f32,
}

impl Variant {
    pub fn stats(&self) -> VariantStats {
        let (speed_mult, health_mult, mass_mult, size_mult) = match self {
            Variant::Drifter => (1.0, 1.0, 1.0, 1.0),
            Variant::Charger => (0.9, 1.3, 1.4, 1.1),
            Variant::Orbiter => (1.1, 0.9, 0.9, 0.95),
            Variant::Weaver => (1.15, 0.8, 0.8, 0.9),
            Variant::Phantom => (0.8, 0.7, 0.7, 0.9),
            Variant::Skirmisher => (1.25, 0.6, 0.6, 0.85),
        };
        VariantStats { speed_mult, health_mult, mass_mult, size_mult }
    }

    /// Fresh behavior state for a newly spawned enemy of this variant
    pub fn initial_behavior(&self, rng: &mut SimRng) -> Behavior {
        match self {
            Variant::Drifter => Behavior::Chase,
            Variant::Charger => Behavior::Charge {
                phase: ChargePhase::Resting {
                    cooldown: rng.range(1.0, CHARGE_COOLDOWN),
                },
            },
            Variant::Orbiter => Behavior::Orbit { angle: rng.angle() },
            Variant::Weaver => Behavior::Zigzag {
                phase: rng.angle(),
                amplitude: 60.0,
                frequency: 5.0,
            },
            Variant::Phantom => Behavior::Teleport {
                cooldown: rng.range(1.0, TELEPORT_COOLDOWN),
                fade_phase: rng.angle(),
            },
            Variant::Skirmisher => Behavior::Flee,
        }
    }
}

/// Charge state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChargePhase {
    /// Slow chase while the cooldown runs down
    Resting { cooldown: f32 },
    /// Locked burst along `direction`
    Charging { remaining: f32, direction: Vec2 },
}

/// Active behavior with its per-behavior state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Chase,
    Charge { phase: ChargePhase },
    Orbit { angle: f32 },
    Zigzag { phase: f32, amplitude: f32, frequency: f32 },
    Teleport { cooldown: f32, fade_phase: f32 },
    Flee,
}

impl Behavior {
    pub fn is_charging(&self) -> bool {
        matches!(
            self,
            Behavior::Charge { phase: ChargePhase::Charging { .. } }
        )
    }
}

/// Live enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    // === HOT FIELDS (read every tick by movement and collision) ===
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub mass: f32,
    pub speed: f32,
    pub merging: bool,

    // === WARM FIELDS ===
    pub health: f32,
    pub max_health: f32,
    pub behavior: Behavior,
    /// Partner id while `merging`; always symmetric
    pub merge_target: Option<EnemyId>,

    // === COLD FIELDS (identity and rendering hints) ===
    pub id: EnemyId,
    pub tier: Tier,
    pub variant: Variant,
    /// Teleport fade, 1.0 for every other behavior
    pub alpha: f32,
    /// Shrink applied during a merge animation
    pub render_scale: f32,
    /// Game time the enemy was created
    pub spawned_at: f32,
}

impl Enemy {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    #[inline]
    pub fn health_ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    #[inline]
    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }
}

/// Optional overrides for `EnemyRegistry::spawn_at_tier`
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnOverrides {
    pub variant: Option<Variant>,
    pub velocity: Option<Vec2>,
    /// Fraction of the computed max health the enemy starts with
    pub health_ratio: Option<f32>,
}

/// Projectile fired by the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: ProjectileId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub mass: f32,
    pub damage: f32,
    pub bounces: u32,
    pub max_bounces: u32,
    /// Last enemy struck; skipped on the next contact test
    pub last_hit: Option<EnemyId>,
}

impl Projectile {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    #[inline]
    pub fn has_bounces_left(&self) -> bool {
        self.bounces < self.max_bounces
    }
}

/// Player upgrade multipliers that shape fired projectiles
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerStats {
    pub size_mult: f32,
    pub speed_mult: f32,
    pub damage_mult: f32,
    pub mass_mult: f32,
    /// Bounce budget per projectile
    pub bounces: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            size_mult: 1.0,
            speed_mult: 1.0,
            damage_mult: 1.0,
            mass_mult: 1.0,
            bounces: 0,
        }
    }
}

/// Swirling force field from stage configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vortex {
    pub center: Vec2,
    /// Tangential acceleration in units per second squared; sign sets spin direction
    pub strength: f32,
}

/// Per-tick physics modifiers supplied by the stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhysicsModifiers {
    pub friction: f32,
    pub vortex: Option<Vortex>,
}

impl Default for PhysicsModifiers {
    fn default() -> Self {
        Self {
            friction: DEFAULT_FRICTION,
            vortex: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Small < Tier::Medium);
        assert!(Tier::Medium < Tier::Large);
        assert!(Tier::Large < Tier::Boss);
    }

    #[test]
    fn test_boss_is_terminal() {
        assert_eq!(Tier::Boss.successor(), None);
        assert!(!Tier::Boss.can_merge());
    }

    #[test]
    fn test_successor_chain_increases() {
        for tier in Tier::ALL {
            if let Some(next) = tier.successor() {
                assert!(next > tier);
                assert!(next.stats().health_mult > tier.stats().health_mult);
                assert!(next.stats().base_size > tier.stats().base_size);
            }
        }
    }

    #[test]
    fn test_mergeable_tiers() {
        assert!(Tier::Small.can_merge());
        assert!(Tier::Medium.can_merge());
        assert!(!Tier::Large.can_merge());
    }

    #[test]
    fn test_pick_variant_respects_tier_table() {
        let mut rng = SimRng::new(11);
        for _ in 0..500 {
            let v = Tier::Boss.pick_variant(&mut rng);
            assert!(matches!(v, Variant::Charger | Variant::Orbiter));
        }
    }

    #[test]
    fn test_pick_variant_deterministic() {
        let mut a = SimRng::new(8);
        let mut b = SimRng::new(8);
        for _ in 0..50 {
            assert_eq!(Tier::Medium.pick_variant(&mut a), Tier::Medium.pick_variant(&mut b));
        }
    }

    #[test]
    fn test_initial_behavior_matches_variant() {
        let mut rng = SimRng::new(1);
        assert_eq!(Variant::Drifter.initial_behavior(&mut rng), Behavior::Chase);
        assert_eq!(Variant::Skirmisher.initial_behavior(&mut rng), Behavior::Flee);
        assert!(matches!(
            Variant::Charger.initial_behavior(&mut rng),
            Behavior::Charge { phase: ChargePhase::Resting { .. } }
        ));
        assert!(matches!(Variant::Orbiter.initial_behavior(&mut rng), Behavior::Orbit { .. }));
        assert!(matches!(Variant::Phantom.initial_behavior(&mut rng), Behavior::Teleport { .. }));
    }

    #[test]
    fn test_projectile_bounce_budget() {
        let mut p = Projectile {
            id: 0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: 8.0,
            mass: 1.0,
            damage: 1.0,
            bounces: 0,
            max_bounces: 1,
            last_hit: None,
        };
        assert!(p.has_bounces_left());
        p.bounces = 1;
        assert!(!p.has_bounces_left());
    }

    #[test]
    fn test_behavior_serialization() {
        let b = Behavior::Charge {
            phase: ChargePhase::Charging { remaining: 0.3, direction: Vec2::RIGHT },
        };
        let json = serde_json::to_string(&b).unwrap();
        let back: Behavior = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
        assert!(back.is_charging());
    }
}
