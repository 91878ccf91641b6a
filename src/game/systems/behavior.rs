//! Enemy steering and movement integration
//!
//! Each enemy's `Behavior` is stepped by a `match`, then every enemy goes
//! through the same post-pass: speed cap, optional vortex, stage friction and
//! position integration. Merging enemies are driven by the merge coordinator
//! and skipped here.

use crate::game::constants::behavior::*;
use crate::game::registry::EnemyRegistry;
use crate::game::rng::SimRng;
use crate::game::state::{Behavior, ChargePhase, Enemy, PhysicsModifiers, Vortex};
use crate::util::vec2::Vec2;

/// Stream index for behavior rolls (teleport offsets)
const BEHAVIOR_STREAM: u32 = 4;

pub struct BehaviorEngine {
    rng: SimRng,
}

impl BehaviorEngine {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimRng::derive(seed, BEHAVIOR_STREAM),
        }
    }

    pub fn reset(&mut self, seed: u32) {
        self.rng = SimRng::derive(seed, BEHAVIOR_STREAM);
    }

    /// Step every non-merging enemy by `dt`
    pub fn update(
        &mut self,
        registry: &mut EnemyRegistry,
        player: Vec2,
        modifiers: &PhysicsModifiers,
        dt: f32,
    ) {
        for enemy in registry.enemies_mut() {
            if enemy.merging {
                continue;
            }
            self.steer(enemy, player, dt);
            integrate(enemy, modifiers, dt);
        }
    }

    fn steer(&mut self, enemy: &mut Enemy, player: Vec2, dt: f32) {
        let to_player = player - enemy.position;
        let (dir, dist) = to_player.normalize_with_length();
        let accel = enemy.speed * CHASE_ACCEL;

        match &mut enemy.behavior {
            Behavior::Chase => {
                enemy.velocity += dir * (accel * dt);
            }
            Behavior::Charge { phase } => match *phase {
                ChargePhase::Resting { cooldown } => {
                    let cooldown = cooldown - dt;
                    if cooldown <= 0.0 && dist <= CHARGE_TRIGGER_RADIUS {
                        let direction = to_player.normalize_or(Vec2::RIGHT);
                        *phase = ChargePhase::Charging {
                            remaining: CHARGE_DURATION,
                            direction,
                        };
                        enemy.velocity = direction * (enemy.speed * CHARGE_BURST);
                    } else {
                        *phase = ChargePhase::Resting {
                            cooldown: cooldown.max(0.0),
                        };
                        enemy.velocity += dir * (accel * CHARGE_REST_ACCEL * dt);
                    }
                }
                ChargePhase::Charging { remaining, direction } => {
                    enemy.velocity = direction * (enemy.speed * CHARGE_BURST);
                    let remaining = remaining - dt;
                    *phase = if remaining <= 0.0 {
                        ChargePhase::Resting {
                            cooldown: CHARGE_COOLDOWN,
                        }
                    } else {
                        ChargePhase::Charging { remaining, direction }
                    };
                }
            },
            Behavior::Orbit { angle } => {
                *angle = (*angle + ORBIT_ANGULAR_RATE * dt) % std::f32::consts::TAU;
                let target = player + Vec2::from_angle(*angle) * ORBIT_RADIUS;
                enemy.velocity += (target - enemy.position).normalize() * (accel * dt);
            }
            Behavior::Zigzag {
                phase,
                amplitude,
                frequency,
            } => {
                *phase += *frequency * dt;
                let target = player + dir.perpendicular() * (*amplitude * phase.sin());
                enemy.velocity += (target - enemy.position).normalize() * (accel * dt);
            }
            Behavior::Teleport {
                cooldown,
                fade_phase,
            } => {
                *fade_phase = (*fade_phase + TELEPORT_FADE_RATE * dt) % std::f32::consts::TAU;
                enemy.alpha = 0.6 + 0.4 * fade_phase.sin();
                enemy.velocity += dir * (accel * TELEPORT_CHASE_ACCEL * dt);

                *cooldown -= dt;
                if *cooldown <= 0.0 {
                    let offset = Vec2::new(
                        self.rng.range(-TELEPORT_OFFSET, TELEPORT_OFFSET),
                        self.rng.range(-TELEPORT_OFFSET, TELEPORT_OFFSET),
                    );
                    enemy.position += to_player * TELEPORT_FRACTION + offset;
                    enemy.velocity = Vec2::ZERO;
                    *cooldown = TELEPORT_COOLDOWN;
                }
            }
            Behavior::Flee => {
                if dist > FLEE_OUTER {
                    enemy.velocity += dir * (accel * dt);
                } else if dist < FLEE_INNER {
                    enemy.velocity -= dir * (accel * dt);
                }
            }
        }
    }
}

/// Speed cap, vortex, friction, then position
fn integrate(enemy: &mut Enemy, modifiers: &PhysicsModifiers, dt: f32) {
    let cap = if enemy.behavior.is_charging() {
        CHARGE_SPEED_CAP
    } else {
        SPEED_CAP
    };
    enemy.velocity = enemy.velocity.clamp_length(enemy.speed * cap);

    if let Some(vortex) = &modifiers.vortex {
        enemy.velocity += vortex_acceleration(vortex, enemy.position) * dt;
    }

    enemy.velocity *= (1.0 - modifiers.friction * dt).max(0.0);
    enemy.position += enemy.velocity * dt;
}

/// Tangential pull around the vortex center
#[inline]
fn vortex_acceleration(vortex: &Vortex, position: Vec2) -> Vec2 {
    (position - vortex.center).normalize().perpendicular() * vortex.strength
}
