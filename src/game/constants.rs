/// Simulation clock constants
pub mod physics {
    /// Default simulation tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / 60.0;
    /// Default stage friction (fraction of velocity removed per second)
    pub const DEFAULT_FRICTION: f32 = 0.8;
}

/// Enemy stat derivation
pub mod enemy {
    /// Base movement speed in units per second before tier/variant scaling
    pub const BASE_SPEED: f32 = 80.0;
    /// Base health before difficulty/tier/variant scaling
    pub const BASE_HEALTH: f32 = 3.0;
    /// Base mass before tier/variant scaling
    pub const BASE_MASS: f32 = 2.0;
    /// Random speed jitter range applied at spawn
    pub const SPEED_JITTER_MIN: f32 = 0.8;
    pub const SPEED_JITTER_MAX: f32 = 1.2;
    /// Time horizon (seconds) over which difficulty ramps
    pub const DIFFICULTY_HORIZON: f32 = 600.0;
    /// Exponent of the difficulty ramp curve
    pub const DIFFICULTY_EXPONENT: f32 = 1.5;
    /// Multiplier reached at the end of the horizon (on top of 1.0)
    pub const DIFFICULTY_SCALE: f32 = 3.0;
}

/// Spawn placement and admission control
pub mod spawn {
    /// Hard cap on live enemies; the only bound on the O(n²) collision pass
    pub const MAX_ENEMY_COUNT: usize = 50;
    /// Radial distance from the player at which edge spawns appear
    pub const EDGE_SPAWN_DISTANCE: f32 = 700.0;
    /// Angular spread (radians) for grouped spawns sharing a fixed angle
    pub const GROUP_ANGLE_SPREAD: f32 = 0.35;
    /// Enemies farther than this from the camera are removed
    pub const CLEANUP_MARGIN: f32 = 1400.0;
    /// Distance from the player at which wave formations are centered
    pub const FORMATION_RADIUS: f32 = 520.0;
}

/// Behavior state machine tuning
pub mod behavior {
    /// Steering acceleration as a multiple of the enemy's speed stat, per second
    pub const CHASE_ACCEL: f32 = 3.0;
    /// Velocity cap multiplier for all behaviors except an active charge
    pub const SPEED_CAP: f32 = 2.0;
    /// Velocity cap multiplier while charging
    pub const CHARGE_SPEED_CAP: f32 = 4.0;

    /// Acceleration factor while resting between charges
    pub const CHARGE_REST_ACCEL: f32 = 0.5;
    /// Cooldown between charges (seconds)
    pub const CHARGE_COOLDOWN: f32 = 2.5;
    /// Player must be within this radius for a charge to start
    pub const CHARGE_TRIGGER_RADIUS: f32 = 350.0;
    /// Burst speed as a multiple of the speed stat
    pub const CHARGE_BURST: f32 = 3.5;
    /// Duration of a charge (seconds)
    pub const CHARGE_DURATION: f32 = 0.6;

    /// Orbit radius around the player
    pub const ORBIT_RADIUS: f32 = 180.0;
    /// Orbit angular rate (radians per second)
    pub const ORBIT_ANGULAR_RATE: f32 = 1.2;

    /// Teleport cooldown (seconds)
    pub const TELEPORT_COOLDOWN: f32 = 3.0;
    /// Fraction of the distance to the player covered by a jump
    pub const TELEPORT_FRACTION: f32 = 0.5;
    /// Random offset added to the landing point, per axis
    pub const TELEPORT_OFFSET: f32 = 80.0;
    /// Acceleration factor between jumps
    pub const TELEPORT_CHASE_ACCEL: f32 = 0.6;
    /// Fade oscillation rate (radians per second)
    pub const TELEPORT_FADE_RATE: f32 = 3.0;

    /// Flee variants approach beyond this distance
    pub const FLEE_OUTER: f32 = 320.0;
    /// Flee variants retreat inside this distance
    pub const FLEE_INNER: f32 = 200.0;
}

/// Pairwise collision constants
pub mod collision {
    /// Axis-aligned early-out distance; larger than any two radii combined
    pub const MAX_CHECK_DISTANCE: f32 = 200.0;
}

/// Merge constants
pub mod merge {
    /// Continuous overlap required before a same-tier pair merges (seconds)
    pub const THRESHOLD: f32 = 0.75;
    /// Length of the merge animation (seconds)
    pub const DURATION: f32 = 0.4;
    /// Fraction of visual scale lost by the end of the animation
    pub const SHRINK: f32 = 0.6;
}

/// Projectile constants
pub mod projectile {
    pub const BASE_SIZE: f32 = 8.0;
    pub const BASE_SPEED: f32 = 420.0;
    pub const BASE_DAMAGE: f32 = 1.0;
    pub const BASE_MASS: f32 = 1.0;
    /// Knockback gain applied to `velocity * projectile_mass / enemy_mass`
    pub const KNOCKBACK_SCALE: f32 = 0.5;
    /// Half extents of the visible region around the camera
    pub const VIEW_HALF_WIDTH: f32 = 640.0;
    pub const VIEW_HALF_HEIGHT: f32 = 360.0;
    /// Distance beyond the view at which projectiles are destroyed
    pub const WORLD_MARGIN: f32 = 200.0;
    /// Maximum live projectiles
    pub const MAX_PROJECTILES: usize = 200;
}

/// World generation constants
pub mod world_gen {
    /// Default session length in seconds
    pub const DEFAULT_DURATION: f32 = 300.0;
    /// First scheduled spawn
    pub const FIRST_SPAWN_TIME: f32 = 2.0;
    /// Fixed absolute time of the boss arrival
    pub const BOSS_SPAWN_TIME: f32 = 150.0;
    /// Spawn interval bounds
    pub const MAX_INTERVAL: f32 = 1.5;
    pub const INTERVAL_RAMP: f32 = 1.2;
    pub const MIN_INTERVAL: f32 = 0.3;
    pub const JITTER_MIN: f32 = 0.7;
    pub const JITTER_MAX: f32 = 1.3;
    /// Difficulty value mapped to the top of the normalized range
    pub const DIFFICULTY_CEILING: f32 = 10.0;
    /// Probability that a spawn event carries a fixed arrival angle
    pub const GROUPED_ANGLE_CHANCE: f32 = 0.3;

    pub const HAZARD_FIRST: f32 = 30.0;
    pub const HAZARD_INTERVAL: f32 = 45.0;
    pub const WAVE_COUNT: usize = 4;
    pub const REWARD_FIRST: f32 = 20.0;
    pub const REWARD_INTERVAL: f32 = 20.0;
    pub const REWARD_BASE_CHANCE: f32 = 0.35;
    pub const REWARD_DIFFICULTY_CHANCE: f32 = 0.15;

    pub const BLACK_HOLE_MIN_DISTANCE: f32 = 600.0;
    pub const BLACK_HOLE_MAX_DISTANCE: f32 = 1200.0;
    pub const BLACK_HOLE_MIN_MASS: f32 = 5000.0;
    pub const BLACK_HOLE_MAX_MASS: f32 = 8000.0;
}

/// Difficulty multiplier applied to enemy health at a given game time
#[inline]
pub fn difficulty_multiplier(game_time: f32) -> f32 {
    let t = (game_time.max(0.0) / enemy::DIFFICULTY_HORIZON).powf(enemy::DIFFICULTY_EXPONENT);
    1.0 + t * enemy::DIFFICULTY_SCALE
}
