pub mod behavior;
pub mod collision;
pub mod merge;
pub mod projectile;
pub mod spawner;
