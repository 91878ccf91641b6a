pub mod constants;
pub mod events;
pub mod formation;
pub mod registry;
pub mod rng;
pub mod simulation;
pub mod state;
pub mod systems;
pub mod world_gen;
