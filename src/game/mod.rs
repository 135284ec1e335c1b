pub mod chunk;
pub mod constants;
pub mod entity;
pub mod events;
pub mod generation;
pub mod input;
pub mod snapshot;
pub mod state;
pub mod streaming;
pub mod systems;
pub mod world;
