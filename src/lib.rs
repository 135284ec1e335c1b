//! Void Drift simulation core
//!
//! A chunked, procedurally generated 2D space world. The world is split into
//! square chunks that are generated lazily around the player and frozen when
//! far away. Each tick applies player intents, integrates motion, streams
//! chunks, runs AI and station spawners, and resolves local collisions.
//!
//! The entry point is [`game::world::Simulation`].

pub mod config;
pub mod game;
pub mod util;
