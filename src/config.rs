use serde::{Deserialize, Serialize};

use crate::game::constants::{generation, physics, world};

/// Chunk content weights for the procedural generator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub empty_weight: f32,
    pub asteroid_weight: f32,
    pub enemy_station_weight: f32,
    pub friendly_station_weight: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            empty_weight: generation::EMPTY_WEIGHT,
            asteroid_weight: generation::ASTEROID_WEIGHT,
            enemy_station_weight: generation::ENEMY_STATION_WEIGHT,
            friendly_station_weight: generation::FRIENDLY_STATION_WEIGHT,
        }
    }
}

impl GenerationConfig {
    /// A world with no generated content at all
    pub fn empty_space() -> Self {
        Self {
            empty_weight: 1.0,
            asteroid_weight: 0.0,
            enemy_station_weight: 0.0,
            friendly_station_weight: 0.0,
        }
    }
}

/// Simulation configuration, read-only for the core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// World units per chunk side
    pub chunk_size: f32,
    /// Chebyshev chunk radius kept active around the player
    pub load_distance: i32,
    /// Seed for procedural generation and AI randomness
    pub world_seed: u64,
    /// Ticks per second driven by the runner
    pub tick_rate: u32,
    /// Chunks this close to the origin never spawn content
    pub spawn_safe_radius: i32,
    /// Chunk content weights
    pub generation: GenerationConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            chunk_size: world::CHUNK_SIZE,
            load_distance: world::LOAD_DISTANCE,
            world_seed: world::DEFAULT_SEED,
            tick_rate: physics::TICK_RATE,
            spawn_safe_radius: world::SPAWN_SAFE_RADIUS,
            generation: GenerationConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("CHUNK_SIZE") {
            match size.parse::<f32>() {
                Ok(parsed) if parsed.is_finite() && parsed >= 64.0 => config.chunk_size = parsed,
                _ => tracing::warn!("Invalid CHUNK_SIZE '{}', using default", size),
            }
        }

        if let Ok(distance) = std::env::var("LOAD_DISTANCE") {
            match distance.parse::<i32>() {
                Ok(parsed) if (0..=16).contains(&parsed) => config.load_distance = parsed,
                _ => tracing::warn!("LOAD_DISTANCE must be 0-16, got '{}', using default", distance),
            }
        }

        if let Ok(seed) = std::env::var("WORLD_SEED") {
            match seed.parse::<u64>() {
                Ok(parsed) => config.world_seed = parsed,
                Err(_) => tracing::warn!("Invalid WORLD_SEED '{}', using default", seed),
            }
        }

        if let Ok(rate) = std::env::var("TICK_RATE") {
            match rate.parse::<u32>() {
                Ok(parsed) if (1..=240).contains(&parsed) => config.tick_rate = parsed,
                _ => tracing::warn!("TICK_RATE must be 1-240, got '{}', using default", rate),
            }
        }

        if let Ok(radius) = std::env::var("SPAWN_SAFE_RADIUS") {
            match radius.parse::<i32>() {
                Ok(parsed) if parsed >= 0 => config.spawn_safe_radius = parsed,
                _ => tracing::warn!("Invalid SPAWN_SAFE_RADIUS '{}', using default", radius),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if !self.chunk_size.is_finite() || self.chunk_size <= 0.0 {
            return Err("chunk_size must be a positive number".to_string());
        }
        if self.load_distance < 0 {
            return Err("load_distance cannot be negative".to_string());
        }
        if self.tick_rate == 0 {
            return Err("tick_rate must be at least 1".to_string());
        }
        if self.spawn_safe_radius < 0 {
            return Err("spawn_safe_radius cannot be negative".to_string());
        }
        let g = &self.generation;
        let weights = [
            g.empty_weight,
            g.asteroid_weight,
            g.enemy_station_weight,
            g.friendly_station_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("generation weights must be finite and non-negative".to_string());
        }
        if weights.iter().sum::<f32>() <= 0.0 {
            return Err("at least one generation weight must be positive".to_string());
        }
        Ok(())
    }

    /// Seconds per tick at the configured tick rate
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
