//! Procedural chunk generation
//!
//! Each coordinate has a raw roll (content and priority) that depends only on
//! the world seed and the coordinate. A chunk keeps its raw content only if no
//! neighbor out-rolls it, so two non-empty chunks are never adjacent and the
//! result does not depend on the order in which chunks are explored.

use std::f32::consts::TAU;
use std::hash::Hasher;

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::config::{GenerationConfig, SimulationConfig};
use crate::game::chunk::{ChunkCoord, IdAllocator};
use crate::game::constants::{asteroid, generation, particles, station};
use crate::game::entity::{Entity, ParticleSystem, Ship, ShipRole, Station};
use crate::game::systems::ai::Anchor;
use crate::util::vec2::Vec2;

/// Salt for the raw content roll
const ROLL_SALT: u64 = 0x0C0F_FEE5;
/// Salt for template placement
const TEMPLATE_SALT: u64 = 0x7E3A_11A7;

/// What a chunk was generated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkContent {
    Empty,
    Asteroids,
    EnemyStation,
    FriendlyStation,
}

impl ChunkContent {
    /// Weighted draw order, matching `GenerationConfig::weights`
    const ALL: [ChunkContent; 4] = [
        ChunkContent::Empty,
        ChunkContent::Asteroids,
        ChunkContent::EnemyStation,
        ChunkContent::FriendlyStation,
    ];

    #[inline]
    pub fn is_empty(self) -> bool {
        self == ChunkContent::Empty
    }
}

impl GenerationConfig {
    fn weights(&self) -> [f32; 4] {
        [
            self.empty_weight,
            self.asteroid_weight,
            self.enemy_station_weight,
            self.friendly_station_weight,
        ]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid content weights: {0}")]
    InvalidWeights(#[from] WeightedError),
}

/// Result of generating one chunk; entities already carry their ids
#[derive(Debug)]
pub struct GeneratedChunk {
    pub coord: ChunkCoord,
    pub content: ChunkContent,
    pub entities: Vec<Entity>,
}

/// Content and tie-break priority a coordinate rolls before neighbor suppression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRoll {
    pub content: ChunkContent,
    pub priority: u64,
}

/// Deterministic RNG from a list of hash inputs
pub fn seeded_rng(parts: &[u64]) -> StdRng {
    let mut hasher = FxHasher::default();
    for &part in parts {
        hasher.write_u64(part);
    }
    StdRng::seed_from_u64(hasher.finish())
}

#[inline]
fn coord_bits(value: i32) -> u64 {
    value as i64 as u64
}

/// Pure mapping from (seed, coordinate) to chunk content
#[derive(Debug, Clone)]
pub struct ProceduralGenerator {
    seed: u64,
    chunk_size: f32,
    spawn_safe_radius: i32,
    weights: GenerationConfig,
}

impl ProceduralGenerator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            seed: config.world_seed,
            chunk_size: config.chunk_size,
            spawn_safe_radius: config.spawn_safe_radius,
            weights: config.generation.clone(),
        }
    }

    fn in_safe_zone(&self, coord: ChunkCoord) -> bool {
        coord.chebyshev_distance(ChunkCoord::new(0, 0)) <= self.spawn_safe_radius
    }

    /// Content the coordinate would have in isolation
    pub fn raw_roll(&self, coord: ChunkCoord) -> Result<RawRoll, GenerationError> {
        let mut rng = seeded_rng(&[self.seed, coord_bits(coord.x), coord_bits(coord.y), ROLL_SALT]);
        let dist = WeightedIndex::new(self.weights.weights())?;
        let content = ChunkContent::ALL[dist.sample(&mut rng)];
        let priority = rng.gen::<u64>();
        if self.in_safe_zone(coord) {
            return Ok(RawRoll { content: ChunkContent::Empty, priority });
        }
        Ok(RawRoll { content, priority })
    }

    /// Content after neighbor suppression.
    ///
    /// `existing` lists neighbors that already exist in the store; any non-empty
    /// one forces this chunk empty.
    pub fn resolve_content(
        &self,
        coord: ChunkCoord,
        existing: &[(ChunkCoord, ChunkContent)],
    ) -> Result<ChunkContent, GenerationError> {
        let own = self.raw_roll(coord)?;
        if own.content.is_empty() {
            return Ok(ChunkContent::Empty);
        }

        if existing
            .iter()
            .any(|&(n, content)| n.chebyshev_distance(coord) == 1 && !content.is_empty())
        {
            return Ok(ChunkContent::Empty);
        }

        for neighbor in coord.neighbors() {
            let other = self.raw_roll(neighbor)?;
            if other.content.is_empty() {
                continue;
            }
            if (other.priority, neighbor) > (own.priority, coord) {
                return Ok(ChunkContent::Empty);
            }
        }

        Ok(own.content)
    }

    /// Generate the content and entities for `coord`
    pub fn generate(
        &self,
        coord: ChunkCoord,
        existing: &[(ChunkCoord, ChunkContent)],
        ids: &mut IdAllocator,
    ) -> Result<GeneratedChunk, GenerationError> {
        let content = self.resolve_content(coord, existing)?;
        let mut rng = seeded_rng(&[self.seed, coord_bits(coord.x), coord_bits(coord.y), TEMPLATE_SALT]);

        let mut entities = match content {
            ChunkContent::Empty => Vec::new(),
            ChunkContent::Asteroids => self.asteroid_field(coord, &mut rng),
            ChunkContent::EnemyStation => self.enemy_outpost(coord, &mut rng, ids),
            ChunkContent::FriendlyStation => self.friendly_outpost(coord, &mut rng, ids),
        };

        // Templates must stay inside their own chunk
        let min = coord.origin(self.chunk_size);
        let max = min + Vec2::new(self.chunk_size, self.chunk_size);
        let inset = self.chunk_size * 0.01;
        for entity in &mut entities {
            entity.position.x = entity.position.x.clamp(min.x + inset, max.x - inset);
            entity.position.y = entity.position.y.clamp(min.y + inset, max.y - inset);
            entity.origin = entity.position;
            if entity.id == 0 {
                entity.id = ids.next_id();
            }
        }

        Ok(GeneratedChunk { coord, content, entities })
    }

    fn asteroid_field(&self, coord: ChunkCoord, rng: &mut StdRng) -> Vec<Entity> {
        let origin = coord.origin(self.chunk_size);
        let margin = asteroid::EDGE_MARGIN.min(self.chunk_size * 0.15);
        let span = (self.chunk_size - 2.0 * margin).max(1.0);
        let count = rng.gen_range(asteroid::MIN_COUNT..=asteroid::MAX_COUNT);

        (0..count)
            .map(|_| {
                let position = origin + Vec2::new(margin + rng.gen::<f32>() * span, margin + rng.gen::<f32>() * span);
                let radius = rng.gen_range(asteroid::MIN_RADIUS..=asteroid::MAX_RADIUS);
                let drift = Vec2::from_polar(rng.gen::<f32>() * TAU, rng.gen::<f32>() * asteroid::MAX_DRIFT);
                Entity::asteroid(position, radius)
                    .with_velocity(drift)
                    .with_rotation(rng.gen::<f32>() * TAU)
                    .with_spin(rng.gen_range(-asteroid::MAX_SPIN..=asteroid::MAX_SPIN))
            })
            .collect()
    }

    fn enemy_outpost(&self, coord: ChunkCoord, rng: &mut StdRng, ids: &mut IdAllocator) -> Vec<Entity> {
        let center = coord.center(self.chunk_size);
        let station_id = ids.next_id();
        let mothership_id = ids.next_id();

        let mut entities = Vec::with_capacity(2 + generation::ESCORTS_PER_MOTHERSHIP);
        let mut station_entity = Entity::station(center, Station::enemy()).with_spin(station::SPIN);
        station_entity.id = station_id;
        entities.push(station_entity);

        let mothership_pos = center + Vec2::from_polar(rng.gen::<f32>() * TAU, self.chunk_size * 0.25);
        let escort_spacing = self.chunk_size * 0.1;
        let mut escort_ids = Vec::with_capacity(generation::ESCORTS_PER_MOTHERSHIP);
        for i in 0..generation::ESCORTS_PER_MOTHERSHIP {
            let angle = i as f32 * TAU / generation::ESCORTS_PER_MOTHERSHIP as f32;
            let mut escort = Entity::ship(mothership_pos + Vec2::from_polar(angle, escort_spacing), Ship::escort(mothership_id))
                .with_rotation(angle);
            escort.id = ids.next_id();
            escort_ids.push(escort.id);
            entities.push(escort);
        }

        let mut mothership = Ship::mothership(Anchor::Entity(station_id));
        mothership.role = ShipRole::Mothership { escorts: escort_ids };
        let mut mothership_entity = Entity::ship(mothership_pos, mothership);
        mothership_entity.id = mothership_id;
        entities.push(mothership_entity);

        entities
    }

    fn friendly_outpost(&self, coord: ChunkCoord, rng: &mut StdRng, ids: &mut IdAllocator) -> Vec<Entity> {
        let center = coord.center(self.chunk_size);
        let station_id = ids.next_id();

        let mut entities = Vec::with_capacity(4);
        let mut station_entity = Entity::station(center, Station::friendly()).with_spin(station::SPIN);
        station_entity.id = station_id;
        entities.push(station_entity);

        let beacon_offset = particles::BEACON_OFFSET.min(self.chunk_size * 0.15);
        entities.push(Entity::particles(center + Vec2::new(beacon_offset, 0.0), ParticleSystem::beacon()));

        let traders = rng.gen_range(1..=2);
        for _ in 0..traders {
            let position = center + Vec2::from_polar(rng.gen::<f32>() * TAU, self.chunk_size * 0.3);
            entities.push(Entity::ship(position, Ship::trader(Anchor::Entity(station_id))));
        }

        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::EntityKind;

    fn generator_with(weights: GenerationConfig) -> ProceduralGenerator {
        ProceduralGenerator::new(&SimulationConfig {
            generation: weights,
            spawn_safe_radius: 0,
            ..SimulationConfig::default()
        })
    }

    fn only(content: ChunkContent) -> GenerationConfig {
        let mut weights = GenerationConfig::empty_space();
        weights.empty_weight = 0.0;
        match content {
            ChunkContent::Empty => weights.empty_weight = 1.0,
            ChunkContent::Asteroids => weights.asteroid_weight = 1.0,
            ChunkContent::EnemyStation => weights.enemy_station_weight = 1.0,
            ChunkContent::FriendlyStation => weights.friendly_station_weight = 1.0,
        }
        weights
    }

    #[test]
    fn test_raw_roll_is_deterministic() {
        let a = generator_with(GenerationConfig::default());
        let b = generator_with(GenerationConfig::default());
        for x in -5..5 {
            for y in -5..5 {
                let coord = ChunkCoord::new(x, y);
                assert_eq!(a.raw_roll(coord).unwrap(), b.raw_roll(coord).unwrap());
            }
        }
    }

    #[test]
    fn test_seed_changes_world() {
        let a = generator_with(GenerationConfig::default());
        let mut b = a.clone();
        b.seed = a.seed.wrapping_add(1);
        let differs = (0..50).any(|x| {
            let coord = ChunkCoord::new(x, 3);
            a.raw_roll(coord).unwrap() != b.raw_roll(coord).unwrap()
        });
        assert!(differs);
    }

    #[test]
    fn test_resolved_chunks_never_adjacent() {
        let generator = generator_with(GenerationConfig::default());
        let mut grid = hashbrown::HashMap::new();
        for x in -12..12 {
            for y in -12..12 {
                let coord = ChunkCoord::new(x, y);
                grid.insert(coord, generator.resolve_content(coord, &[]).unwrap());
            }
        }
        let mut non_empty = 0;
        for (&coord, &content) in &grid {
            if content.is_empty() {
                continue;
            }
            non_empty += 1;
            for n in coord.neighbors() {
                if let Some(other) = grid.get(&n) {
                    assert!(other.is_empty(), "{} and {} both non-empty", coord, n);
                }
            }
        }
        assert!(non_empty > 0);
    }

    #[test]
    fn test_existing_neighbor_suppresses() {
        let generator = generator_with(only(ChunkContent::Asteroids));
        let coord = ChunkCoord::new(3, 2);
        let existing = [(ChunkCoord::new(2, 2), ChunkContent::Asteroids)];
        assert_eq!(generator.resolve_content(coord, &existing).unwrap(), ChunkContent::Empty);
    }

    #[test]
    fn test_safe_zone_is_empty() {
        let generator = ProceduralGenerator::new(&SimulationConfig {
            generation: only(ChunkContent::Asteroids),
            spawn_safe_radius: 2,
            ..SimulationConfig::default()
        });
        for coord in ChunkCoord::new(0, 0).neighborhood(2) {
            assert_eq!(generator.resolve_content(coord, &[]).unwrap(), ChunkContent::Empty);
        }
    }

    #[test]
    fn test_invalid_weights_error() {
        let generator = generator_with(GenerationConfig {
            empty_weight: 0.0,
            asteroid_weight: 0.0,
            enemy_station_weight: 0.0,
            friendly_station_weight: 0.0,
        });
        let mut ids = IdAllocator::default();
        assert!(generator.generate(ChunkCoord::new(4, 4), &[], &mut ids).is_err());
    }

    #[test]
    fn test_asteroid_template() {
        let generator = generator_with(only(ChunkContent::Asteroids));
        let mut ids = IdAllocator::default();
        let chunks: Vec<GeneratedChunk> = ChunkCoord::new(20, -3)
            .neighborhood(6)
            .map(|coord| generator.generate(coord, &[], &mut ids).unwrap())
            .collect();

        // Chunks that lost the priority contest against a neighbor stay empty
        for chunk in chunks.iter().filter(|c| c.content == ChunkContent::Empty) {
            assert!(chunk.entities.is_empty());
        }

        let fields: Vec<&GeneratedChunk> = chunks.iter().filter(|c| c.content == ChunkContent::Asteroids).collect();
        assert!(!fields.is_empty());
        for chunk in fields {
            assert!((asteroid::MIN_COUNT..=asteroid::MAX_COUNT).contains(&chunk.entities.len()));
            for entity in &chunk.entities {
                assert!(entity.is_asteroid());
                assert_eq!(ChunkCoord::from_position(entity.position, generator.chunk_size), chunk.coord);
            }
        }
    }

    #[test]
    fn test_enemy_outpost_links_escorts() {
        let generator = generator_with(only(ChunkContent::EnemyStation));
        let mut ids = IdAllocator::default();
        // Find a chunk that wins its neighborhood
        let chunk = (0..256)
            .map(|x| generator.generate(ChunkCoord::new(x * 2, 7), &[], &mut ids).unwrap())
            .find(|c| c.content == ChunkContent::EnemyStation)
            .expect("some chunk should keep its station");

        let stations = chunk.entities.iter().filter(|e| e.as_station().is_some()).count();
        assert_eq!(stations, 1);

        let mothership = chunk
            .entities
            .iter()
            .find(|e| matches!(e.as_ship().map(|s| &s.role), Some(ShipRole::Mothership { .. })))
            .unwrap();
        let Some(ShipRole::Mothership { escorts }) = mothership.as_ship().map(|s| s.role.clone()) else {
            unreachable!()
        };
        assert_eq!(escorts.len(), generation::ESCORTS_PER_MOTHERSHIP);
        for escort_id in escorts {
            let escort = chunk.entities.iter().find(|e| e.id == escort_id).unwrap();
            assert_eq!(escort.as_ship().unwrap().role, ShipRole::Escort { mothership: mothership.id });
        }

        let mut all_ids: Vec<_> = chunk.entities.iter().map(|e| e.id).collect();
        all_ids.sort_unstable();
        all_ids.dedup();
        assert_eq!(all_ids.len(), chunk.entities.len());
        assert!(all_ids.iter().all(|&id| id > 0));
    }

    #[test]
    fn test_friendly_outpost_has_beacon_and_traders() {
        let generator = generator_with(only(ChunkContent::FriendlyStation));
        let mut ids = IdAllocator::default();
        let chunk = (0..256)
            .map(|y| generator.generate(ChunkCoord::new(-9, y * 2), &[], &mut ids).unwrap())
            .find(|c| c.content == ChunkContent::FriendlyStation)
            .expect("some chunk should keep its station");

        let beacons = chunk
            .entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::ParticleSystem(_)))
            .count();
        let traders = chunk
            .entities
            .iter()
            .filter(|e| e.as_ship().is_some_and(|s| s.role == ShipRole::Trader))
            .count();
        assert_eq!(beacons, 1);
        assert!((1..=2).contains(&traders));
        assert!(chunk.entities.iter().any(|e| e.as_station().is_some_and(Station::is_dockable)));
    }

    #[test]
    fn test_seeded_rng_depends_on_all_parts() {
        let a: u64 = seeded_rng(&[1, 2, 3]).gen();
        let b: u64 = seeded_rng(&[1, 2, 3]).gen();
        let c: u64 = seeded_rng(&[1, 3, 2]).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
