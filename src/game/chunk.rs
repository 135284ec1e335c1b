//! Chunk store: the world partitioned into square chunks
//!
//! Every entity lives in an id-keyed arena and is a member of exactly one
//! chunk, the one containing its position. Chunks are generated lazily on
//! first reference and never deleted.

use hashbrown::HashMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::game::entity::{Entity, EntityId};
use crate::game::generation::{ChunkContent, ProceduralGenerator};
use crate::util::vec2::Vec2;

/// Initial capacity for the chunk table
const CHUNK_TABLE_INITIAL_CAPACITY: usize = 256;

/// Initial capacity for the entity arena
const ARENA_INITIAL_CAPACITY: usize = 1024;

/// Offsets of the 8 chunks surrounding a chunk
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Chunk coordinate: floor(position / chunk_size)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing `position`; chunk ranges are half-open `[n*size, (n+1)*size)`
    #[inline]
    pub fn from_position(position: Vec2, chunk_size: f32) -> Self {
        Self {
            x: (position.x / chunk_size).floor() as i32,
            y: (position.y / chunk_size).floor() as i32,
        }
    }

    /// Saturates at the edge of the coordinate range
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Chebyshev distance in chunks
    #[inline]
    pub fn chebyshev_distance(self, other: ChunkCoord) -> i32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        i32::try_from(dx.max(dy)).unwrap_or(i32::MAX)
    }

    /// All coordinates within `radius` (Chebyshev), row by row
    pub fn neighborhood(self, radius: i32) -> impl Iterator<Item = ChunkCoord> {
        let radius = radius.max(0);
        (-radius..=radius).flat_map(move |dy| (-radius..=radius).map(move |dx| self.offset(dx, dy)))
    }

    /// The 8 surrounding chunks
    pub fn neighbors(self) -> impl Iterator<Item = ChunkCoord> {
        NEIGHBOR_OFFSETS.into_iter().map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// World position of the chunk's top-left corner
    pub fn origin(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.y as f32 * chunk_size)
    }

    pub fn center(self, chunk_size: f32) -> Vec2 {
        self.origin(chunk_size) + Vec2::new(chunk_size * 0.5, chunk_size * 0.5)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One cell of the world
#[derive(Debug, Clone)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub content: ChunkContent,
    entities: FxHashSet<EntityId>,
}

impl Chunk {
    fn new(coord: ChunkCoord, content: ChunkContent) -> Self {
        Self {
            coord,
            content,
            entities: FxHashSet::default(),
        }
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    /// Member ids in ascending order
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Monotonic entity id source
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: EntityId,
}

impl IdAllocator {
    pub fn starting_at(next: EntityId) -> Self {
        Self { next: next.max(1) }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Next id that will be handed out
    pub fn peek(&self) -> EntityId {
        self.next
    }

    /// Make sure `id` is never handed out again
    pub fn reserve(&mut self, id: EntityId) {
        if id >= self.next {
            self.next = id + 1;
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Broken chunk membership found by [`ChunkStore::check_consistency`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyViolation {
    #[error("entity {id} cached in chunk {cached:?} but positioned in {expected}")]
    WrongChunk {
        id: EntityId,
        cached: Option<ChunkCoord>,
        expected: ChunkCoord,
    },
    #[error("entity {id} is not a member of chunk {expected}")]
    MissingMembership { id: EntityId, expected: ChunkCoord },
    #[error("entity {id} is a member of {count} chunks")]
    DuplicateMembership { id: EntityId, count: usize },
    #[error("chunk {coord} lists entity {id} which is not in the arena")]
    DanglingMember { coord: ChunkCoord, id: EntityId },
}

/// Chunk table plus entity arena
pub struct ChunkStore {
    chunk_size: f32,
    chunks: HashMap<ChunkCoord, Chunk>,
    entities: HashMap<EntityId, Entity>,
    ids: IdAllocator,
    generator: ProceduralGenerator,
    /// Chunks generated since the last `take_generated`
    generated: Vec<ChunkCoord>,
}

impl ChunkStore {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunks: HashMap::with_capacity(CHUNK_TABLE_INITIAL_CAPACITY),
            entities: HashMap::with_capacity(ARENA_INITIAL_CAPACITY),
            ids: IdAllocator::default(),
            generator: ProceduralGenerator::new(config),
            generated: Vec::new(),
        }
    }

    #[inline]
    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    #[inline]
    pub fn coord_of(&self, position: Vec2) -> ChunkCoord {
        ChunkCoord::from_position(position, self.chunk_size)
    }

    // ========================================================================
    // Chunks
    // ========================================================================

    /// Existing chunk or a freshly generated one
    pub fn get_or_create(&mut self, coord: ChunkCoord) -> &Chunk {
        self.ensure_chunk(coord);
        self.chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord, ChunkContent::Empty))
    }

    /// Generate the chunk at `coord` if it does not exist yet. Returns true if created.
    pub fn ensure_chunk(&mut self, coord: ChunkCoord) -> bool {
        if self.chunks.contains_key(&coord) {
            return false;
        }

        let existing: Vec<(ChunkCoord, ChunkContent)> = coord
            .neighbors()
            .filter_map(|n| self.chunks.get(&n).map(|chunk| (n, chunk.content)))
            .collect();

        let generated = match self.generator.generate(coord, &existing, &mut self.ids) {
            Ok(generated) => generated,
            Err(e) => {
                tracing::warn!("Chunk {} generation failed, leaving it empty: {}", coord, e);
                self.chunks.insert(coord, Chunk::new(coord, ChunkContent::Empty));
                self.generated.push(coord);
                return true;
            }
        };

        tracing::debug!(
            "Generated chunk {} with {:?} ({} entities)",
            coord,
            generated.content,
            generated.entities.len()
        );

        self.chunks.insert(coord, Chunk::new(coord, generated.content));
        self.generated.push(coord);
        for entity in generated.entities {
            self.insert_entity(entity);
        }
        true
    }

    /// Create a chunk with fixed content, bypassing the generator.
    /// Returns false if the chunk already existed (its content is left alone).
    pub fn insert_chunk(&mut self, coord: ChunkCoord, content: ChunkContent) -> bool {
        if self.chunks.contains_key(&coord) {
            return false;
        }
        self.chunks.insert(coord, Chunk::new(coord, content));
        true
    }

    /// Chunk lookup that never generates
    #[inline]
    pub fn peek(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    #[inline]
    pub fn contains_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Coordinates generated since the last call
    pub fn take_generated(&mut self) -> Vec<ChunkCoord> {
        std::mem::take(&mut self.generated)
    }

    /// Snapshot of a chunk's members in id order, creating the chunk if needed
    pub fn chunk_entities(&mut self, coord: ChunkCoord) -> Vec<EntityId> {
        self.get_or_create(coord).sorted_ids()
    }

    /// Snapshot of all members of chunks within `radius` of `center`, in id order
    pub fn entities_near(&mut self, center: ChunkCoord, radius: i32) -> Vec<EntityId> {
        let mut ids = Vec::new();
        for coord in center.neighborhood(radius) {
            ids.extend(self.get_or_create(coord).entity_ids());
        }
        ids.sort_unstable();
        ids
    }

    /// Like `entities_near` but only looks at chunks that already exist
    pub fn entities_near_existing(&self, center: ChunkCoord, radius: i32) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = center
            .neighborhood(radius)
            .filter_map(|coord| self.chunks.get(&coord))
            .flat_map(|chunk| chunk.entity_ids())
            .collect();
        ids.sort_unstable();
        ids
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Add a new entity, assigning it a fresh id
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        entity.id = self.ids.next_id();
        self.insert_entity(entity)
    }

    /// Add an entity keeping its id; a live entity with the same id is replaced
    pub fn insert_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = entity.id;
        self.ids.reserve(id);
        if self.entities.contains_key(&id) {
            tracing::warn!("Entity {} inserted twice, replacing the old one", id);
            self.remove_entity(id);
        }

        let coord = self.coord_of(entity.position);
        self.ensure_chunk(coord);
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.entities.insert(id);
        }
        entity.chunk = Some(coord);
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity from its chunk and the arena. No-op if absent.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        let removed = entity
            .chunk
            .and_then(|coord| self.chunks.get_mut(&coord))
            .is_some_and(|chunk| chunk.entities.remove(&id));
        if !removed {
            tracing::warn!("Entity {} was not in its cached chunk {:?}", id, entity.chunk);
            for chunk in self.chunks.values_mut() {
                chunk.entities.remove(&id);
            }
        }
        Some(entity)
    }

    /// Set an entity's position, relocating it if it crossed a chunk boundary.
    /// Returns true if the entity changed chunk.
    pub fn move_entity(&mut self, id: EntityId, position: Vec2) -> bool {
        let new_coord = self.coord_of(position);
        let Some(entity) = self.entities.get_mut(&id) else {
            tracing::warn!("move_entity on unknown entity {}", id);
            return false;
        };
        entity.position = position;
        let old_coord = entity.chunk;
        if old_coord == Some(new_coord) {
            return false;
        }
        entity.chunk = Some(new_coord);

        if let Some(old) = old_coord {
            let was_member = self
                .chunks
                .get_mut(&old)
                .is_some_and(|chunk| chunk.entities.remove(&id));
            if !was_member {
                tracing::warn!("Entity {} missing from chunk {} during move", id, old);
            }
        }
        self.ensure_chunk(new_coord);
        if let Some(chunk) = self.chunks.get_mut(&new_coord) {
            chunk.entities.insert(id);
        }
        true
    }

    #[inline]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable access; position changes must still go through `move_entity`
    #[inline]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn id_watermark(&self) -> EntityId {
        self.ids.peek()
    }

    pub fn reserve_ids(&mut self, next: EntityId) {
        if next > 0 {
            self.ids.reserve(next - 1);
        }
    }

    // ========================================================================
    // Consistency
    // ========================================================================

    /// Check that every entity is a member of exactly the chunk its position maps to
    pub fn check_consistency(&self) -> Vec<ConsistencyViolation> {
        let mut violations = Vec::new();
        let mut membership: HashMap<EntityId, usize> = HashMap::with_capacity(self.entities.len());

        for chunk in self.chunks.values() {
            for id in chunk.entity_ids() {
                *membership.entry(id).or_insert(0) += 1;
                if !self.entities.contains_key(&id) {
                    violations.push(ConsistencyViolation::DanglingMember { coord: chunk.coord, id });
                }
            }
        }

        for (&id, entity) in &self.entities {
            let expected = self.coord_of(entity.position);
            if entity.chunk != Some(expected) {
                violations.push(ConsistencyViolation::WrongChunk {
                    id,
                    cached: entity.chunk,
                    expected,
                });
            }
            if !self.chunks.get(&expected).is_some_and(|chunk| chunk.contains(id)) {
                violations.push(ConsistencyViolation::MissingMembership { id, expected });
            }
            let count = membership.get(&id).copied().unwrap_or(0);
            if count > 1 {
                violations.push(ConsistencyViolation::DuplicateMembership { id, count });
            }
        }

        violations
    }

    /// Re-home any entity whose membership disagrees with its position
    pub fn repair(&mut self) -> usize {
        let violations = self.check_consistency();
        let mut affected: Vec<EntityId> = Vec::new();
        for violation in &violations {
            tracing::warn!("Repairing chunk membership: {}", violation);
            match *violation {
                ConsistencyViolation::DanglingMember { coord, id } => {
                    if let Some(chunk) = self.chunks.get_mut(&coord) {
                        chunk.entities.remove(&id);
                    }
                }
                ConsistencyViolation::WrongChunk { id, .. }
                | ConsistencyViolation::MissingMembership { id, .. }
                | ConsistencyViolation::DuplicateMembership { id, .. } => affected.push(id),
            }
        }
        affected.sort_unstable();
        affected.dedup();

        for &id in &affected {
            for chunk in self.chunks.values_mut() {
                chunk.entities.remove(&id);
            }
            let Some(position) = self.entities.get(&id).map(|e| e.position) else {
                continue;
            };
            let coord = self.coord_of(position);
            self.ensure_chunk(coord);
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.entities.insert(id);
            }
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.chunk = Some(coord);
            }
        }
        affected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::game::entity::{Ship, ShipRole};

    fn quiet_store() -> ChunkStore {
        let config = SimulationConfig {
            generation: GenerationConfig::empty_space(),
            ..SimulationConfig::default()
        };
        ChunkStore::new(&config)
    }

    fn ship_at(x: f32, y: f32) -> Entity {
        Entity::ship(Vec2::new(x, y), Ship::player())
    }

    #[test]
    fn test_coord_from_position_floors() {
        assert_eq!(ChunkCoord::from_position(Vec2::new(0.0, 0.0), 600.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_position(Vec2::new(599.9, 10.0), 600.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_position(Vec2::new(600.0, 0.0), 600.0), ChunkCoord::new(1, 0));
        assert_eq!(ChunkCoord::from_position(Vec2::new(-0.1, -600.0), 600.0), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_position(Vec2::new(-600.1, 0.0), 600.0), ChunkCoord::new(-2, 0));
    }

    #[test]
    fn test_neighborhood_sizes() {
        let c = ChunkCoord::new(3, -2);
        assert_eq!(c.neighborhood(0).collect::<Vec<_>>(), vec![c]);
        assert_eq!(c.neighborhood(1).count(), 9);
        assert_eq!(c.neighborhood(2).count(), 25);
        assert_eq!(c.neighbors().count(), 8);
        assert!(c.neighbors().all(|n| n.chebyshev_distance(c) == 1));
    }

    #[test]
    fn test_add_entity_sets_chunk() {
        let mut store = quiet_store();
        let id = store.add_entity(ship_at(650.0, -10.0));

        let entity = store.entity(id).unwrap();
        assert_eq!(entity.chunk, Some(ChunkCoord::new(1, -1)));
        assert!(store.peek(ChunkCoord::new(1, -1)).unwrap().contains(id));
        assert!(store.check_consistency().is_empty());
    }

    #[test]
    fn test_move_across_boundary() {
        // A ship at (650, 0) moved to (590, 0) belongs to chunk (0, 0)
        let mut store = quiet_store();
        let id = store.add_entity(ship_at(650.0, 0.0));
        assert_eq!(store.entity(id).unwrap().chunk, Some(ChunkCoord::new(1, 0)));

        let relocated = store.move_entity(id, Vec2::new(590.0, 0.0));

        assert!(relocated);
        assert_eq!(store.entity(id).unwrap().chunk, Some(ChunkCoord::new(0, 0)));
        assert!(store.peek(ChunkCoord::new(0, 0)).unwrap().contains(id));
        assert!(!store.peek(ChunkCoord::new(1, 0)).unwrap().contains(id));
        assert!(store.check_consistency().is_empty());
    }

    #[test]
    fn test_move_within_chunk_keeps_membership() {
        let mut store = quiet_store();
        let id = store.add_entity(ship_at(10.0, 10.0));
        assert!(!store.move_entity(id, Vec2::new(500.0, 500.0)));
        assert_eq!(store.entity(id).unwrap().position, Vec2::new(500.0, 500.0));
        assert!(store.peek(ChunkCoord::new(0, 0)).unwrap().contains(id));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = quiet_store();
        let id = store.add_entity(ship_at(10.0, 10.0));
        assert!(store.remove_entity(id).is_some());
        assert!(store.remove_entity(id).is_none());
        assert!(store.peek(ChunkCoord::new(0, 0)).unwrap().is_empty());
        assert!(store.check_consistency().is_empty());
    }

    #[test]
    fn test_move_unknown_entity_is_noop() {
        let mut store = quiet_store();
        assert!(!store.move_entity(42, Vec2::new(1.0, 1.0)));
        assert_eq!(store.entity_count(), 0);
    }

    #[test]
    fn test_random_walk_keeps_membership_consistent() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut store = quiet_store();
        let ids: Vec<EntityId> = (0..50)
            .map(|i| store.add_entity(ship_at(i as f32 * 37.0, -(i as f32) * 11.0)))
            .collect();

        for _ in 0..200 {
            for &id in &ids {
                let pos = store.entity(id).unwrap().position;
                let step = Vec2::new(rng.gen_range(-250.0..250.0), rng.gen_range(-250.0..250.0));
                store.move_entity(id, pos + step);
            }
        }

        assert!(store.check_consistency().is_empty());
        let members: usize = store.chunks().map(Chunk::len).sum();
        assert_eq!(members, ids.len());
    }

    #[test]
    fn test_chunks_created_on_demand() {
        let mut store = quiet_store();
        assert_eq!(store.chunk_count(), 0);
        let ids = store.entities_near(ChunkCoord::new(10, 10), 1);
        assert!(ids.is_empty());
        assert_eq!(store.chunk_count(), 9);
        // Second query creates nothing new
        store.entities_near(ChunkCoord::new(10, 10), 1);
        assert_eq!(store.chunk_count(), 9);
        assert_eq!(store.take_generated().len(), 9);
        assert!(store.take_generated().is_empty());
    }

    #[test]
    fn test_failed_generation_leaves_chunks_empty() {
        let config = SimulationConfig {
            generation: GenerationConfig {
                empty_weight: 0.0,
                asteroid_weight: 0.0,
                enemy_station_weight: 0.0,
                friendly_station_weight: 0.0,
            },
            ..SimulationConfig::default()
        };
        let mut store = ChunkStore::new(&config);

        let ids = store.entities_near(ChunkCoord::new(5, 5), 1);

        assert!(ids.is_empty());
        assert_eq!(store.chunk_count(), 9);
        for coord in ChunkCoord::new(5, 5).neighborhood(1) {
            assert_eq!(store.peek(coord).unwrap().content, ChunkContent::Empty);
        }
        assert_eq!(store.take_generated().len(), 9);
    }

    #[test]
    fn test_coord_math_saturates_at_range_edge() {
        let corner = ChunkCoord::new(i32::MAX, i32::MIN);
        assert_eq!(corner.offset(1, -1), corner);
        assert_eq!(corner.neighbors().count(), 8);
        assert_eq!(ChunkCoord::new(i32::MIN, 0).chebyshev_distance(ChunkCoord::new(i32::MAX, 0)), i32::MAX);
        assert_eq!(ChunkCoord::new(-3, 4).chebyshev_distance(ChunkCoord::new(2, 1)), 5);
    }

    #[test]
    fn test_move_to_far_position() {
        let mut store = quiet_store();
        let id = store.add_entity(ship_at(10.0, 10.0));

        assert!(store.move_entity(id, Vec2::new(3.0e12, 0.0)));
        store.entities_near(store.coord_of(Vec2::new(3.0e12, 0.0)), 1);

        assert_eq!(store.entity(id).unwrap().chunk, Some(ChunkCoord::new(i32::MAX, 0)));
        assert!(store.check_consistency().is_empty());
    }

    #[test]
    fn test_peek_does_not_create() {
        let store = quiet_store();
        assert!(store.peek(ChunkCoord::new(5, 5)).is_none());
        assert!(store.entities_near_existing(ChunkCoord::new(5, 5), 2).is_empty());
        assert_eq!(store.chunk_count(), 0);
    }

    #[test]
    fn test_insert_entity_keeps_id_and_reserves() {
        let mut store = quiet_store();
        let mut entity = ship_at(0.0, 0.0);
        entity.id = 99;
        store.insert_entity(entity);
        let next = store.add_entity(ship_at(5.0, 5.0));
        assert!(next > 99);
        assert!(store.contains(99));
    }

    #[test]
    fn test_repair_rehomes_misplaced_entity() {
        let mut store = quiet_store();
        let id = store.add_entity(ship_at(10.0, 10.0));
        // Bypass move_entity to break the invariant
        store.entity_mut(id).unwrap().position = Vec2::new(1250.0, 10.0);
        assert!(!store.check_consistency().is_empty());

        assert_eq!(store.repair(), 1);
        assert!(store.check_consistency().is_empty());
        assert_eq!(store.entity(id).unwrap().chunk, Some(ChunkCoord::new(2, 0)));
    }

    #[test]
    fn test_insert_chunk_does_not_overwrite() {
        let mut store = quiet_store();
        assert!(store.insert_chunk(ChunkCoord::new(2, 2), ChunkContent::Asteroids));
        assert!(!store.insert_chunk(ChunkCoord::new(2, 2), ChunkContent::Empty));
        assert_eq!(store.peek(ChunkCoord::new(2, 2)).unwrap().content, ChunkContent::Asteroids);
    }

    #[test]
    fn test_sorted_snapshot() {
        let mut store = quiet_store();
        let a = store.add_entity(ship_at(1.0, 1.0));
        let b = store.add_entity(ship_at(2.0, 2.0));
        let c = store.add_entity(ship_at(3.0, 3.0));
        assert_eq!(store.chunk_entities(ChunkCoord::new(0, 0)), vec![a, b, c]);
        assert!(store.entity(a).unwrap().as_ship().is_some_and(|s| s.role == ShipRole::Player));
    }
}
