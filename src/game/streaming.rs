//! World streaming around the player
//!
//! The loaded set is rebuilt from scratch every tick: all chunks within the
//! load distance of the player's chunk, and the union of their members.

use rustc_hash::FxHashSet;

use crate::game::chunk::{ChunkCoord, ChunkStore};
use crate::game::entity::EntityId;
use crate::util::vec2::Vec2;

/// Entities that entered or left the loaded set during one update
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamDelta {
    pub loaded: Vec<EntityId>,
    pub unloaded: Vec<EntityId>,
}

impl StreamDelta {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty()
    }
}

/// Chunks and entities currently simulated
#[derive(Debug, Default, Clone)]
pub struct LoadedSet {
    center: Option<ChunkCoord>,
    chunks: Vec<ChunkCoord>,
    members: FxHashSet<EntityId>,
    /// Members in ascending id order
    ordered: Vec<EntityId>,
}

impl LoadedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the set around `player_position`, generating chunks as needed
    pub fn update(&mut self, store: &mut ChunkStore, player_position: Vec2, load_distance: i32) -> StreamDelta {
        let center = store.coord_of(player_position);
        let chunks: Vec<ChunkCoord> = center.neighborhood(load_distance).collect();

        let mut members = FxHashSet::default();
        for &coord in &chunks {
            members.extend(store.get_or_create(coord).entity_ids());
        }

        let mut loaded: Vec<EntityId> = members.difference(&self.members).copied().collect();
        let mut unloaded: Vec<EntityId> = self.members.difference(&members).copied().collect();
        loaded.sort_unstable();
        unloaded.sort_unstable();

        let mut ordered: Vec<EntityId> = members.iter().copied().collect();
        ordered.sort_unstable();

        if self.center != Some(center) {
            tracing::debug!("Loaded set re-centered on chunk {} ({} entities)", center, ordered.len());
        }

        self.center = Some(center);
        self.chunks = chunks;
        self.members = members;
        self.ordered = ordered;

        StreamDelta { loaded, unloaded }
    }

    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    pub fn chunks(&self) -> &[ChunkCoord] {
        &self.chunks
    }

    pub fn contains_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains(&coord)
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    /// Loaded entity ids in ascending order
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Drop an entity that was destroyed mid-tick
    pub fn forget(&mut self, id: EntityId) {
        if self.members.remove(&id) {
            if let Ok(index) = self.ordered.binary_search(&id) {
                self.ordered.remove(index);
            }
        }
    }

    /// Track an entity spawned inside a loaded chunk mid-tick
    pub fn admit(&mut self, id: EntityId, coord: ChunkCoord) {
        if self.contains_chunk(coord) && self.members.insert(id) {
            let index = self.ordered.partition_point(|&other| other < id);
            self.ordered.insert(index, id);
        }
    }
}
