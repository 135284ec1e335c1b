//! World persistence
//!
//! A snapshot records every chunk that has been generated so far, with its
//! content, plus all entity states and the run counters. Restored chunks are
//! never regenerated.

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::game::chunk::ChunkCoord;
use crate::game::entity::{Entity, EntityId};
use crate::game::generation::ChunkContent;
use crate::game::state::GameState;
use crate::util::vec2::Vec2;

/// Bumped whenever the snapshot layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("json snapshot error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("snapshot carries an invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldSnapshot {
    pub version: u32,
    pub config: SimulationConfig,
    pub tick: u64,
    pub score: u64,
    pub player_id: Option<EntityId>,
    pub last_player_position: Vec2,
    pub station_ui_open: bool,
    pub game_over: bool,
    /// Next id the allocator would hand out
    pub next_id: EntityId,
    /// Every generated chunk, ordered by coordinate
    pub chunks: Vec<(ChunkCoord, ChunkContent)>,
    /// Every live entity, ordered by id
    pub entities: Vec<Entity>,
}

impl WorldSnapshot {
    pub fn capture(config: &SimulationConfig, state: &GameState) -> Self {
        let mut chunks: Vec<(ChunkCoord, ChunkContent)> =
            state.store.chunks().map(|chunk| (chunk.coord, chunk.content)).collect();
        chunks.sort_unstable_by_key(|&(coord, _)| coord);

        let mut entities: Vec<Entity> = state.store.entities().cloned().collect();
        entities.sort_unstable_by_key(|e| e.id);

        Self {
            version: SNAPSHOT_VERSION,
            config: config.clone(),
            tick: state.tick,
            score: state.score,
            player_id: state.player_id,
            last_player_position: state.last_player_position,
            station_ui_open: state.station_ui_open,
            game_over: state.game_over,
            next_id: state.store.id_watermark(),
            chunks,
            entities,
        }
    }

    /// Rebuild a game state. The loaded set starts empty; refresh it before ticking.
    pub fn into_state(self) -> Result<GameState, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        self.config.validate().map_err(SnapshotError::InvalidConfig)?;

        let mut state = GameState::new(&self.config);
        state.store.reserve_ids(self.next_id);
        for (coord, content) in self.chunks {
            state.store.insert_chunk(coord, content);
        }
        for entity in self.entities {
            // Membership is recomputed from the position
            state.store.insert_entity(entity);
        }
        let repaired = state.store.repair();
        if repaired > 0 {
            tracing::warn!("Re-homed {} entities while restoring snapshot", repaired);
        }
        // Restoring must not report chunks as freshly generated
        state.store.take_generated();

        state.tick = self.tick;
        state.score = self.score;
        state.player_id = self.player_id.filter(|&id| state.store.contains(id));
        state.last_player_position = self.last_player_position;
        state.station_ui_open = self.station_ui_open && state.player_id.is_some();
        state.game_over = self.game_over;
        Ok(state)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let (snapshot, _): (Self, usize) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}
