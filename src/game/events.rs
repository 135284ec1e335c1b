//! Events emitted during a tick for effects, score and UI collaborators

use serde::{Deserialize, Serialize};

use crate::game::chunk::ChunkCoord;
use crate::game::entity::{EntityId, PickupKind, VisualKind};
use crate::game::generation::ChunkContent;
use crate::util::vec2::Vec2;

/// Why an entity left the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyCause {
    /// Health reached zero; `by` is the responsible shooter, if any
    Killed { by: Option<EntityId> },
    /// Lifetime ran out (bullets, one-shot effects)
    Expired,
    /// Pickup collected
    Consumed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    Destroyed {
        id: EntityId,
        visual: VisualKind,
        position: Vec2,
        cause: DestroyCause,
    },
    BulletHit {
        bullet: EntityId,
        target: EntityId,
        damage: f32,
        position: Vec2,
    },
    PickupConsumed {
        pickup: EntityId,
        kind: PickupKind,
        amount: f32,
    },
    Docked {
        station: EntityId,
    },
    Undocked {
        station: EntityId,
    },
    ScoreChanged {
        score: u64,
        delta: u64,
    },
    ChunkGenerated {
        coord: ChunkCoord,
        content: ChunkContent,
    },
}
