//! Simulation driver
//!
//! Owns the game state and runs the per-tick pipeline:
//! intents → docking → movement → streaming → AI → stations → collision.

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::game::constants::physics::MAX_DT;
use crate::game::entity::{EntityId, VisualKind};
use crate::game::events::WorldEvent;
use crate::game::input::{Intent, IntentChannel, IntentSender};
use crate::game::snapshot::{SnapshotError, WorldSnapshot};
use crate::game::state::GameState;
use crate::game::systems::collision::{CircleOverlap, Collides};
use crate::game::systems::{ai, collision, movement, player, stations};
use crate::util::vec2::Vec2;

/// What the renderer needs to draw one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderItem {
    pub id: EntityId,
    pub position: Vec2,
    pub rotation: f32,
    pub visual: VisualKind,
    pub z_order: i32,
    /// Health fraction for ships and stations
    pub health: Option<f32>,
}

pub struct Simulation {
    config: SimulationConfig,
    state: GameState,
    shapes: Box<dyn Collides>,
    intents: IntentChannel,
}

impl Simulation {
    /// New world with the player at the origin, using circle overlap for collisions
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_shapes(config, Box::new(CircleOverlap))
    }

    /// New world with a custom shape predicate
    pub fn with_shapes(config: SimulationConfig, shapes: Box<dyn Collides>) -> Self {
        let mut state = GameState::new(&config);
        state.spawn_player(Vec2::ZERO);
        let mut sim = Self {
            config,
            state,
            shapes,
            intents: IntentChannel::default(),
        };
        sim.state.refresh_loaded(sim.config.load_distance);
        sim.state.collect_generated_chunks();
        tracing::info!(
            "World {} ready: {} chunks, {} entities",
            sim.config.world_seed,
            sim.state.store.chunk_count(),
            sim.state.store.entity_count()
        );
        sim
    }

    /// Handle for feeding intents from another thread
    pub fn sender(&self) -> IntentSender {
        self.intents.sender()
    }

    /// Advance one tick using the intents queued on the channel
    pub fn tick(&mut self, dt: f32) -> Vec<WorldEvent> {
        let intents = self.intents.drain();
        self.step(&intents, dt)
    }

    /// Advance one tick with explicit intents. `dt` is clamped to `[0, MAX_DT]`;
    /// a non-finite `dt` counts as zero.
    pub fn step(&mut self, intents: &[Intent], dt: f32) -> Vec<WorldEvent> {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 };
        let state = &mut self.state;

        player::apply_intents(state, intents);
        player::update_docking(state);
        movement::update(state, dt);
        state.sync_player_position();
        state.refresh_loaded(self.config.load_distance);
        ai::update(state);
        stations::update(state, dt);
        collision::update(state, self.shapes.as_ref(), dt);

        state.collect_generated_chunks();
        state.tick += 1;
        state.take_events()
    }

    /// Loaded entities in draw order
    pub fn render_view(&self) -> Vec<RenderItem> {
        let mut items: Vec<RenderItem> = self
            .state
            .loaded
            .entity_ids()
            .iter()
            .filter_map(|&id| self.state.store.entity(id))
            .map(|entity| RenderItem {
                id: entity.id,
                position: entity.position,
                rotation: entity.rotation,
                visual: entity.visual_kind(),
                z_order: entity.z_order(),
                health: entity.health_fraction(),
            })
            .collect();
        items.sort_by_key(|item| (item.z_order, item.id));
        items
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.config, &self.state)
    }

    /// Rebuild a simulation from a snapshot, using circle overlap for collisions
    pub fn restore(snapshot: WorldSnapshot) -> Result<Self, SnapshotError> {
        let config = snapshot.config.clone();
        let mut state = snapshot.into_state()?;
        state.refresh_loaded(config.load_distance);
        state.collect_generated_chunks();
        // Chunks generated by the first refresh are still reported on the next tick
        tracing::info!(
            "Restored world at tick {} ({} chunks, {} entities)",
            state.tick,
            state.store.chunk_count(),
            state.store.entity_count()
        );
        Ok(Self {
            config,
            state,
            shapes: Box::new(CircleOverlap),
            intents: IntentChannel::default(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.state.tick
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn player_position(&self) -> Vec2 {
        self.state.player_position()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    pub fn station_ui_open(&self) -> bool {
        self.state.station_ui_open
    }
}
