//! Game state
//!
//! Owns the chunk store, the loaded set and the per-run counters. Systems take
//! `&mut GameState` and run one after another within a tick.

use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashSet;

use crate::config::SimulationConfig;
use crate::game::chunk::ChunkStore;
use crate::game::constants::{pickup, score};
use crate::game::entity::{
    Allegiance, DamageOutcome, DockState, Entity, EntityId, EntityKind, ParticleEffect, ParticleSystem, PickupKind, Ship,
    ShipRole,
};
use crate::game::events::{DestroyCause, WorldEvent};
use crate::game::generation::seeded_rng;
use crate::game::streaming::{LoadedSet, StreamDelta};
use crate::util::vec2::Vec2;

/// Salt for pickup drop rolls
const DROP_SALT: u64 = 0xD20B;

pub struct GameState {
    /// Ticks simulated so far
    pub tick: u64,
    pub score: u64,
    pub player_id: Option<EntityId>,
    /// Used to stream the world once the player is gone
    pub last_player_position: Vec2,
    /// Raised while the player sits docked at a friendly station
    pub station_ui_open: bool,
    pub game_over: bool,
    pub world_seed: u64,
    pub store: ChunkStore,
    pub loaded: LoadedSet,
    /// Continuous particle emitters currently running
    pub active_emitters: FxHashSet<EntityId>,
    events: Vec<WorldEvent>,
}

impl GameState {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            tick: 0,
            score: 0,
            player_id: None,
            last_player_position: Vec2::ZERO,
            station_ui_open: false,
            game_over: false,
            world_seed: config.world_seed,
            store: ChunkStore::new(config),
            loaded: LoadedSet::new(),
            active_emitters: FxHashSet::default(),
            events: Vec::new(),
        }
    }

    /// Place the player ship. Replaces any existing player.
    pub fn spawn_player(&mut self, position: Vec2) -> EntityId {
        if let Some(old) = self.player_id.take() {
            self.store.remove_entity(old);
            self.loaded.forget(old);
        }
        let id = self.spawn(Entity::ship(position, Ship::player()));
        self.player_id = Some(id);
        self.last_player_position = position;
        self.game_over = false;
        id
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.store.entity(id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.player_id.and_then(|id| self.store.entity_mut(id))
    }

    /// Current player position, or the last known one
    pub fn player_position(&self) -> Vec2 {
        self.player().map_or(self.last_player_position, |p| p.position)
    }

    pub fn sync_player_position(&mut self) {
        if let Some(position) = self.player().map(|p| p.position) {
            self.last_player_position = position;
        }
    }

    /// Deterministic RNG for a per-entity decision this tick
    pub fn rng_for(&self, id: EntityId, salt: u64) -> StdRng {
        seeded_rng(&[self.world_seed, id, self.tick, salt])
    }

    // ========================================================================
    // Spawning & destruction
    // ========================================================================

    /// Add an entity to the world and, if its chunk is loaded, to the loaded set
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let emitter = is_continuous_emitter(&entity);
        let id = self.store.add_entity(entity);
        if let Some(coord) = self.store.entity(id).and_then(|e| e.chunk) {
            self.loaded.admit(id, coord);
        }
        if emitter && self.loaded.contains(id) {
            self.active_emitters.insert(id);
        }
        id
    }

    /// Damage a ship or station. Destroys it when health drops to zero.
    pub fn apply_damage(&mut self, target: EntityId, amount: f32, attacker: Option<EntityId>) -> Option<DamageOutcome> {
        let entity = self.store.entity_mut(target)?;
        let outcome = entity.as_damageable_mut()?.damage(amount);
        if outcome.destroyed {
            self.destroy(target, DestroyCause::Killed { by: attacker });
        }
        Some(outcome)
    }

    /// Remove an entity and everything that refers to it. No-op if already gone.
    pub fn destroy(&mut self, id: EntityId, cause: DestroyCause) -> Option<Entity> {
        let mut entity = self.store.remove_entity(id)?;
        entity.destroyed = true;
        self.loaded.forget(id);
        self.active_emitters.remove(&id);
        self.unlink(&entity);

        self.events.push(WorldEvent::Destroyed {
            id,
            visual: entity.visual_kind(),
            position: entity.position,
            cause,
        });

        if let DestroyCause::Killed { by } = cause {
            if entity.as_damageable().is_some() {
                self.spawn(Entity::particles(entity.position, ParticleSystem::explosion()));
            }
            self.maybe_drop_pickup(&entity);
            if by.is_some() && by == self.player_id {
                self.award(kill_score(&entity));
            }
        }

        tracing::debug!("Entity {} destroyed ({:?})", id, cause);
        Some(entity)
    }

    fn unlink(&mut self, entity: &Entity) {
        match &entity.kind {
            EntityKind::Ship(ship) => match ship.role {
                ShipRole::Player => {
                    self.player_id = None;
                    self.last_player_position = entity.position;
                    self.station_ui_open = false;
                    self.game_over = true;
                    tracing::info!("Player destroyed at ({:.0}, {:.0})", entity.position.x, entity.position.y);
                }
                ShipRole::Escort { mothership } => {
                    if let Some(ShipRole::Mothership { escorts }) =
                        self.store.entity_mut(mothership).and_then(Entity::as_ship_mut).map(|s| &mut s.role)
                    {
                        escorts.retain(|&escort| escort != entity.id);
                    }
                }
                ShipRole::Defender { station } => {
                    if let Some(station) = self.store.entity_mut(station).and_then(Entity::as_station_mut) {
                        station.defenders.retain(|&defender| defender != entity.id);
                    }
                }
                _ => {}
            },
            EntityKind::Station(_) => {
                let mut released = false;
                if let Some(player) = self.player_mut().and_then(Entity::as_ship_mut) {
                    if matches!(player.dock, DockState::Approaching(s) | DockState::Docked(s) if s == entity.id) {
                        player.dock = DockState::Free;
                        released = true;
                    }
                }
                if released {
                    self.station_ui_open = false;
                }
            }
            _ => {}
        }
    }

    fn maybe_drop_pickup(&mut self, entity: &Entity) {
        let Some(ship) = entity.as_ship() else {
            return;
        };
        if ship.allegiance != Allegiance::Hostile {
            return;
        }
        let mut rng = self.rng_for(entity.id, DROP_SALT);
        if !rng.gen_bool(pickup::DROP_CHANCE) {
            return;
        }
        let (kind, amount) = if rng.gen_bool(0.5) {
            (PickupKind::Health, pickup::HEALTH_AMOUNT)
        } else {
            (PickupKind::Shield, pickup::SHIELD_AMOUNT)
        };
        self.spawn(Entity::pickup(entity.position, kind, amount).with_velocity(entity.velocity * 0.5));
    }

    pub fn award(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.score += points;
        self.events.push(WorldEvent::ScoreChanged {
            score: self.score,
            delta: points,
        });
    }

    // ========================================================================
    // Streaming
    // ========================================================================

    /// Rebuild the loaded set around the player and run load/unload hooks
    pub fn refresh_loaded(&mut self, load_distance: i32) -> StreamDelta {
        let center = self.player_position();
        let delta = self.loaded.update(&mut self.store, center, load_distance);

        for &id in &delta.unloaded {
            self.active_emitters.remove(&id);
            if let Some(entity) = self.store.entity_mut(id) {
                entity.on_unload();
            }
        }
        for &id in &delta.loaded {
            if let Some(entity) = self.store.entity_mut(id) {
                entity.on_load();
                if is_continuous_emitter(entity) {
                    self.active_emitters.insert(id);
                }
            }
        }
        delta
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn emit(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    /// Turn freshly generated chunks into events
    pub fn collect_generated_chunks(&mut self) {
        for coord in self.store.take_generated() {
            if let Some(chunk) = self.store.peek(coord) {
                self.events.push(WorldEvent::ChunkGenerated {
                    coord,
                    content: chunk.content,
                });
            }
        }
    }

    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[WorldEvent] {
        &self.events
    }
}

fn is_continuous_emitter(entity: &Entity) -> bool {
    matches!(
        &entity.kind,
        EntityKind::ParticleSystem(system) if system.duration.is_none() && system.effect == ParticleEffect::Beacon
    )
}

/// Points for the player destroying `entity`
fn kill_score(entity: &Entity) -> u64 {
    match &entity.kind {
        EntityKind::Ship(ship) if ship.allegiance == Allegiance::Hostile => match ship.role {
            ShipRole::Mothership { .. } => score::MOTHERSHIP,
            _ => score::ENEMY,
        },
        EntityKind::Station(station) if station.allegiance == Allegiance::Hostile => score::STATION,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::game::chunk::ChunkCoord;
    use crate::game::entity::{Hull, Station};
    use crate::game::systems::ai::Anchor;

    fn quiet_state() -> GameState {
        GameState::new(&SimulationConfig {
            generation: GenerationConfig::empty_space(),
            ..SimulationConfig::default()
        })
    }

    #[test]
    fn test_lethal_damage_removes_entity() {
        let mut state = quiet_state();
        let mut enemy = Ship::enemy(Anchor::Point(Vec2::ZERO));
        enemy.hull = Hull::new(3.0, 0.0);
        let id = state.spawn(Entity::ship(Vec2::new(100.0, 100.0), enemy));
        let coord = state.store.entity(id).unwrap().chunk.unwrap();

        let outcome = state.apply_damage(id, 5.0, None).unwrap();

        assert!(outcome.destroyed);
        assert!(state.store.entity(id).is_none());
        assert!(!state.store.peek(coord).unwrap().contains(id));
        assert!(state.store.check_consistency().is_empty());
        assert!(state
            .pending_events()
            .iter()
            .any(|e| matches!(e, WorldEvent::Destroyed { id: d, .. } if *d == id)));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut state = quiet_state();
        let id = state.spawn(Entity::asteroid(Vec2::ZERO, 40.0));
        assert!(state.destroy(id, DestroyCause::Expired).is_some());
        assert!(state.destroy(id, DestroyCause::Expired).is_none());
        assert_eq!(state.take_events().len(), 1);
    }

    #[test]
    fn test_kill_spawns_explosion() {
        let mut state = quiet_state();
        let id = state.spawn(Entity::ship(Vec2::new(50.0, 50.0), Ship::enemy(Anchor::Point(Vec2::ZERO))));
        state.destroy(id, DestroyCause::Killed { by: None });

        let explosions = state
            .store
            .entities()
            .filter(|e| matches!(&e.kind, EntityKind::ParticleSystem(p) if p.effect == ParticleEffect::Explosion))
            .count();
        assert_eq!(explosions, 1);
    }

    #[test]
    fn test_player_kill_scores() {
        let mut state = quiet_state();
        let player = state.spawn_player(Vec2::ZERO);
        let enemy = state.spawn(Entity::ship(Vec2::new(200.0, 0.0), Ship::enemy(Anchor::Point(Vec2::ZERO))));
        let station = state.spawn(Entity::station(Vec2::new(400.0, 0.0), Station::enemy()));

        state.destroy(enemy, DestroyCause::Killed { by: Some(player) });
        assert_eq!(state.score, score::ENEMY);
        state.destroy(station, DestroyCause::Killed { by: Some(player) });
        assert_eq!(state.score, score::ENEMY + score::STATION);
    }

    #[test]
    fn test_non_player_kill_does_not_score() {
        let mut state = quiet_state();
        state.spawn_player(Vec2::ZERO);
        let enemy = state.spawn(Entity::ship(Vec2::new(200.0, 0.0), Ship::enemy(Anchor::Point(Vec2::ZERO))));
        state.destroy(enemy, DestroyCause::Killed { by: Some(9999) });
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_escort_death_unlinks_from_mothership() {
        let mut state = quiet_state();
        let mothership = state.spawn(Entity::ship(Vec2::ZERO, Ship::mothership(Anchor::Point(Vec2::ZERO))));
        let escort = state.spawn(Entity::ship(Vec2::new(60.0, 0.0), Ship::escort(mothership)));
        if let Some(ShipRole::Mothership { escorts }) =
            state.store.entity_mut(mothership).and_then(Entity::as_ship_mut).map(|s| &mut s.role)
        {
            escorts.push(escort);
        }

        state.destroy(escort, DestroyCause::Killed { by: None });

        let role = &state.store.entity(mothership).unwrap().as_ship().unwrap().role;
        assert_eq!(role, &ShipRole::Mothership { escorts: vec![] });
    }

    #[test]
    fn test_player_death_keeps_last_position() {
        let mut state = quiet_state();
        let player = state.spawn_player(Vec2::new(1234.0, -50.0));
        state.destroy(player, DestroyCause::Killed { by: None });
        assert!(state.game_over);
        assert!(state.player_id.is_none());
        assert_eq!(state.player_position(), Vec2::new(1234.0, -50.0));
    }

    #[test]
    fn test_emitter_index_follows_streaming() {
        let mut state = quiet_state();
        state.spawn_player(Vec2::ZERO);
        state.refresh_loaded(1);
        let beacon = state.spawn(Entity::particles(Vec2::new(100.0, 0.0), ParticleSystem::beacon()));
        assert!(state.active_emitters.contains(&beacon));

        // Fly far away; the beacon pauses and leaves the index
        let player = state.player_id.unwrap();
        state.store.move_entity(player, Vec2::new(5000.0, 0.0));
        state.refresh_loaded(1);
        assert!(!state.active_emitters.contains(&beacon));
        assert!(matches!(&state.store.entity(beacon).unwrap().kind, EntityKind::ParticleSystem(p) if p.paused));

        state.store.move_entity(player, Vec2::ZERO);
        state.refresh_loaded(1);
        assert!(state.active_emitters.contains(&beacon));
        assert!(matches!(&state.store.entity(beacon).unwrap().kind, EntityKind::ParticleSystem(p) if !p.paused));
    }

    #[test]
    fn test_generated_chunk_events() {
        let mut state = quiet_state();
        state.refresh_loaded(1);
        state.collect_generated_chunks();
        let generated = state
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, WorldEvent::ChunkGenerated { .. }))
            .count();
        assert_eq!(generated, 9);
        assert!(state.store.contains_chunk(ChunkCoord::new(-1, 1)));
    }
}
