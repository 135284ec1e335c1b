//! Station defender spawning

use rand::Rng;
use std::f32::consts::TAU;

use crate::game::constants::station::DEFENDER_SPAWN_OFFSET;
use crate::game::entity::{Entity, EntityId, Ship};
use crate::game::state::GameState;
use crate::util::vec2::Vec2;

/// Salt for defender placement rolls
const SPAWN_SALT: u64 = 0x57A7;

/// Advance spawn timers of loaded stations and top up their defenders
pub fn update(state: &mut GameState, dt: f32) {
    let stations: Vec<EntityId> = state
        .loaded
        .entity_ids()
        .iter()
        .copied()
        .filter(|&id| state.store.entity(id).is_some_and(|e| e.as_station().is_some()))
        .collect();

    for id in stations {
        if let Some(position) = tick_station(state, id, dt) {
            spawn_defender(state, id, position);
        }
    }
}

/// Returns the station position when a defender is due
fn tick_station(state: &mut GameState, id: EntityId, dt: f32) -> Option<Vec2> {
    let entity = state.store.entity(id)?;
    let position = entity.position;
    let station = entity.as_station()?;
    let live = station
        .defenders
        .iter()
        .copied()
        .filter(|&d| state.store.contains(d))
        .collect::<Vec<_>>();

    let station = state.store.entity_mut(id)?.as_station_mut()?;
    station.defenders = live;
    station.spawn_timer -= dt;
    if station.spawn_timer > 0.0 {
        return None;
    }
    station.spawn_timer = station.spawn_interval;
    (station.defenders.len() < station.max_defenders).then_some(position)
}

fn spawn_defender(state: &mut GameState, station_id: EntityId, station_position: Vec2) {
    let Some(station) = state.store.entity(station_id).and_then(Entity::as_station) else {
        return;
    };
    let allegiance = station.allegiance;
    let slot = station.defenders.len() as u64;
    let angle = state.rng_for(station_id, SPAWN_SALT ^ slot).gen_range(0.0..TAU);
    let position = station_position + Vec2::from_polar(angle, DEFENDER_SPAWN_OFFSET);

    let defender = state.spawn(Entity::ship(position, Ship::defender(station_id, allegiance)).with_rotation(angle));
    if let Some(station) = state.store.entity_mut(station_id).and_then(Entity::as_station_mut) {
        station.defenders.push(defender);
    }
    tracing::debug!("Station {} launched defender {}", station_id, defender);
}
