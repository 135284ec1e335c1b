//! Player intents and docking
//!
//! Intents are applied before movement. Docking homes the ship onto the
//! station each tick until it snaps into place.

use crate::game::constants::dock;
use crate::game::entity::{DockState, Entity, EntityId};
use crate::game::events::WorldEvent;
use crate::game::input::Intent;
use crate::game::state::GameState;
use crate::game::systems::weapons;
use crate::util::vec2::Vec2;

/// Apply queued intents in order. Ignored once the player is gone.
pub fn apply_intents(state: &mut GameState, intents: &[Intent]) {
    let Some(player) = state.player_id else {
        return;
    };

    for intent in intents {
        match *intent {
            Intent::Move(direction) => {
                if let Some(ship) = state.store.entity_mut(player).and_then(Entity::as_ship_mut) {
                    ship.controls.thrust = direction;
                }
            }
            Intent::Turn(rate) => {
                if let Some(entity) = state.store.entity_mut(player) {
                    entity.angular_velocity = rate;
                }
            }
            Intent::Boost(on) => {
                if let Some(ship) = state.store.entity_mut(player).and_then(Entity::as_ship_mut) {
                    ship.controls.boost = on;
                }
            }
            Intent::Shoot => {
                weapons::fire(state, player, Vec2::ZERO);
            }
            Intent::Dock => {
                dock(state);
            }
            Intent::Undock => {
                undock(state);
            }
        }
    }
}

/// Start approaching the nearest friendly station within range.
/// Returns the station id, or `None` if nothing is in range or already docking.
pub fn dock(state: &mut GameState) -> Option<EntityId> {
    let player = state.player()?;
    if player.as_ship()?.dock.is_engaged() {
        return None;
    }
    let position = player.position;
    let center = state.store.coord_of(position);

    let station = state
        .store
        .entities_near_existing(center, 1)
        .into_iter()
        .filter_map(|id| state.store.entity(id))
        .filter(|e| e.as_station().is_some_and(|s| s.is_dockable()))
        .map(|e| (e.id, e.position.distance_sq_to(position)))
        .filter(|&(_, d)| d <= dock::RANGE * dock::RANGE)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(id, _)| id)?;

    let ship = state.player_mut().and_then(Entity::as_ship_mut)?;
    ship.dock = DockState::Approaching(station);
    ship.controls = Default::default();
    tracing::debug!("Player approaching station {}", station);
    Some(station)
}

/// Release the player from a station. Returns the station it was attached to.
pub fn undock(state: &mut GameState) -> Option<EntityId> {
    let ship = state.player_mut().and_then(Entity::as_ship_mut)?;
    let station = match ship.dock {
        DockState::Approaching(s) | DockState::Docked(s) => s,
        DockState::Free => return None,
    };
    ship.dock = DockState::Free;
    state.station_ui_open = false;
    state.emit(WorldEvent::Undocked { station });
    Some(station)
}

/// Home an approaching player onto its station, snapping once close enough
pub fn update_docking(state: &mut GameState) {
    let Some(player) = state.player() else {
        return;
    };
    let Some(DockState::Approaching(station)) = player.as_ship().map(|s| s.dock) else {
        return;
    };
    let player_id = player.id;
    let position = player.position;

    let Some(target) = state.store.entity(station).map(|s| s.position) else {
        // Station vanished underneath us
        if let Some(ship) = state.player_mut().and_then(Entity::as_ship_mut) {
            ship.dock = DockState::Free;
        }
        return;
    };

    let offset = target - position;
    if offset.length() < dock::SNAP_DISTANCE {
        state.store.move_entity(player_id, target);
        if let Some(entity) = state.store.entity_mut(player_id) {
            entity.velocity = Vec2::ZERO;
            entity.angular_velocity = 0.0;
            if let Some(ship) = entity.as_ship_mut() {
                ship.dock = DockState::Docked(station);
            }
        }
        state.station_ui_open = true;
        state.emit(WorldEvent::Docked { station });
        tracing::info!("Player docked at station {}", station);
        return;
    }

    if let Some(entity) = state.store.entity_mut(player_id) {
        entity.velocity = (offset * dock::HOMING_RATE).clamp_length(dock::MAX_SPEED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, SimulationConfig};
    use crate::game::constants::physics::DT;
    use crate::game::entity::Station;
    use crate::game::events::DestroyCause;
    use crate::game::systems::movement;

    fn quiet_state() -> GameState {
        GameState::new(&SimulationConfig {
            generation: GenerationConfig::empty_space(),
            ..SimulationConfig::default()
        })
    }

    fn ship_dock(state: &GameState) -> DockState {
        state.player().unwrap().as_ship().unwrap().dock
    }

    #[test]
    fn test_move_turn_and_boost() {
        let mut state = quiet_state();
        let player = state.spawn_player(Vec2::ZERO);

        apply_intents(&mut state, &[Intent::Move(Vec2::new(0.0, 1.0)), Intent::Turn(1.5), Intent::Boost(true)]);

        let entity = state.store.entity(player).unwrap();
        let ship = entity.as_ship().unwrap();
        assert_eq!(ship.controls.thrust, Vec2::new(0.0, 1.0));
        assert!(ship.controls.boost);
        assert_eq!(entity.angular_velocity, 1.5);
    }

    #[test]
    fn test_shoot_fires_along_rotation() {
        let mut state = quiet_state();
        state.spawn_player(Vec2::ZERO);
        state.refresh_loaded(1);
        let before = state.store.entity_count();

        apply_intents(&mut state, &[Intent::Shoot, Intent::Shoot]);

        // The second shot is still reloading
        assert_eq!(state.store.entity_count(), before + 1);
    }

    #[test]
    fn test_intents_without_player_are_ignored() {
        let mut state = quiet_state();
        apply_intents(&mut state, &[Intent::Shoot, Intent::Dock]);
        assert_eq!(state.store.entity_count(), 0);
    }

    #[test]
    fn test_dock_picks_nearest_friendly_station() {
        let mut state = quiet_state();
        state.spawn_player(Vec2::new(300.0, 300.0));
        state.spawn(Entity::station(Vec2::new(300.0, 150.0), Station::enemy()));
        state.spawn(Entity::station(Vec2::new(300.0, 0.0), Station::friendly()));
        let near = state.spawn(Entity::station(Vec2::new(500.0, 300.0), Station::friendly()));

        assert_eq!(dock(&mut state), Some(near));
        assert_eq!(ship_dock(&state), DockState::Approaching(near));
        assert_eq!(dock(&mut state), None, "already approaching");
    }

    #[test]
    fn test_dock_out_of_range() {
        let mut state = quiet_state();
        state.spawn_player(Vec2::ZERO);
        state.spawn(Entity::station(Vec2::new(dock::RANGE + 50.0, 0.0), Station::friendly()));
        assert_eq!(dock(&mut state), None);
        assert_eq!(ship_dock(&state), DockState::Free);
    }

    #[test]
    fn test_homing_snaps_onto_station() {
        let mut state = quiet_state();
        let player = state.spawn_player(Vec2::new(100.0, 100.0));
        let station = state.spawn(Entity::station(Vec2::new(300.0, 250.0), Station::friendly()));
        state.refresh_loaded(1);
        apply_intents(&mut state, &[Intent::Dock]);

        for _ in 0..600 {
            update_docking(&mut state);
            movement::update(&mut state, DT);
            if state.station_ui_open {
                break;
            }
        }

        let entity = state.store.entity(player).unwrap();
        assert_eq!(ship_dock(&state), DockState::Docked(station));
        assert_eq!(entity.position, Vec2::new(300.0, 250.0));
        assert_eq!(entity.velocity, Vec2::ZERO);
        assert!(state.station_ui_open);
        assert!(state
            .pending_events()
            .iter()
            .any(|e| matches!(e, WorldEvent::Docked { station: s } if *s == station)));
        assert!(state.store.check_consistency().is_empty());
    }

    #[test]
    fn test_undock_releases_ship() {
        let mut state = quiet_state();
        state.spawn_player(Vec2::ZERO);
        let station = state.spawn(Entity::station(Vec2::new(0.5, 0.0), Station::friendly()));
        dock(&mut state);
        update_docking(&mut state);
        assert!(state.station_ui_open);

        assert_eq!(undock(&mut state), Some(station));
        assert_eq!(ship_dock(&state), DockState::Free);
        assert!(!state.station_ui_open);
        assert_eq!(undock(&mut state), None);
    }

    #[test]
    fn test_station_destroyed_while_approaching() {
        let mut state = quiet_state();
        state.spawn_player(Vec2::ZERO);
        let station = state.spawn(Entity::station(Vec2::new(200.0, 0.0), Station::friendly()));
        dock(&mut state);
        state.destroy(station, DestroyCause::Expired);

        update_docking(&mut state);
        assert_eq!(ship_dock(&state), DockState::Free);
    }
}
