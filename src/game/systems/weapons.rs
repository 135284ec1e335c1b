//! Weapon firing
//!
//! `fire` is shared by the player intent path and AI decisions.

use crate::game::constants::weapon::SPAWN_OFFSET;
use crate::game::entity::{Bullet, Entity, EntityId};
use crate::game::state::GameState;
use crate::util::vec2::Vec2;

/// Fire the shooter's weapon along `direction`.
/// Returns the bullet id, or `None` while reloading or if the shooter is gone.
pub fn fire(state: &mut GameState, shooter: EntityId, direction: Vec2) -> Option<EntityId> {
    let entity = state.store.entity_mut(shooter)?;
    let position = entity.position;
    let velocity = entity.velocity;
    let rotation = entity.rotation;
    let ship = entity.as_ship_mut()?;
    if !ship.weapon.ready() || ship.dock.is_engaged() {
        return None;
    }

    let direction = if direction.is_zero(1e-6) {
        Vec2::from_angle(rotation)
    } else {
        direction.normalize()
    };

    ship.weapon.cooldown = ship.weapon.reload_time;
    let bullet = Bullet {
        owner: shooter,
        allegiance: ship.allegiance,
        damage: ship.weapon.damage,
        lifetime: ship.weapon.bullet_lifetime,
    };
    let bullet_velocity = velocity + direction * ship.weapon.bullet_speed;

    let id = state.spawn(Entity::bullet(position + direction * SPAWN_OFFSET, bullet_velocity, bullet));
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, SimulationConfig};
    use crate::game::constants::weapon;
    use crate::game::entity::{Allegiance, EntityKind};

    fn quiet_state() -> GameState {
        GameState::new(&SimulationConfig {
            generation: GenerationConfig::empty_space(),
            ..SimulationConfig::default()
        })
    }

    #[test]
    fn test_fire_spawns_bullet_ahead() {
        let mut state = quiet_state();
        let player = state.spawn_player(Vec2::new(100.0, 100.0));
        state.store.entity_mut(player).unwrap().velocity = Vec2::new(50.0, 0.0);

        let bullet = fire(&mut state, player, Vec2::new(0.0, 2.0)).unwrap();

        let entity = state.store.entity(bullet).unwrap();
        assert!(entity.position.approx_eq(Vec2::new(100.0, 100.0 + weapon::SPAWN_OFFSET), 1e-4));
        assert!(entity.velocity.approx_eq(Vec2::new(50.0, weapon::BULLET_SPEED), 1e-3));
        let EntityKind::Bullet(b) = &entity.kind else {
            panic!("expected a bullet");
        };
        assert_eq!(b.owner, player);
        assert_eq!(b.allegiance, Allegiance::Player);
        assert_eq!(b.lifetime, weapon::BULLET_LIFETIME);
    }

    #[test]
    fn test_fire_respects_reload() {
        let mut state = quiet_state();
        let player = state.spawn_player(Vec2::ZERO);
        assert!(fire(&mut state, player, Vec2::RIGHT).is_some());
        assert!(fire(&mut state, player, Vec2::RIGHT).is_none());

        let ship = state.store.entity_mut(player).unwrap().as_ship_mut().unwrap();
        ship.weapon.tick(weapon::PLAYER_RELOAD);
        assert!(fire(&mut state, player, Vec2::RIGHT).is_some());
    }

    #[test]
    fn test_zero_direction_uses_rotation() {
        let mut state = quiet_state();
        let player = state.spawn_player(Vec2::ZERO);
        state.store.entity_mut(player).unwrap().rotation = std::f32::consts::PI;
        let bullet = fire(&mut state, player, Vec2::ZERO).unwrap();
        assert!(state.store.entity(bullet).unwrap().velocity.x < 0.0);
    }

    #[test]
    fn test_missing_shooter() {
        let mut state = quiet_state();
        assert!(fire(&mut state, 404, Vec2::RIGHT).is_none());
    }
}
