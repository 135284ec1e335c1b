//! Collision detection and response
//!
//! Scans are bounded to a fixed chunk neighborhood per entity: asteroids look
//! at a 5x5 block, bullets only at their own chunk, the player at a 3x3 block
//! for pickups.

use crate::game::constants::{collision::*, impact_damage};
use crate::game::entity::{Entity, EntityId, EntityKind, PickupKind};
use crate::game::events::{DestroyCause, WorldEvent};
use crate::game::state::GameState;
use crate::game::systems::ai;
use crate::util::vec2::Vec2;

/// Shape predicate used for ship/asteroid and bullet/asteroid overlap
pub trait Collides: Send + Sync {
    fn collides(&self, a: &Entity, b: &Entity) -> bool;
}

/// Bounding circle overlap
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleOverlap;

impl Collides for CircleOverlap {
    fn collides(&self, a: &Entity, b: &Entity) -> bool {
        let reach = a.bounding_radius() + b.bounding_radius();
        a.position.distance_sq_to(b.position) < reach * reach
    }
}

/// Resolve all collisions for loaded entities
pub fn update(state: &mut GameState, shapes: &dyn Collides, dt: f32) {
    let loaded: Vec<EntityId> = state.loaded.entity_ids().to_vec();

    for &id in &loaded {
        if state.store.entity(id).is_some_and(Entity::is_asteroid) {
            resolve_asteroid(state, shapes, id, dt);
        }
    }

    for &id in &loaded {
        if state.store.entity(id).is_some_and(|e| e.as_bullet().is_some()) {
            resolve_bullet(state, shapes, id);
        }
    }

    collect_pickups(state);
}

/// Bounce a ship off an asteroid: step back along its velocity, then reflect
/// the velocity about the surface tangent at the contact.
pub fn bounce_off(position: Vec2, velocity: Vec2, asteroid_center: Vec2, dt: f32) -> (Vec2, Vec2) {
    let incident = velocity.angle();
    let tangent = (position - asteroid_center).perpendicular().angle();
    let reflected = velocity.rotate(-2.0 * (incident - tangent));
    (position - velocity * dt, reflected)
}

fn resolve_asteroid(state: &mut GameState, shapes: &dyn Collides, asteroid_id: EntityId, dt: f32) {
    let Some(coord) = state.store.entity(asteroid_id).and_then(|e| e.chunk) else {
        return;
    };

    for other_id in state.store.entities_near(coord, ASTEROID_SCAN_RADIUS) {
        let (Some(asteroid), Some(other)) = (state.store.entity(asteroid_id), state.store.entity(other_id)) else {
            continue;
        };

        match &other.kind {
            EntityKind::Ship(ship) if !ship.dock.is_engaged() => {
                if !shapes.collides(asteroid, other) {
                    continue;
                }
                let (position, velocity) = bounce_off(other.position, other.velocity, asteroid.position, dt);
                let damage = impact_damage(other.velocity.length());
                if let Some(ship_entity) = state.store.entity_mut(other_id) {
                    ship_entity.velocity = velocity;
                }
                state.store.move_entity(other_id, position);
                if damage > 0.0 {
                    state.apply_damage(other_id, damage, None);
                }
            }
            EntityKind::Bullet(_) => {
                if shapes.collides(asteroid, other) {
                    state.destroy(other_id, DestroyCause::Consumed);
                }
            }
            _ => {}
        }
    }
}

fn resolve_bullet(state: &mut GameState, shapes: &dyn Collides, bullet_id: EntityId) {
    let Some(coord) = state.store.entity(bullet_id).and_then(|e| e.chunk) else {
        return;
    };

    for other_id in state.store.chunk_entities(coord) {
        if other_id == bullet_id {
            continue;
        }
        let Some(bullet_entity) = state.store.entity(bullet_id) else {
            return;
        };
        let Some(bullet) = bullet_entity.as_bullet() else {
            return;
        };
        let Some(other) = state.store.entity(other_id) else {
            continue;
        };
        if other_id == bullet.owner {
            continue;
        }

        let distance = bullet_entity.position.distance_to(other.position);
        let hit = match &other.kind {
            EntityKind::Ship(ship) => bullet.allegiance.can_hit(ship.allegiance) && distance < ship.hit_radius(),
            EntityKind::Station(station) => {
                bullet.allegiance.can_hit(station.allegiance) && distance < station.radius
            }
            EntityKind::Asteroid(_) => {
                if shapes.collides(bullet_entity, other) {
                    state.destroy(bullet_id, DestroyCause::Consumed);
                    return;
                }
                false
            }
            _ => false,
        };
        if !hit {
            continue;
        }

        let owner = bullet.owner;
        let damage = bullet.damage;
        let position = bullet_entity.position;
        let target_is_ship = other.as_ship().is_some();

        state.emit(WorldEvent::BulletHit {
            bullet: bullet_id,
            target: other_id,
            damage,
            position,
        });
        state.destroy(bullet_id, DestroyCause::Consumed);
        if target_is_ship {
            ai::on_attacked(state, other_id, owner);
        }
        state.apply_damage(other_id, damage, Some(owner));
        return;
    }
}

fn collect_pickups(state: &mut GameState) {
    let Some(player) = state.player() else {
        return;
    };
    if player.as_ship().is_some_and(|s| s.dock.is_engaged()) {
        return;
    }
    let player_id = player.id;
    let player_pos = player.position;
    let coord = state.store.coord_of(player_pos);

    for id in state.store.entities_near(coord, PICKUP_SCAN_RADIUS) {
        let Some(entity) = state.store.entity(id) else {
            continue;
        };
        let EntityKind::Pickup(pickup) = &entity.kind else {
            continue;
        };
        if entity.position.distance_to(player_pos) >= PICKUP_RADIUS {
            continue;
        }
        let (kind, amount) = (pickup.kind, pickup.amount);

        if let Some(ship) = state.store.entity_mut(player_id).and_then(Entity::as_ship_mut) {
            match kind {
                PickupKind::Health => ship.hull.heal(amount),
                PickupKind::Shield => ship.hull.restore_shield(amount),
            }
        }
        state.emit(WorldEvent::PickupConsumed { pickup: id, kind, amount });
        state.destroy(id, DestroyCause::Consumed);
    }
}
