use rayon::prelude::*;

use crate::game::constants::damping;
use crate::game::entity::{Entity, EntityId, EntityKind, Hull, UpdatePass};
use crate::game::events::DestroyCause;
use crate::game::state::GameState;
use crate::util::vec2::{wrap_angle, Vec2};

/// Timer state carried out of the parallel pass
#[derive(Debug, Clone)]
enum Timers {
    None,
    Ship { hull: Hull, cooldown: f32 },
    Lifetime(f32),
    Elapsed(f32),
}

#[derive(Debug, Clone)]
struct Motion {
    id: EntityId,
    position: Vec2,
    velocity: Vec2,
    rotation: f32,
    angular_velocity: f32,
    timers: Timers,
    expired: bool,
}

/// Integrate all loaded entities, one sub-pass at a time.
/// Inside a pass, motion is computed in parallel and applied sequentially.
pub fn update(state: &mut GameState, dt: f32) {
    for pass in UpdatePass::ORDER {
        run_pass(state, pass, dt);
    }
}

fn run_pass(state: &mut GameState, pass: UpdatePass, dt: f32) {
    let ids: Vec<EntityId> = state
        .loaded
        .entity_ids()
        .iter()
        .copied()
        .filter(|&id| state.store.entity(id).is_some_and(|e| e.update_pass() == pass))
        .collect();

    let view: &GameState = state;
    let motions: Vec<Motion> = ids
        .par_iter()
        .filter_map(|&id| view.store.entity(id).map(|entity| integrate(entity, dt)))
        .collect();

    for motion in motions {
        apply(state, motion);
    }
}

/// Exponential decay of a scalar, see `Vec2::damp`
#[inline]
fn damp_scalar(value: f32, k: f32, dt: f32) -> f32 {
    value * (-k * dt).exp()
}

fn integrate(entity: &Entity, dt: f32) -> Motion {
    let mut velocity = entity.velocity;
    let mut angular_velocity = entity.angular_velocity;
    let mut timers = Timers::None;
    let mut expired = false;

    match &entity.kind {
        EntityKind::Ship(ship) => {
            if !ship.dock.is_engaged() {
                let boost = if ship.controls.boost { ship.engine.boost_multiplier } else { 1.0 };
                let thrust = ship.controls.thrust.normalize();
                velocity += thrust * ship.engine.acceleration * boost * dt;
                velocity = velocity.damp(ship.engine.linear_damping, dt);
                velocity = velocity.clamp_length(ship.engine.max_speed * boost);
            }
            angular_velocity = damp_scalar(angular_velocity, ship.engine.angular_damping, dt);

            let mut hull = ship.hull.clone();
            hull.recharge(dt);
            let mut weapon = ship.weapon.clone();
            weapon.tick(dt);
            timers = Timers::Ship { hull, cooldown: weapon.cooldown };
        }
        EntityKind::Asteroid(_) | EntityKind::Station(_) => {
            velocity = velocity.damp(damping::NONE, dt);
        }
        EntityKind::Bullet(bullet) => {
            let lifetime = bullet.lifetime - dt;
            expired = lifetime <= 0.0;
            timers = Timers::Lifetime(lifetime);
        }
        EntityKind::Pickup(_) => {
            velocity = velocity.damp(damping::PICKUP_LINEAR, dt);
        }
        EntityKind::ParticleSystem(system) => {
            let elapsed = if system.paused { system.elapsed } else { system.elapsed + dt };
            expired = system.duration.is_some_and(|d| elapsed >= d);
            timers = Timers::Elapsed(elapsed);
        }
    }

    Motion {
        id: entity.id,
        position: entity.position + velocity * dt,
        velocity,
        rotation: wrap_angle(entity.rotation + angular_velocity * dt),
        angular_velocity,
        timers,
        expired,
    }
}

fn apply(state: &mut GameState, motion: Motion) {
    if motion.expired {
        state.destroy(motion.id, DestroyCause::Expired);
        return;
    }

    let Some(entity) = state.store.entity_mut(motion.id) else {
        return;
    };
    entity.velocity = motion.velocity;
    entity.rotation = motion.rotation;
    entity.angular_velocity = motion.angular_velocity;

    match (&mut entity.kind, motion.timers) {
        (EntityKind::Ship(ship), Timers::Ship { hull, cooldown }) => {
            ship.hull = hull;
            ship.weapon.cooldown = cooldown;
        }
        (EntityKind::Bullet(bullet), Timers::Lifetime(lifetime)) => bullet.lifetime = lifetime,
        (EntityKind::ParticleSystem(system), Timers::Elapsed(elapsed)) => system.elapsed = elapsed,
        _ => {}
    }

    if entity.position != motion.position {
        state.store.move_entity(motion.id, motion.position);
    }
}
