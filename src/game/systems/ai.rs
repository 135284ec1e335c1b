use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::game::chunk::ChunkCoord;
use crate::game::constants::ai::*;
use crate::game::entity::{Allegiance, Entity, EntityId, Ship, ShipRole};
use crate::game::generation::ChunkContent;
use crate::game::state::GameState;
use crate::game::systems::weapons;
use crate::util::vec2::Vec2;

/// Salt for patrol point picks
const PATROL_SALT: u64 = 0x9A72;

/// Behavior mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiState {
    /// Wander around the home anchor
    #[default]
    Patrol,
    /// Chase and shoot a target
    Attack,
    /// Run from a threat
    Flee,
}

/// What a ship patrols around
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    Point(Vec2),
    /// Station or mothership; falls back to the ship's origin once gone
    Entity(EntityId),
}

/// Tuning per ship role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    pub aggro_radius: f32,
    pub patrol_min_radius: f32,
    pub patrol_max_radius: f32,
    pub patrol_acceleration: f32,
    pub patrol_max_speed: f32,
    pub attack_acceleration: f32,
    pub attack_max_speed: f32,
    pub firing_range: f32,
    /// Flee once the health fraction drops to this value (0 = never)
    pub flee_below: f32,
    /// Neutral ships never attack
    pub aggressive: bool,
}

impl AiProfile {
    pub fn enemy() -> Self {
        Self {
            aggro_radius: ENEMY_AGGRO_RADIUS,
            patrol_min_radius: 100.0,
            patrol_max_radius: 300.0,
            patrol_acceleration: 150.0,
            patrol_max_speed: 150.0,
            attack_acceleration: 260.0,
            attack_max_speed: 300.0,
            firing_range: 600.0,
            flee_below: 0.0,
            aggressive: true,
        }
    }

    pub fn mothership() -> Self {
        Self {
            aggro_radius: MOTHERSHIP_AGGRO_RADIUS,
            patrol_min_radius: 80.0,
            patrol_max_radius: 200.0,
            patrol_acceleration: 100.0,
            patrol_max_speed: 110.0,
            attack_acceleration: 180.0,
            attack_max_speed: 200.0,
            firing_range: 700.0,
            flee_below: 0.0,
            aggressive: true,
        }
    }

    pub fn escort() -> Self {
        Self {
            aggro_radius: ENEMY_AGGRO_RADIUS,
            patrol_min_radius: 40.0,
            patrol_max_radius: 120.0,
            patrol_acceleration: 200.0,
            patrol_max_speed: 180.0,
            attack_acceleration: 280.0,
            attack_max_speed: 320.0,
            firing_range: 600.0,
            flee_below: 0.25,
            aggressive: true,
        }
    }

    pub fn trader() -> Self {
        Self {
            aggro_radius: TRADER_AGGRO_RADIUS,
            patrol_min_radius: 150.0,
            patrol_max_radius: 400.0,
            patrol_acceleration: 100.0,
            patrol_max_speed: 120.0,
            attack_acceleration: 220.0,
            attack_max_speed: 260.0,
            firing_range: 0.0,
            flee_below: 1.0,
            aggressive: false,
        }
    }

    pub fn defender() -> Self {
        Self {
            aggro_radius: DEFENDER_AGGRO_RADIUS,
            patrol_min_radius: 80.0,
            patrol_max_radius: 200.0,
            patrol_acceleration: 180.0,
            patrol_max_speed: 200.0,
            attack_acceleration: 280.0,
            attack_max_speed: 320.0,
            firing_range: 550.0,
            flee_below: 0.0,
            aggressive: true,
        }
    }

    #[inline]
    pub fn leash_radius(&self) -> f32 {
        self.aggro_radius * LEASH_FACTOR
    }
}

/// Per-ship behavior state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiComponent {
    pub state: AiState,
    pub profile: AiProfile,
    pub anchor: Anchor,
    pub patrol_target: Option<Vec2>,
    pub target: Option<EntityId>,
    /// Last ship that shot at us
    pub recent_enemy: Option<EntityId>,
}

impl AiComponent {
    pub fn new(profile: AiProfile, anchor: Anchor) -> Self {
        Self {
            state: AiState::Patrol,
            profile,
            anchor,
            patrol_target: None,
            target: None,
            recent_enemy: None,
        }
    }
}

/// Output of one decision, applied after all decisions are computed
#[derive(Debug, Clone)]
struct AiDecision {
    id: EntityId,
    state: AiState,
    target: Option<EntityId>,
    patrol_target: Option<Vec2>,
    thrust: Vec2,
    acceleration: f32,
    max_speed: f32,
    facing: Option<f32>,
    fire: Option<Vec2>,
    entered_attack: bool,
    forget_enemy: bool,
}

/// Update all loaded AI ships.
/// Decisions are computed in parallel from a read-only view, then applied in id order.
pub fn update(state: &mut GameState) {
    let candidates: Vec<EntityId> = state
        .loaded
        .entity_ids()
        .iter()
        .copied()
        .filter(|&id| {
            state
                .store
                .entity(id)
                .and_then(Entity::as_ship)
                .is_some_and(|ship| ship.ai.is_some())
        })
        .collect();

    let view: &GameState = state;
    let decisions: Vec<AiDecision> = candidates
        .par_iter()
        .filter_map(|&id| decide(view, id))
        .collect();

    // Group alerts go out after every decision has landed so they are not overwritten
    let mut alerts: Vec<(EntityId, EntityId)> = Vec::new();
    for decision in decisions {
        if let Some(alert) = apply(state, decision) {
            alerts.push(alert);
        }
    }
    for (leader, target) in alerts {
        alert_group(state, leader, target);
    }
}

/// Record an attacker and, for mothership groups, alert the whole group
pub fn on_attacked(state: &mut GameState, target: EntityId, attacker: EntityId) {
    let Some(attacker_allegiance) = state.store.entity(attacker).and_then(Entity::as_ship).map(|s| s.allegiance) else {
        return;
    };
    let Some(ship) = state.store.entity_mut(target).and_then(Entity::as_ship_mut) else {
        return;
    };
    if ship.allegiance == attacker_allegiance {
        return;
    }
    let leader = ship.group_leader(target);
    if let Some(ai) = ship.ai.as_mut() {
        ai.recent_enemy = Some(attacker);
    }
    if let Some(leader) = leader {
        alert_group(state, leader, attacker);
    }
}

/// Mothership broadcast: the mothership and all escorts attack `target`
pub fn alert_group(state: &mut GameState, mothership: EntityId, target: EntityId) {
    let escorts = match state.store.entity(mothership).and_then(Entity::as_ship).map(|s| &s.role) {
        Some(ShipRole::Mothership { escorts }) => escorts.clone(),
        _ => return,
    };

    for member in std::iter::once(mothership).chain(escorts) {
        let Some(ai) = state
            .store
            .entity_mut(member)
            .and_then(Entity::as_ship_mut)
            .and_then(|s| s.ai.as_mut())
        else {
            continue;
        };
        if ai.state != AiState::Flee {
            ai.state = AiState::Attack;
        }
        ai.target = Some(target);
        ai.recent_enemy = Some(target);
    }
    tracing::debug!("Mothership {} alerted its group to {}", mothership, target);
}

/// Returns a pending group alert as (mothership, target)
fn apply(state: &mut GameState, decision: AiDecision) -> Option<(EntityId, EntityId)> {
    let entity = state.store.entity_mut(decision.id)?;
    if let Some(facing) = decision.facing {
        entity.rotation = facing;
    }
    let ship = entity.as_ship_mut()?;
    ship.engine.acceleration = decision.acceleration;
    ship.engine.max_speed = decision.max_speed;
    ship.controls.thrust = decision.thrust;
    ship.controls.boost = false;
    let leader = ship.group_leader(decision.id);
    if let Some(ai) = ship.ai.as_mut() {
        ai.state = decision.state;
        ai.target = decision.target;
        ai.patrol_target = decision.patrol_target;
        if decision.forget_enemy {
            ai.recent_enemy = None;
        }
    }

    if let Some(direction) = decision.fire {
        weapons::fire(state, decision.id, direction);
    }
    if decision.entered_attack {
        return leader.zip(decision.target);
    }
    None
}

/// Nearest threat for this ship: recent attacker, the player, or a hostile intruder
fn acquire_target(state: &GameState, entity: &Entity, ship: &Ship, ai: &AiComponent) -> Option<(EntityId, Vec2)> {
    if let Some(enemy) = ai.recent_enemy.and_then(|id| state.store.entity(id)) {
        return Some((enemy.id, enemy.position));
    }

    match ship.allegiance {
        Allegiance::Hostile => state.player().map(|p| (p.id, p.position)),
        Allegiance::Player => {
            let coord = state.store.coord_of(entity.position);
            let aggro_sq = ai.profile.aggro_radius * ai.profile.aggro_radius;
            state
                .store
                .entities_near_existing(coord, 1)
                .into_iter()
                .filter_map(|id| state.store.entity(id))
                .filter(|other| other.as_ship().is_some_and(|s| s.allegiance == Allegiance::Hostile))
                .map(|other| (other.id, other.position, other.position.distance_sq_to(entity.position)))
                .filter(|&(_, _, dist_sq)| dist_sq < aggro_sq)
                .min_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)))
                .map(|(id, position, _)| (id, position))
        }
        Allegiance::Neutral => None,
    }
}

fn anchor_position(state: &GameState, entity: &Entity, anchor: Anchor) -> Vec2 {
    match anchor {
        Anchor::Point(point) => point,
        Anchor::Entity(id) => state.store.entity(id).map_or(entity.origin, |anchor| anchor.position),
    }
}

fn chunk_has_asteroids(state: &GameState, coord: ChunkCoord) -> bool {
    state.store.peek(coord).is_some_and(|chunk| {
        chunk.content == ChunkContent::Asteroids
            || chunk
                .entity_ids()
                .any(|id| state.store.entity(id).is_some_and(Entity::is_asteroid))
    })
}

fn decide(state: &GameState, id: EntityId) -> Option<AiDecision> {
    let entity = state.store.entity(id)?;
    let ship = entity.as_ship()?;
    let ai = ship.ai.as_ref()?;
    let profile = &ai.profile;

    let threat = acquire_target(state, entity, ship, ai);
    let threat_distance = threat.map(|(_, pos)| pos.distance_to(entity.position));
    let alerted = threat.is_some_and(|(tid, _)| Some(tid) == ai.recent_enemy);
    let recent_alive = ai.recent_enemy.is_some_and(|enemy| state.store.contains(enemy));
    let wants_flee = ship.hull.health_fraction() <= profile.flee_below;
    let within_leash = threat_distance.is_some_and(|d| d <= profile.leash_radius());
    let within_aggro = threat_distance.is_some_and(|d| d < profile.aggro_radius);

    let next_state = match ai.state {
        AiState::Patrol => {
            if within_aggro || (alerted && within_leash) {
                if wants_flee {
                    AiState::Flee
                } else if profile.aggressive {
                    AiState::Attack
                } else {
                    AiState::Patrol
                }
            } else {
                AiState::Patrol
            }
        }
        AiState::Attack => {
            if !within_leash {
                AiState::Patrol
            } else if wants_flee {
                AiState::Flee
            } else {
                AiState::Attack
            }
        }
        AiState::Flee => {
            if within_leash {
                AiState::Flee
            } else {
                AiState::Patrol
            }
        }
    };

    let mut decision = AiDecision {
        id,
        state: next_state,
        target: None,
        patrol_target: ai.patrol_target,
        thrust: Vec2::ZERO,
        acceleration: profile.patrol_acceleration,
        max_speed: profile.patrol_max_speed,
        facing: None,
        fire: None,
        entered_attack: next_state == AiState::Attack && ai.state != AiState::Attack,
        forget_enemy: ai.recent_enemy.is_some() && (!recent_alive || next_state == AiState::Patrol),
    };

    match (next_state, threat) {
        (AiState::Attack, Some((target_id, target_pos))) => {
            let to_target = target_pos - entity.position;
            let distance = to_target.length();
            let direction = to_target.normalize();
            decision.target = Some(target_id);
            decision.acceleration = profile.attack_acceleration;
            decision.max_speed = profile.attack_max_speed;
            decision.facing = Some(to_target.angle());
            decision.thrust = if distance > STANDOFF_DISTANCE {
                direction
            } else if distance < STANDOFF_DISTANCE * 0.5 {
                -direction
            } else {
                Vec2::ZERO
            };
            if distance <= profile.firing_range && ship.weapon.ready() {
                decision.fire = Some(direction);
            }
        }
        (AiState::Flee, Some((threat_id, threat_pos))) => {
            let away = (entity.position - threat_pos).normalize();
            let away = if away.is_zero(1e-6) { Vec2::from_angle(entity.rotation) } else { away };
            decision.target = Some(threat_id);
            decision.acceleration = profile.attack_acceleration;
            decision.max_speed = profile.attack_max_speed;
            decision.thrust = away;
            decision.facing = Some(away.angle());
        }
        _ => {
            decision.state = AiState::Patrol;
            decision.entered_attack = false;
            patrol(state, entity, ai, &mut decision);
        }
    }

    Some(decision)
}

fn patrol(state: &GameState, entity: &Entity, ai: &AiComponent, decision: &mut AiDecision) {
    let profile = &ai.profile;
    let anchor = anchor_position(state, entity, ai.anchor);

    let needs_new_target = match ai.patrol_target {
        None => true,
        Some(target) => {
            target.distance_to(entity.position) < PATROL_ARRIVAL_DISTANCE
                || target.distance_to(anchor) > profile.patrol_max_radius
                || chunk_has_asteroids(state, state.store.coord_of(target))
        }
    };

    let target = if needs_new_target {
        pick_patrol_point(state, entity.id, anchor, profile)
    } else {
        ai.patrol_target.unwrap_or(anchor)
    };

    let direction = (target - entity.position).normalize();
    decision.patrol_target = Some(target);
    decision.thrust = direction;
    decision.acceleration = profile.patrol_acceleration;
    decision.max_speed = profile.patrol_max_speed;
    decision.facing = if entity.velocity.length_sq() > 1.0 {
        Some(entity.velocity.angle())
    } else if !direction.is_zero(1e-6) {
        Some(direction.angle())
    } else {
        None
    };
}

fn pick_patrol_point(state: &GameState, id: EntityId, anchor: Vec2, profile: &AiProfile) -> Vec2 {
    let mut rng = state.rng_for(id, PATROL_SALT);
    let min = profile.patrol_min_radius.min(profile.patrol_max_radius);
    let max = profile.patrol_max_radius.max(min);

    let mut candidate = anchor;
    for _ in 0..MAX_PATROL_PICKS {
        let radius = if max > min { rng.gen_range(min..=max) } else { max };
        candidate = anchor + Vec2::from_polar(rng.gen::<f32>() * TAU, radius);
        if !chunk_has_asteroids(state, state.store.coord_of(candidate)) {
            break;
        }
    }
    candidate
}
