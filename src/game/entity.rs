//! Entity definitions
//!
//! Entities are a flat tagged union (`EntityKind`) with small components
//! (`Hull`, `Engine`, `Weapon`, `AiComponent`) attached per variant.
//! Cross-entity links (bullet owner, mothership escorts, station defenders)
//! are `EntityId` handles resolved through the chunk store arena.

use serde::{Deserialize, Serialize};

use crate::game::chunk::ChunkCoord;
use crate::game::constants::{collision, damping, particles, ship, station, weapon};
use crate::game::systems::ai::{AiComponent, AiProfile, Anchor};
use crate::util::vec2::Vec2;

/// Arena handle for an entity
pub type EntityId = u64;

/// Which side an entity fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    /// The player and friendly stations
    Player,
    /// Enemy ships and stations
    Hostile,
    /// Traders
    Neutral,
}

impl Allegiance {
    /// Bullets only connect with targets of another allegiance
    #[inline]
    pub fn can_hit(self, other: Allegiance) -> bool {
        self != other
    }
}

/// Health plus regenerating shield
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hull {
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub max_shield: f32,
    /// Seconds since the hull last took damage, saturating at the recharge delay
    pub since_damage: f32,
}

/// Result of applying damage to a hull
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub absorbed_by_shield: f32,
    pub dealt_to_health: f32,
    pub destroyed: bool,
}

impl Hull {
    pub fn new(health: f32, shield: f32) -> Self {
        Self {
            health,
            max_health: health,
            shield,
            max_shield: shield,
            since_damage: ship::SHIELD_RECHARGE_DELAY,
        }
    }

    #[inline]
    pub fn is_shielded(&self) -> bool {
        self.shield > 0.0
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Shield soaks damage first, the remainder hits health
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        let amount = amount.max(0.0);
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let dealt = amount - absorbed;
        self.health -= dealt;
        if amount > 0.0 {
            self.since_damage = 0.0;
        }
        DamageOutcome {
            absorbed_by_shield: absorbed,
            dealt_to_health: dealt,
            destroyed: self.is_destroyed(),
        }
    }

    /// Advance the shield recharge timer
    pub fn recharge(&mut self, dt: f32) {
        self.since_damage = (self.since_damage + dt).min(ship::SHIELD_RECHARGE_DELAY);
        if self.since_damage >= ship::SHIELD_RECHARGE_DELAY && self.shield < self.max_shield {
            self.shield = (self.shield + ship::SHIELD_RECHARGE_RATE * dt).min(self.max_shield);
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn restore_shield(&mut self, amount: f32) {
        self.shield = (self.shield + amount).min(self.max_shield);
    }
}

/// Anything that bullets and asteroids can hurt
pub trait Damageable {
    fn hull(&self) -> &Hull;
    fn hull_mut(&mut self) -> &mut Hull;

    fn damage(&mut self, amount: f32) -> DamageOutcome {
        self.hull_mut().apply_damage(amount)
    }
}

/// Thrust characteristics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Engine {
    pub acceleration: f32,
    pub max_speed: f32,
    pub boost_multiplier: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Engine {
    pub fn new(acceleration: f32, max_speed: f32) -> Self {
        Self {
            acceleration,
            max_speed,
            boost_multiplier: 1.0,
            linear_damping: damping::SHIP_LINEAR,
            angular_damping: damping::SHIP_ANGULAR,
        }
    }
}

/// Per-tick steering input (player intents or AI decisions)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Controls {
    /// Desired thrust direction; zero for none
    pub thrust: Vec2,
    pub boost: bool,
}

/// Reload-limited gun
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Weapon {
    pub reload_time: f32,
    pub cooldown: f32,
    pub damage: f32,
    pub bullet_speed: f32,
    pub bullet_lifetime: f32,
}

impl Weapon {
    pub fn new(reload_time: f32) -> Self {
        Self {
            reload_time,
            cooldown: 0.0,
            damage: weapon::BULLET_DAMAGE,
            bullet_speed: weapon::BULLET_SPEED,
            bullet_lifetime: weapon::BULLET_LIFETIME,
        }
    }

    #[inline]
    pub fn ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }
}

/// Player docking progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DockState {
    #[default]
    Free,
    Approaching(EntityId),
    Docked(EntityId),
}

impl DockState {
    pub fn is_engaged(&self) -> bool {
        !matches!(self, DockState::Free)
    }
}

/// Ship role; replaces the ship class hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShipRole {
    Player,
    Enemy,
    Mothership { escorts: Vec<EntityId> },
    Escort { mothership: EntityId },
    Trader,
    Defender { station: EntityId },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ship {
    pub role: ShipRole,
    pub allegiance: Allegiance,
    pub hull: Hull,
    pub engine: Engine,
    pub weapon: Weapon,
    pub controls: Controls,
    pub ai: Option<AiComponent>,
    pub dock: DockState,
    pub radius: f32,
}

impl Ship {
    pub fn player() -> Self {
        let mut engine = Engine::new(ship::PLAYER_ACCELERATION, ship::PLAYER_MAX_SPEED);
        engine.boost_multiplier = ship::BOOST_MULTIPLIER;
        Self {
            role: ShipRole::Player,
            allegiance: Allegiance::Player,
            hull: Hull::new(ship::PLAYER_HEALTH, ship::PLAYER_SHIELD),
            engine,
            weapon: Weapon::new(weapon::PLAYER_RELOAD),
            controls: Controls::default(),
            ai: None,
            dock: DockState::Free,
            radius: ship::RADIUS,
        }
    }

    fn with_ai(role: ShipRole, allegiance: Allegiance, hull: Hull, reload: f32, profile: AiProfile, anchor: Anchor) -> Self {
        Self {
            role,
            allegiance,
            hull,
            engine: Engine::new(profile.attack_acceleration, profile.attack_max_speed),
            weapon: Weapon::new(reload),
            controls: Controls::default(),
            ai: Some(AiComponent::new(profile, anchor)),
            dock: DockState::Free,
            radius: ship::RADIUS,
        }
    }

    pub fn enemy(anchor: Anchor) -> Self {
        Self::with_ai(
            ShipRole::Enemy,
            Allegiance::Hostile,
            Hull::new(ship::ENEMY_HEALTH, 0.0),
            weapon::ENEMY_RELOAD,
            AiProfile::enemy(),
            anchor,
        )
    }

    pub fn mothership(anchor: Anchor) -> Self {
        let mut mothership = Self::with_ai(
            ShipRole::Mothership { escorts: Vec::new() },
            Allegiance::Hostile,
            Hull::new(ship::MOTHERSHIP_HEALTH, ship::MOTHERSHIP_SHIELD),
            weapon::MOTHERSHIP_RELOAD,
            AiProfile::mothership(),
            anchor,
        );
        mothership.radius = ship::MOTHERSHIP_RADIUS;
        mothership
    }

    pub fn escort(mothership: EntityId) -> Self {
        Self::with_ai(
            ShipRole::Escort { mothership },
            Allegiance::Hostile,
            Hull::new(ship::ENEMY_HEALTH, 0.0),
            weapon::ENEMY_RELOAD,
            AiProfile::escort(),
            Anchor::Entity(mothership),
        )
    }

    pub fn trader(anchor: Anchor) -> Self {
        Self::with_ai(
            ShipRole::Trader,
            Allegiance::Neutral,
            Hull::new(ship::TRADER_HEALTH, 0.0),
            weapon::ENEMY_RELOAD,
            AiProfile::trader(),
            anchor,
        )
    }

    pub fn defender(station: EntityId, allegiance: Allegiance) -> Self {
        Self::with_ai(
            ShipRole::Defender { station },
            allegiance,
            Hull::new(ship::DEFENDER_HEALTH, 0.0),
            weapon::DEFENDER_RELOAD,
            AiProfile::defender(),
            Anchor::Entity(station),
        )
    }

    pub fn is_player(&self) -> bool {
        matches!(self.role, ShipRole::Player)
    }

    /// Mothership this ship belongs to, or itself when it is one
    pub fn group_leader(&self, own_id: EntityId) -> Option<EntityId> {
        match self.role {
            ShipRole::Mothership { .. } => Some(own_id),
            ShipRole::Escort { mothership } => Some(mothership),
            _ => None,
        }
    }

    /// Bullet hit distance, larger while shields are up
    pub fn hit_radius(&self) -> f32 {
        if self.hull.is_shielded() {
            collision::SHIELDED_HIT_RADIUS
        } else {
            collision::HIT_RADIUS
        }
    }
}

impl Damageable for Ship {
    fn hull(&self) -> &Hull {
        &self.hull
    }

    fn hull_mut(&mut self) -> &mut Hull {
        &mut self.hull
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asteroid {
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bullet {
    pub owner: EntityId,
    pub allegiance: Allegiance,
    pub damage: f32,
    pub lifetime: f32,
}

impl Bullet {
    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Health,
    Shield,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    pub amount: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleEffect {
    Explosion,
    Beacon,
}

/// Emitter state; particles themselves belong to the renderer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticleSystem {
    pub effect: ParticleEffect,
    pub elapsed: f32,
    /// `None` for continuous emitters
    pub duration: Option<f32>,
    /// Set while the emitter is outside the loaded set
    pub paused: bool,
}

impl ParticleSystem {
    pub fn explosion() -> Self {
        Self {
            effect: ParticleEffect::Explosion,
            elapsed: 0.0,
            duration: Some(particles::EXPLOSION_DURATION),
            paused: false,
        }
    }

    pub fn beacon() -> Self {
        Self {
            effect: ParticleEffect::Beacon,
            elapsed: 0.0,
            duration: None,
            paused: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.duration.is_some_and(|d| self.elapsed >= d)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    pub allegiance: Allegiance,
    pub hull: Hull,
    pub radius: f32,
    pub spawn_timer: f32,
    pub spawn_interval: f32,
    pub max_defenders: usize,
    pub defenders: Vec<EntityId>,
}

impl Station {
    pub fn enemy() -> Self {
        Self {
            allegiance: Allegiance::Hostile,
            hull: Hull::new(station::HEALTH, 0.0),
            radius: station::RADIUS,
            spawn_timer: station::ENEMY_SPAWN_INTERVAL,
            spawn_interval: station::ENEMY_SPAWN_INTERVAL,
            max_defenders: station::ENEMY_MAX_DEFENDERS,
            defenders: Vec::new(),
        }
    }

    pub fn friendly() -> Self {
        Self {
            allegiance: Allegiance::Player,
            hull: Hull::new(station::HEALTH, 0.0),
            radius: station::RADIUS,
            spawn_timer: station::FRIENDLY_SPAWN_INTERVAL,
            spawn_interval: station::FRIENDLY_SPAWN_INTERVAL,
            max_defenders: station::FRIENDLY_MAX_DEFENDERS,
            defenders: Vec::new(),
        }
    }

    pub fn is_dockable(&self) -> bool {
        self.allegiance == Allegiance::Player
    }
}

impl Damageable for Station {
    fn hull(&self) -> &Hull {
        &self.hull
    }

    fn hull_mut(&mut self) -> &mut Hull {
        &mut self.hull
    }
}

/// Entity variant with its variant-specific components
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EntityKind {
    Ship(Ship),
    Asteroid(Asteroid),
    Bullet(Bullet),
    Pickup(Pickup),
    ParticleSystem(ParticleSystem),
    Station(Station),
}

/// Sub-pass an entity is integrated in; earlier passes finish first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpdatePass {
    /// Ships, stations, particle systems, pickups
    Primary,
    Asteroids,
    Bullets,
}

impl UpdatePass {
    pub const ORDER: [UpdatePass; 3] = [UpdatePass::Primary, UpdatePass::Asteroids, UpdatePass::Bullets];
}

/// Render tag handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualKind {
    PlayerShip,
    EnemyShip,
    Mothership,
    Escort,
    Trader,
    Defender,
    Asteroid,
    Bullet,
    HealthPickup,
    ShieldPickup,
    Explosion,
    Beacon,
    EnemyStation,
    FriendlyStation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians
    pub rotation: f32,
    /// Radians per second
    pub angular_velocity: f32,
    pub destroyed: bool,
    /// Cached home chunk; `None` until inserted into a store
    pub chunk: Option<ChunkCoord>,
    /// Where the entity was spawned; fallback patrol anchor
    pub origin: Vec2,
    pub kind: EntityKind,
}

impl Entity {
    /// New entity; the id is assigned when added to a chunk store
    pub fn new(position: Vec2, kind: EntityKind) -> Self {
        Self {
            id: 0,
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            destroyed: false,
            chunk: None,
            origin: position,
            kind,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_spin(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn ship(position: Vec2, ship: Ship) -> Self {
        Self::new(position, EntityKind::Ship(ship))
    }

    pub fn asteroid(position: Vec2, radius: f32) -> Self {
        Self::new(position, EntityKind::Asteroid(Asteroid { radius }))
    }

    pub fn station(position: Vec2, station: Station) -> Self {
        Self::new(position, EntityKind::Station(station))
    }

    pub fn pickup(position: Vec2, kind: PickupKind, amount: f32) -> Self {
        Self::new(position, EntityKind::Pickup(Pickup { kind, amount }))
    }

    pub fn particles(position: Vec2, system: ParticleSystem) -> Self {
        Self::new(position, EntityKind::ParticleSystem(system))
    }

    pub fn bullet(position: Vec2, velocity: Vec2, bullet: Bullet) -> Self {
        Self::new(position, EntityKind::Bullet(bullet))
            .with_velocity(velocity)
            .with_rotation(velocity.angle())
    }

    pub fn as_ship(&self) -> Option<&Ship> {
        match &self.kind {
            EntityKind::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_ship_mut(&mut self) -> Option<&mut Ship> {
        match &mut self.kind {
            EntityKind::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_station(&self) -> Option<&Station> {
        match &self.kind {
            EntityKind::Station(station) => Some(station),
            _ => None,
        }
    }

    pub fn as_station_mut(&mut self) -> Option<&mut Station> {
        match &mut self.kind {
            EntityKind::Station(station) => Some(station),
            _ => None,
        }
    }

    pub fn as_bullet(&self) -> Option<&Bullet> {
        match &self.kind {
            EntityKind::Bullet(bullet) => Some(bullet),
            _ => None,
        }
    }

    pub fn is_asteroid(&self) -> bool {
        matches!(self.kind, EntityKind::Asteroid(_))
    }

    pub fn is_player(&self) -> bool {
        self.as_ship().is_some_and(Ship::is_player)
    }

    /// Damage capability, dispatched by variant
    pub fn as_damageable(&self) -> Option<&dyn Damageable> {
        match &self.kind {
            EntityKind::Ship(ship) => Some(ship),
            EntityKind::Station(station) => Some(station),
            _ => None,
        }
    }

    pub fn as_damageable_mut(&mut self) -> Option<&mut dyn Damageable> {
        match &mut self.kind {
            EntityKind::Ship(ship) => Some(ship),
            EntityKind::Station(station) => Some(station),
            _ => None,
        }
    }

    pub fn allegiance(&self) -> Option<Allegiance> {
        match &self.kind {
            EntityKind::Ship(ship) => Some(ship.allegiance),
            EntityKind::Station(station) => Some(station.allegiance),
            EntityKind::Bullet(bullet) => Some(bullet.allegiance),
            _ => None,
        }
    }

    /// Bounding radius for the default shape predicate
    pub fn bounding_radius(&self) -> f32 {
        match &self.kind {
            EntityKind::Ship(ship) => ship.radius,
            EntityKind::Asteroid(asteroid) => asteroid.radius,
            EntityKind::Bullet(_) => weapon::BULLET_RADIUS,
            EntityKind::Pickup(_) => collision::PICKUP_RADIUS * 0.5,
            EntityKind::ParticleSystem(_) => 0.0,
            EntityKind::Station(station) => station.radius,
        }
    }

    pub fn update_pass(&self) -> UpdatePass {
        match self.kind {
            EntityKind::Asteroid(_) => UpdatePass::Asteroids,
            EntityKind::Bullet(_) => UpdatePass::Bullets,
            _ => UpdatePass::Primary,
        }
    }

    pub fn visual_kind(&self) -> VisualKind {
        match &self.kind {
            EntityKind::Ship(ship) => match ship.role {
                ShipRole::Player => VisualKind::PlayerShip,
                ShipRole::Enemy => VisualKind::EnemyShip,
                ShipRole::Mothership { .. } => VisualKind::Mothership,
                ShipRole::Escort { .. } => VisualKind::Escort,
                ShipRole::Trader => VisualKind::Trader,
                ShipRole::Defender { .. } => VisualKind::Defender,
            },
            EntityKind::Asteroid(_) => VisualKind::Asteroid,
            EntityKind::Bullet(_) => VisualKind::Bullet,
            EntityKind::Pickup(pickup) => match pickup.kind {
                PickupKind::Health => VisualKind::HealthPickup,
                PickupKind::Shield => VisualKind::ShieldPickup,
            },
            EntityKind::ParticleSystem(system) => match system.effect {
                ParticleEffect::Explosion => VisualKind::Explosion,
                ParticleEffect::Beacon => VisualKind::Beacon,
            },
            EntityKind::Station(station) => match station.allegiance {
                Allegiance::Hostile => VisualKind::EnemyStation,
                _ => VisualKind::FriendlyStation,
            },
        }
    }

    /// Draw order, higher draws on top
    pub fn z_order(&self) -> i32 {
        match &self.kind {
            EntityKind::Station(_) => 0,
            EntityKind::Asteroid(_) => 1,
            EntityKind::Pickup(_) => 2,
            EntityKind::Ship(ship) if ship.is_player() => 5,
            EntityKind::Ship(_) => 4,
            EntityKind::Bullet(_) => 6,
            EntityKind::ParticleSystem(_) => 7,
        }
    }

    /// Health fraction for damageable entities
    pub fn health_fraction(&self) -> Option<f32> {
        self.as_damageable().map(|d| d.hull().health_fraction())
    }

    /// Called when the entity leaves the loaded set
    pub fn on_unload(&mut self) {
        if let EntityKind::ParticleSystem(system) = &mut self.kind {
            system.paused = true;
        }
    }

    /// Called when the entity re-enters the loaded set
    pub fn on_load(&mut self) {
        if let EntityKind::ParticleSystem(system) = &mut self.kind {
            system.paused = false;
        }
    }
}
