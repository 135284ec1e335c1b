/// Tick timing
pub mod physics {
    /// Simulation tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / 60.0;
    /// Largest dt accepted by a single tick (longer frames are clamped)
    pub const MAX_DT: f32 = 0.25;
}

/// World partitioning defaults (overridable via SimulationConfig)
pub mod world {
    /// World units per chunk side
    pub const CHUNK_SIZE: f32 = 600.0;
    /// Chebyshev radius (in chunks) kept active around the player
    pub const LOAD_DISTANCE: i32 = 1;
    /// Chunks within this Chebyshev radius of the origin never spawn content
    pub const SPAWN_SAFE_RADIUS: i32 = 1;
    /// Default world seed
    pub const DEFAULT_SEED: u64 = 0x5EED_D21F;
}

/// Inertial damping rates (per second, applied as v *= exp(-k * dt))
pub mod damping {
    pub const SHIP_LINEAR: f32 = 0.9;
    pub const SHIP_ANGULAR: f32 = 3.0;
    pub const PICKUP_LINEAR: f32 = 1.5;
    /// Asteroids and bullets keep their momentum
    pub const NONE: f32 = 0.0;
}

/// Ship hulls and engines
pub mod ship {
    pub const PLAYER_HEALTH: f32 = 10.0;
    pub const PLAYER_SHIELD: f32 = 5.0;
    pub const PLAYER_ACCELERATION: f32 = 420.0;
    pub const PLAYER_MAX_SPEED: f32 = 450.0;
    /// Multiplier on acceleration and max speed while boosting
    pub const BOOST_MULTIPLIER: f32 = 1.8;

    pub const ENEMY_HEALTH: f32 = 3.0;
    pub const MOTHERSHIP_HEALTH: f32 = 12.0;
    pub const MOTHERSHIP_SHIELD: f32 = 4.0;
    pub const TRADER_HEALTH: f32 = 4.0;
    pub const DEFENDER_HEALTH: f32 = 5.0;

    /// Seconds without damage before shields start recharging
    pub const SHIELD_RECHARGE_DELAY: f32 = 3.0;
    /// Shield points regained per second once recharging
    pub const SHIELD_RECHARGE_RATE: f32 = 1.0;

    /// Bounding radius used by the default shape predicate
    pub const RADIUS: f32 = 24.0;
    pub const MOTHERSHIP_RADIUS: f32 = 40.0;
}

/// Weapons and bullets
pub mod weapon {
    pub const PLAYER_RELOAD: f32 = 0.25;
    pub const ENEMY_RELOAD: f32 = 1.2;
    pub const MOTHERSHIP_RELOAD: f32 = 0.8;
    pub const DEFENDER_RELOAD: f32 = 1.0;
    pub const BULLET_SPEED: f32 = 700.0;
    pub const BULLET_LIFETIME: f32 = 1.5;
    pub const BULLET_DAMAGE: f32 = 1.0;
    pub const BULLET_RADIUS: f32 = 3.0;
    /// Distance in front of the shooter where bullets appear
    pub const SPAWN_OFFSET: f32 = 30.0;
}

/// Asteroid field generation
pub mod asteroid {
    pub const MIN_RADIUS: f32 = 30.0;
    pub const MAX_RADIUS: f32 = 80.0;
    pub const MIN_COUNT: usize = 3;
    pub const MAX_COUNT: usize = 6;
    /// Max spin in radians per second
    pub const MAX_SPIN: f32 = 0.6;
    /// Max drift speed in units per second
    pub const MAX_DRIFT: f32 = 12.0;
    /// Asteroid centers stay this far from chunk edges
    pub const EDGE_MARGIN: f32 = 90.0;
}

/// Collision resolution
pub mod collision {
    /// Chunk radius scanned around each asteroid (5x5 block)
    pub const ASTEROID_SCAN_RADIUS: i32 = 2;
    /// Chunk radius scanned around each bullet (own chunk only)
    pub const BULLET_SCAN_RADIUS: i32 = 0;
    /// Chunk radius scanned around the player for pickups
    pub const PICKUP_SCAN_RADIUS: i32 = 1;
    /// Bullet hit distance against an unshielded ship
    pub const HIT_RADIUS: f32 = 29.0;
    /// Bullet hit distance against a shielded ship
    pub const SHIELDED_HIT_RADIUS: f32 = 35.0;
    /// Impact damage = speed^2 / IMPACT_DAMAGE_DIVISOR
    pub const IMPACT_DAMAGE_DIVISOR: f32 = 100_000.0;
    /// Distance at which the player collects a pickup
    pub const PICKUP_RADIUS: f32 = 40.0;
}

/// AI behavior
pub mod ai {
    /// Patrol target counts as reached within this distance
    pub const PATROL_ARRIVAL_DISTANCE: f32 = 50.0;
    /// Attack/flee end once the target is beyond aggro * LEASH_FACTOR
    pub const LEASH_FACTOR: f32 = 1.5;
    /// Attackers stop closing in at this distance
    pub const STANDOFF_DISTANCE: f32 = 160.0;
    /// Attempts at finding a patrol point outside asteroid chunks
    pub const MAX_PATROL_PICKS: usize = 8;

    pub const ENEMY_AGGRO_RADIUS: f32 = 750.0;
    pub const MOTHERSHIP_AGGRO_RADIUS: f32 = 900.0;
    pub const DEFENDER_AGGRO_RADIUS: f32 = 600.0;
    pub const TRADER_AGGRO_RADIUS: f32 = 400.0;
}

/// Docking at friendly stations
pub mod dock {
    /// Max distance to a station when the dock command is issued
    pub const RANGE: f32 = 400.0;
    /// Distance at which the ship snaps onto the station
    pub const SNAP_DISTANCE: f32 = 1.0;
    /// Fraction of remaining distance closed per second
    pub const HOMING_RATE: f32 = 4.0;
    pub const MAX_SPEED: f32 = 300.0;
}

/// Stations
pub mod station {
    pub const RADIUS: f32 = 70.0;
    pub const HEALTH: f32 = 40.0;
    pub const SPIN: f32 = 0.1;
    pub const ENEMY_SPAWN_INTERVAL: f32 = 12.0;
    pub const FRIENDLY_SPAWN_INTERVAL: f32 = 20.0;
    pub const ENEMY_MAX_DEFENDERS: usize = 3;
    pub const FRIENDLY_MAX_DEFENDERS: usize = 1;
    /// Distance from the station center where defenders appear
    pub const DEFENDER_SPAWN_OFFSET: f32 = 110.0;
}

/// Particle effects
pub mod particles {
    pub const EXPLOSION_DURATION: f32 = 1.2;
    /// Beacon emitters sit this far from their station
    pub const BEACON_OFFSET: f32 = 90.0;
}

/// Pickups dropped by destroyed enemies
pub mod pickup {
    pub const DROP_CHANCE: f64 = 0.25;
    pub const HEALTH_AMOUNT: f32 = 3.0;
    pub const SHIELD_AMOUNT: f32 = 3.0;
}

/// Score awarded for player kills
pub mod score {
    pub const ENEMY: u64 = 100;
    pub const MOTHERSHIP: u64 = 250;
    pub const STATION: u64 = 500;
}

/// Default chunk content weights (overridable via GenerationConfig)
pub mod generation {
    pub const EMPTY_WEIGHT: f32 = 0.62;
    pub const ASTEROID_WEIGHT: f32 = 0.20;
    pub const ENEMY_STATION_WEIGHT: f32 = 0.10;
    pub const FRIENDLY_STATION_WEIGHT: f32 = 0.08;
    pub const ESCORTS_PER_MOTHERSHIP: usize = 3;
}

/// Impact damage for a ship hitting an asteroid at `speed`
#[inline]
pub fn impact_damage(speed: f32) -> f32 {
    speed * speed / collision::IMPACT_DAMAGE_DIVISOR
}
