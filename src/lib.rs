//! Night Shift TD - A fixed-timestep tower defense simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (path, waves, combat, economy, phases)
//! - `gacha`: Weighted unit rolls feeding the inventory
//! - `host`: Frame-driven owner of the authoritative session state
//! - `platform`: Clock, periodic triggers and storage backends
//! - `persistence`: Save/load of the session snapshot
//! - `settings`: Player preferences
//! - `web`: Browser bindings (wasm32 only)

pub mod gacha;
pub mod host;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use host::GameHost;
pub use settings::Preferences;

/// Game configuration constants
pub mod consts {
    /// Logic tick interval at 1x speed, in microseconds (~30 Hz)
    pub const TICK_INTERVAL_MICROS: u64 = 33_300;
    /// Maximum logic ticks run in one animation frame
    pub const MAX_TICKS_PER_FRAME: u32 = 5;
    /// Backlog beyond this many ticks is discarded instead of caught up
    pub const OVERLOAD_TICKS: u64 = 2 * MAX_TICKS_PER_FRAME as u64;

    /// Player base
    pub const STARTING_HEALTH: u32 = 20;
    pub const STARTING_COINS: u64 = 500;
    /// Unit every new session owns
    pub const STARTER_UNIT: &str = "freddy";
    /// Coins credited by the terminal override
    pub const ADMIN_COIN_GRANT: u64 = 999_999_999;

    /// Seconds of prep countdown before each wave
    pub const PREP_TIME_SECONDS: u32 = 10;
    /// Clearing this wave wins the run
    pub const VICTORY_WAVE: u32 = 15;

    /// Map
    pub const GRID_SIZE: i32 = 12;

    /// Towers
    pub const MAX_LEVEL: u32 = 10;
    /// Level from which fire rate improves by `FIRE_RATE_BONUS`
    pub const FIRE_RATE_BONUS_LEVEL: u32 = 5;
    pub const FIRE_RATE_BONUS: u32 = 5;
    pub const MIN_FIRE_RATE: u32 = 5;
    pub const UPGRADE_COST_GROWTH: f64 = 1.5;
    pub const TOWER_REFUND_RATIO: f64 = 0.6;
    /// Duplicate pulls and inventory sales refund this share of the unit cost
    pub const UNIT_REFUND_RATIO: f64 = 0.5;

    /// Combat
    pub const PROJECTILE_LIFETIME_TICKS: u64 = 15;
    pub const SLOW_DURATION_TICKS: u32 = 60;
    pub const SLOW_FACTOR: f32 = 0.5;
    pub const BOSS_BASE_DAMAGE: u32 = 5;
    pub const ENEMY_BASE_DAMAGE: u32 = 1;
    /// Spacing (in segment fractions) between consecutive spawns
    pub const SPAWN_SPACING: f32 = 1.5;

    /// Kill reward = floor(max_hp * REWARD_HP_RATIO + REWARD_FLAT)
    pub const REWARD_HP_RATIO: f64 = 0.15;
    pub const REWARD_FLAT: f64 = 5.0;

    /// Potion cost growth per tier
    pub const POTION_TIER_GROWTH: f64 = 2.5;

    /// Gacha
    pub const SINGLE_ROLL_COST: u64 = 100;
    pub const DOUBLE_ROLL_COST: u64 = 200;
    pub const TRIPLE_ROLL_COST: u64 = 300;
}
