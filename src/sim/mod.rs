//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Wall-clock time only as explicit arguments (potion expiry, scheduling)
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod catalog;
pub mod combat;
pub mod economy;
pub mod path;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod wave;

pub use catalog::{
    Ability, Catalog, Difficulty, DifficultyCoefficients, PotionEffect, PotionKind, PotionTier,
    Rarity, SPEED_TIERS, UnitDef, potion_cost, potion_effect, speed_cost,
};
pub use combat::{BatchOutcome, TickOutcome, advance_one_tick, run_batch, step};
pub use economy::{
    ActionError, PullOutcome, admin_grant_coins, buy_potion, buy_speed, place_tower,
    prune_effects, resolve_pull, select_speed, sell_refund, sell_tower, sell_unit, set_auto_skip_prep, toggle_auto_sell,
    upgrade_cost, upgrade_tower, use_potion,
};
pub use path::{GridPos, Path, PathError};
pub use scheduler::{FramePlan, TickScheduler, tick_interval};
pub use session::{
    AdminCommand, PrepProgress, WaveStart, continue_after_victory, give_up, prep_second, reset_session,
    restart_shift, select_difficulty, skip_prep, start_wave,
};
pub use state::{
    ActiveEffect, Enemy, EnemyClass, EntityId, GameState, Lifecycle, PathPos, Phase, Projectile,
    Tower,
};
pub use wave::{generate_wave, wave_size, wave_title};
