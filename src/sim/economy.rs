//! Player actions that spend or earn coins
//!
//! Every action validates against the committed state first and only then
//! mutates it. A rejected action returns an [`ActionError`] and leaves the
//! state exactly as it was.

use std::fmt;

use super::catalog::{Catalog, PotionKind, PotionTier, Rarity, potion_cost, potion_effect, speed_cost};
use super::path::{GridPos, Path};
use super::state::{ActiveEffect, EntityId, GameState, Tower};
use crate::consts::*;

/// Why an action was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Not enough coins.
    InsufficientFunds { cost: u64, have: u64 },
    /// Cell is part of the enemy path.
    CellOnPath,
    /// Cell already holds a tower.
    CellOccupied,
    /// Cell is outside the map.
    OutOfBounds,
    /// No unit with that id exists.
    UnknownUnit,
    /// Unit exists but is not in the inventory.
    UnitNotOwned,
    /// No placed tower with that id.
    UnknownTower,
    /// Tower is already at the maximum level.
    MaxLevel,
    /// No potion of that kind and tier in stock.
    NoPotionStock,
    /// Speed tier is already unlocked.
    SpeedAlreadyOwned,
    /// Speed tier has not been unlocked.
    SpeedNotOwned,
    /// No such speed tier.
    UnknownSpeed,
    /// Difficulty can only be chosen once per session.
    DifficultyAlreadyChosen,
    /// Action needs a difficulty to be chosen first.
    DifficultyNotChosen,
    /// Action is not allowed in the current phase.
    WrongPhase,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::InsufficientFunds { cost, have } => {
                write!(f, "insufficient funds: costs {}, have {}", cost, have)
            }
            ActionError::CellOnPath => write!(f, "cell is on the enemy path"),
            ActionError::CellOccupied => write!(f, "cell is already occupied"),
            ActionError::OutOfBounds => write!(f, "cell is outside the map"),
            ActionError::UnknownUnit => write!(f, "unknown unit"),
            ActionError::UnitNotOwned => write!(f, "unit is not owned"),
            ActionError::UnknownTower => write!(f, "tower not found"),
            ActionError::MaxLevel => write!(f, "tower is at max level"),
            ActionError::NoPotionStock => write!(f, "no potion in stock"),
            ActionError::SpeedAlreadyOwned => write!(f, "speed tier already owned"),
            ActionError::SpeedNotOwned => write!(f, "speed tier not owned"),
            ActionError::UnknownSpeed => write!(f, "unknown speed tier"),
            ActionError::DifficultyAlreadyChosen => write!(f, "difficulty already chosen"),
            ActionError::DifficultyNotChosen => write!(f, "difficulty not chosen"),
            ActionError::WrongPhase => write!(f, "not allowed in the current phase"),
        }
    }
}

impl std::error::Error for ActionError {}

fn ensure_funds(state: &GameState, cost: u64) -> Result<(), ActionError> {
    if state.coins < cost {
        return Err(ActionError::InsufficientFunds {
            cost,
            have: state.coins,
        });
    }
    Ok(())
}

/// Price of raising a tower from `level` to `level + 1`
pub fn upgrade_cost(base_cost: u64, level: u32) -> u64 {
    (base_cost as f64 * UPGRADE_COST_GROWTH.powi(level as i32)).floor() as u64
}

/// Total coins sunk into a tower at `level` (purchase plus every upgrade)
pub fn total_spent(base_cost: u64, level: u32) -> u64 {
    (1..level).fold(base_cost, |sum, l| sum + upgrade_cost(base_cost, l))
}

/// Coins returned when selling a tower at `level`
pub fn sell_refund(base_cost: u64, level: u32) -> u64 {
    (total_spent(base_cost, level) as f64 * TOWER_REFUND_RATIO).floor() as u64
}

/// Coins returned for a duplicate pull or an inventory sale
pub fn unit_refund(base_cost: u64) -> u64 {
    (base_cost as f64 * UNIT_REFUND_RATIO).floor() as u64
}

/// Buy and place a tower of an owned unit at `pos`
pub fn place_tower(
    state: &mut GameState,
    catalog: &Catalog,
    path: &Path,
    unit_id: &str,
    pos: GridPos,
) -> Result<EntityId, ActionError> {
    let unit = catalog.get(unit_id).ok_or(ActionError::UnknownUnit)?;
    if !state.inventory.contains(unit_id) {
        return Err(ActionError::UnitNotOwned);
    }
    if !(0..GRID_SIZE).contains(&pos.x) || !(0..GRID_SIZE).contains(&pos.y) {
        return Err(ActionError::OutOfBounds);
    }
    if path.is_on_path(pos.x, pos.y) {
        return Err(ActionError::CellOnPath);
    }
    if state.tower_at(pos).is_some() {
        return Err(ActionError::CellOccupied);
    }
    ensure_funds(state, unit.cost)?;

    state.coins -= unit.cost;
    let id = state.next_entity_id();
    state.towers.push(Tower {
        id,
        unit_id: unit.id.to_string(),
        pos,
        level: 1,
        last_fired: 0,
    });
    log::debug!("Placed {} at ({}, {}) for {}", unit.id, pos.x, pos.y, unit.cost);
    Ok(id)
}

/// Raise a tower one level, returning the price paid
pub fn upgrade_tower(state: &mut GameState, catalog: &Catalog, tower_id: EntityId) -> Result<u64, ActionError> {
    let tower = state.tower(tower_id).ok_or(ActionError::UnknownTower)?;
    if tower.level >= MAX_LEVEL {
        return Err(ActionError::MaxLevel);
    }
    let unit = catalog.get(&tower.unit_id).ok_or(ActionError::UnknownUnit)?;
    let cost = upgrade_cost(unit.cost, tower.level);
    ensure_funds(state, cost)?;

    state.coins -= cost;
    let Some(tower) = state.towers.iter_mut().find(|t| t.id == tower_id) else {
        return Err(ActionError::UnknownTower);
    };
    tower.level += 1;
    log::debug!("Upgraded tower {} to level {} for {}", tower_id, tower.level, cost);
    Ok(cost)
}

/// Remove a tower and refund part of what was spent on it
pub fn sell_tower(state: &mut GameState, catalog: &Catalog, tower_id: EntityId) -> Result<u64, ActionError> {
    let tower = state.tower(tower_id).ok_or(ActionError::UnknownTower)?;
    let unit = catalog.get(&tower.unit_id).ok_or(ActionError::UnknownUnit)?;
    let refund = sell_refund(unit.cost, tower.level);

    state.coins += refund;
    state.towers.retain(|t| t.id != tower_id);
    log::debug!("Sold tower {} for {}", tower_id, refund);
    Ok(refund)
}

/// Inventory and coin changes produced by one pull
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// Newly unlocked unit ids, in roll order
    pub unlocked: Vec<String>,
    /// Coins refunded for duplicates
    pub refunded: u64,
    /// Number of duplicate rolls
    pub duplicates: u32,
}

/// Apply rolled unit ids to the inventory.
///
/// Ownership is judged against the inventory as it was before the pull:
/// units owned beforehand refund half their cost, new ones are unlocked, and
/// a repeat of a unit first unlocked in this pull just collapses into it.
/// The auto-sell toggle does not change what happens to a first unlock.
/// Unknown ids are skipped.
pub fn resolve_pull(state: &mut GameState, catalog: &Catalog, unit_ids: &[&str]) -> PullOutcome {
    let owned_before = state.inventory.clone();
    let mut outcome = PullOutcome::default();
    for id in unit_ids {
        let Some(unit) = catalog.get(id) else {
            log::warn!("Pull produced unknown unit {:?}", id);
            continue;
        };
        if owned_before.contains(unit.id) {
            let refund = unit_refund(unit.cost);
            state.coins += refund;
            outcome.refunded += refund;
            outcome.duplicates += 1;
        } else if state.inventory.insert(unit.id.to_string()) {
            outcome.unlocked.push(unit.id.to_string());
        }
    }
    log::debug!(
        "Pull resolved: {} unlocked, {} duplicates (+{})",
        outcome.unlocked.len(),
        outcome.duplicates,
        outcome.refunded
    );
    outcome
}

/// Sell an owned unit out of the inventory
pub fn sell_unit(state: &mut GameState, catalog: &Catalog, unit_id: &str) -> Result<u64, ActionError> {
    let unit = catalog.get(unit_id).ok_or(ActionError::UnknownUnit)?;
    if !state.inventory.contains(unit_id) {
        return Err(ActionError::UnitNotOwned);
    }
    let refund = unit_refund(unit.cost);
    state.inventory.remove(unit_id);
    state.coins += refund;
    log::debug!("Sold unit {} for {}", unit_id, refund);
    Ok(refund)
}

pub fn buy_potion(state: &mut GameState, kind: PotionKind, tier: PotionTier) -> Result<u64, ActionError> {
    let cost = potion_cost(kind, tier);
    ensure_funds(state, cost)?;
    state.coins -= cost;
    state.potions.add(kind, tier);
    log::debug!("Bought {:?} potion tier {} for {}", kind, tier.level(), cost);
    Ok(cost)
}

/// Drink a potion, replacing any running effect of the same kind
pub fn use_potion(
    state: &mut GameState,
    kind: PotionKind,
    tier: PotionTier,
    now_ms: u64,
) -> Result<ActiveEffect, ActionError> {
    if !state.potions.take(kind, tier) {
        return Err(ActionError::NoPotionStock);
    }
    let data = potion_effect(kind, tier);
    let effect = ActiveEffect {
        kind,
        tier,
        multiplier: data.multiplier,
        expires_at_ms: now_ms + data.duration_ms,
    };
    state.effects.retain(|e| e.kind != kind);
    state.effects.push(effect);
    log::debug!("{:?} x{} active until {}", kind, data.multiplier, effect.expires_at_ms);
    Ok(effect)
}

/// Drop effects that have expired at `now_ms`, returning how many went
pub fn prune_effects(state: &mut GameState, now_ms: u64) -> usize {
    let before = state.effects.len();
    state.effects.retain(|e| e.expires_at_ms > now_ms);
    before - state.effects.len()
}

/// Unlock a speed tier and switch to it
pub fn buy_speed(state: &mut GameState, multiplier: u32) -> Result<u64, ActionError> {
    let cost = speed_cost(multiplier).ok_or(ActionError::UnknownSpeed)?;
    if state.unlocked_speeds.contains(&multiplier) {
        return Err(ActionError::SpeedAlreadyOwned);
    }
    ensure_funds(state, cost)?;
    state.coins -= cost;
    state.unlocked_speeds.insert(multiplier);
    state.speed = multiplier;
    log::debug!("Unlocked {}x speed for {}", multiplier, cost);
    Ok(cost)
}

/// Switch to an already unlocked speed tier
pub fn select_speed(state: &mut GameState, multiplier: u32) -> Result<(), ActionError> {
    if speed_cost(multiplier).is_none() {
        return Err(ActionError::UnknownSpeed);
    }
    if !state.unlocked_speeds.contains(&multiplier) {
        return Err(ActionError::SpeedNotOwned);
    }
    state.speed = multiplier;
    Ok(())
}

pub fn toggle_auto_sell(state: &mut GameState, rarity: Rarity) -> bool {
    state.preferences.toggle_auto_sell(rarity)
}

/// Terminal override: credit coins outside the normal economy
pub fn admin_grant_coins(state: &mut GameState, amount: u64) -> u64 {
    state.coins = state.coins.saturating_add(amount);
    log::info!("Admin override: granted {} coins", amount);
    state.coins
}

pub fn set_auto_skip_prep(state: &mut GameState, enabled: bool) {
    state.preferences.auto_skip_prep = enabled;
}
