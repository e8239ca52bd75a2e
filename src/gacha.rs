//! Weighted unit rolls
//!
//! Each roll walks the catalog in table order, subtracting unit weights from
//! a uniform draw until it lands. A unit's weight is its rarity weight, with
//! every non-Common weight scaled by the active Luck multiplier.

use std::time::Duration;

use rand::Rng;

use crate::consts::*;
use crate::sim::{ActionError, Catalog, GameState, PotionKind, PullOutcome, Rarity, UnitDef, resolve_pull};

/// Shortest reveal animation
const MIN_REVEAL: Duration = Duration::from_millis(200);
const BASE_REVEAL: Duration = Duration::from_millis(2_000);

/// How many units one pull rolls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullSize {
    Single,
    Double,
    Triple,
}

impl PullSize {
    pub fn count(&self) -> usize {
        match self {
            PullSize::Single => 1,
            PullSize::Double => 2,
            PullSize::Triple => 3,
        }
    }

    pub fn cost(&self) -> u64 {
        match self {
            PullSize::Single => SINGLE_ROLL_COST,
            PullSize::Double => DOUBLE_ROLL_COST,
            PullSize::Triple => TRIPLE_ROLL_COST,
        }
    }
}

/// Roll weight of `unit` under `luck_mult`
pub fn unit_weight(unit: &UnitDef, luck_mult: f64) -> f64 {
    let weight = unit.rarity.gacha_weight();
    if unit.rarity == Rarity::Common {
        weight
    } else {
        weight * luck_mult
    }
}

/// Pick the unit a uniform `draw` in [0, 1) lands on
pub fn pick_unit(catalog: &Catalog, luck_mult: f64, draw: f64) -> Option<&'static UnitDef> {
    let units = catalog.units();
    let total: f64 = units.iter().map(|u| unit_weight(u, luck_mult)).sum();
    let mut remaining = draw * total;
    for unit in units {
        let weight = unit_weight(unit, luck_mult);
        if remaining < weight {
            return Some(unit);
        }
        remaining -= weight;
    }
    // Float drift past the last bucket
    units.first()
}

/// Roll `count` units
pub fn roll_units<R: Rng>(
    rng: &mut R,
    catalog: &Catalog,
    count: usize,
    luck_mult: f64,
) -> Vec<&'static UnitDef> {
    (0..count)
        .filter_map(|_| pick_unit(catalog, luck_mult, rng.random::<f64>()))
        .collect()
}

/// Delay before the results of a pull are shown
pub fn reveal_delay(speed_mult: f64) -> Duration {
    let millis = (BASE_REVEAL.as_millis() as f64 * speed_mult.max(0.0)).round() as u64;
    Duration::from_millis(millis).max(MIN_REVEAL)
}

/// Rolled units plus their effect on the inventory
#[derive(Debug, Clone, PartialEq)]
pub struct PullResult {
    pub units: Vec<&'static str>,
    pub outcome: PullOutcome,
    pub reveal_delay: Duration,
}

/// Pay for and resolve a pull, using the potion effects active at `now_ms`
pub fn pull<R: Rng>(
    state: &mut GameState,
    catalog: &Catalog,
    size: PullSize,
    rng: &mut R,
    now_ms: u64,
) -> Result<PullResult, ActionError> {
    let cost = size.cost();
    if state.coins < cost {
        return Err(ActionError::InsufficientFunds {
            cost,
            have: state.coins,
        });
    }

    state.coins -= cost;
    let luck = state.effect_multiplier_at(PotionKind::Luck, now_ms);
    let speed = state.effect_multiplier_at(PotionKind::Speed, now_ms);
    let units: Vec<&'static str> = roll_units(rng, catalog, size.count(), luck)
        .into_iter()
        .map(|u| u.id)
        .collect();
    log::debug!("Pulled {:?} for {} (luck x{})", units, cost, luck);

    let outcome = resolve_pull(state, catalog, &units);
    Ok(PullResult {
        units,
        outcome,
        reveal_delay: reveal_delay(speed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{PotionTier, buy_potion, use_potion};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_pull_costs() {
        assert_eq!(PullSize::Single.cost(), 100);
        assert_eq!(PullSize::Double.cost(), 200);
        assert_eq!(PullSize::Triple.cost(), 300);
        assert_eq!(PullSize::Triple.count(), 3);
    }

    #[test]
    fn test_pick_walks_table_order() {
        let catalog = Catalog::standard();
        assert_eq!(pick_unit(&catalog, 1.0, 0.0).unwrap().id, "freddy");
        let last = catalog.units().last().unwrap();
        assert_eq!(pick_unit(&catalog, 1.0, 0.999_999_999).unwrap().id, last.id);
    }

    #[test]
    fn test_luck_only_scales_non_common() {
        let catalog = Catalog::standard();
        let freddy = catalog.get("freddy").unwrap();
        assert_eq!(unit_weight(freddy, 2.5), unit_weight(freddy, 1.0));
        let rare = catalog.units().iter().find(|u| u.rarity == Rarity::Rare).unwrap();
        assert_eq!(unit_weight(rare, 2.5), unit_weight(rare, 1.0) * 2.5);
    }

    #[test]
    fn test_rolls_are_seed_deterministic() {
        let catalog = Catalog::standard();
        let a = roll_units(&mut Pcg32::seed_from_u64(7), &catalog, 20, 1.0);
        let b = roll_units(&mut Pcg32::seed_from_u64(7), &catalog, 20, 1.0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn test_commons_dominate() {
        let catalog = Catalog::standard();
        let rolls = roll_units(&mut Pcg32::seed_from_u64(42), &catalog, 2_000, 1.0);
        let commons = rolls.iter().filter(|u| u.rarity == Rarity::Common).count();
        let secrets = rolls.iter().filter(|u| u.rarity == Rarity::Secret).count();
        assert!(commons > 1_000, "commons = {}", commons);
        assert!(secrets < 50, "secrets = {}", secrets);
    }

    #[test]
    fn test_reveal_delay() {
        assert_eq!(reveal_delay(1.0), Duration::from_millis(2_000));
        assert_eq!(reveal_delay(0.4), Duration::from_millis(800));
        assert_eq!(reveal_delay(0.05), Duration::from_millis(200));
    }

    #[test]
    fn test_pull_charges_and_resolves() {
        let catalog = Catalog::standard();
        let mut state = GameState::new();
        state.coins = 300;
        let result = pull(&mut state, &catalog, PullSize::Triple, &mut Pcg32::seed_from_u64(3), 0).unwrap();
        assert_eq!(result.units.len(), 3);
        assert_eq!(state.coins, result.outcome.refunded);
        for id in &result.units {
            assert!(state.inventory.contains(*id));
        }
    }

    #[test]
    fn test_pull_insufficient_funds_is_noop() {
        let catalog = Catalog::standard();
        let mut state = GameState::new();
        state.coins = 99;
        let before = state.inventory.clone();
        assert_eq!(
            pull(&mut state, &catalog, PullSize::Single, &mut Pcg32::seed_from_u64(1), 0),
            Err(ActionError::InsufficientFunds { cost: 100, have: 99 })
        );
        assert_eq!(state.coins, 99);
        assert_eq!(state.inventory, before);
    }

    #[test]
    fn test_speed_potion_shortens_reveal_until_expiry() {
        let catalog = Catalog::standard();
        let mut state = GameState::new();
        state.coins = 1_000;
        buy_potion(&mut state, PotionKind::Speed, PotionTier::Two).unwrap();
        use_potion(&mut state, PotionKind::Speed, PotionTier::Two, 0).unwrap();

        let mut rng = Pcg32::seed_from_u64(9);
        let fast = pull(&mut state, &catalog, PullSize::Single, &mut rng, 1_000).unwrap();
        assert_eq!(fast.reveal_delay, Duration::from_millis(800));
        let slow = pull(&mut state, &catalog, PullSize::Single, &mut rng, 60_000).unwrap();
        assert_eq!(slow.reveal_delay, Duration::from_millis(2_000));
    }
}
