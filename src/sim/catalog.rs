//! Static reference data: units, rarities, difficulties, potions, speed tiers
//!
//! Everything here is read-only and shared by the wave generator, the combat
//! resolver and the economy.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Unit rarity, ordered from most to least common
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Secret,
}

impl Rarity {
    pub const ALL: [Rarity; 7] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
        Rarity::Secret,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
            Rarity::Secret => "Secret",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Rarity::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
    }

    /// Damage multiplier applied once per upgrade level
    pub fn upgrade_scaling(&self) -> f64 {
        match self {
            Rarity::Common => 1.2,
            Rarity::Uncommon => 1.3,
            Rarity::Rare => 1.5,
            Rarity::Epic => 1.7,
            Rarity::Legendary => 2.0,
            Rarity::Mythic => 2.5,
            Rarity::Secret => 3.5,
        }
    }

    /// Relative gacha weight per unit of this rarity
    pub fn gacha_weight(&self) -> f64 {
        match self {
            Rarity::Common => 500.0,
            Rarity::Uncommon => 250.0,
            Rarity::Rare => 120.0,
            Rarity::Epic => 70.0,
            Rarity::Legendary => 40.0,
            Rarity::Mythic => 15.0,
            Rarity::Secret => 5.0,
        }
    }

    /// Display tier (0 = Common)
    pub fn tier(&self) -> usize {
        *self as usize
    }

    pub fn color(&self) -> &'static str {
        match self {
            Rarity::Common => "#9e9e9e",
            Rarity::Uncommon => "#4caf50",
            Rarity::Rare => "#2196f3",
            Rarity::Epic => "#9c27b0",
            Rarity::Legendary => "#ff9800",
            Rarity::Mythic => "#f44336",
            Rarity::Secret => "#ffd700",
        }
    }
}

/// Special on-hit behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    /// Halves the target's speed for `SLOW_DURATION_TICKS`
    Slow,
}

/// A placeable unit definition
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDef {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: Rarity,
    pub damage: u32,
    /// Range in path-grid units
    pub range: f32,
    /// Ticks between shots
    pub fire_rate: u32,
    pub cost: u64,
    pub color: &'static str,
    pub ability: Option<Ability>,
}

impl UnitDef {
    /// Damage at `level`: floor(damage * scaling^(level - 1))
    pub fn damage_at(&self, level: u32) -> u32 {
        let scaling = self.rarity.upgrade_scaling();
        (self.damage as f64 * scaling.powi(level.saturating_sub(1) as i32)).floor() as u32
    }

    /// Fire rate at `level`; high-level towers fire a little faster
    pub fn fire_rate_at(&self, level: u32) -> u32 {
        if level >= FIRE_RATE_BONUS_LEVEL {
            self.fire_rate.saturating_sub(FIRE_RATE_BONUS).max(MIN_FIRE_RATE)
        } else {
            self.fire_rate
        }
    }
}

macro_rules! unit {
    ($id:literal, $name:literal, $rarity:ident, $damage:literal, $range:literal, $rate:literal, $cost:literal, $color:literal) => {
        unit!($id, $name, $rarity, $damage, $range, $rate, $cost, $color, None)
    };
    ($id:literal, $name:literal, $rarity:ident, $damage:literal, $range:literal, $rate:literal, $cost:literal, $color:literal, $ability:expr) => {
        UnitDef {
            id: $id,
            name: $name,
            rarity: Rarity::$rarity,
            damage: $damage,
            range: $range,
            fire_rate: $rate,
            cost: $cost,
            color: $color,
            ability: $ability,
        }
    };
}

static STANDARD_UNITS: [UnitDef; 24] = [
    // Common
    unit!("freddy", "Freddy Fazbear", Common, 12, 2.5, 35, 50, "#6d4c41"),
    unit!("bonnie", "Bonnie", Common, 8, 2.0, 20, 45, "#7986cb"),
    unit!("chica", "Chica", Common, 18, 2.2, 45, 60, "#fff176"),
    unit!("foxy", "Foxy", Common, 6, 3.5, 15, 75, "#e57373"),
    unit!("endo_01", "Endo-01", Common, 10, 2.0, 30, 40, "#9e9e9e"),
    // Uncommon
    unit!("toy_freddy", "Toy Freddy", Uncommon, 25, 3.0, 40, 130, "#8d6e63"),
    unit!("toy_bonnie", "Toy Bonnie", Uncommon, 15, 2.5, 20, 120, "#4fc3f7"),
    unit!("mangle", "Mangle", Uncommon, 20, 3.5, 30, 150, "#fce4ec"),
    unit!("balloon_boy", "Balloon Boy", Uncommon, 2, 5.0, 30, 110, "#f44336", Some(Ability::Slow)),
    // Rare
    unit!("withered_freddy", "Withered Freddy", Rare, 55, 3.2, 60, 350, "#5d4037"),
    unit!("puppet", "The Puppet", Rare, 40, 4.5, 35, 400, "#111111"),
    unit!("sparky", "Sparky the Dog", Rare, 70, 2.8, 25, 380, "#5d4037"),
    // Epic
    unit!("springtrap", "Springtrap", Epic, 95, 3.5, 45, 900, "#7cb342"),
    unit!("nightmare_fredbear", "Nightmare Fredbear", Epic, 150, 4.0, 55, 1200, "#fbc02d"),
    unit!("dreadbear", "Dreadbear", Epic, 180, 3.2, 70, 1300, "#2e7d32"),
    // Legendary
    unit!("circus_baby", "Circus Baby", Legendary, 280, 4.5, 50, 2200, "#d32f2f"),
    unit!("molten_freddy", "Molten Freddy", Legendary, 220, 5.0, 30, 2500, "#ef6c00"),
    unit!("grimm_foxy", "Grimm Foxy", Legendary, 190, 6.0, 20, 2800, "#ff3d00"),
    // Mythic
    unit!("glitchtrap", "Glitchtrap", Mythic, 450, 7.0, 40, 5500, "#ffeb3b"),
    unit!("shattered_roxanne", "Shattered Roxanne", Mythic, 500, 5.5, 25, 6500, "#9c27b0"),
    unit!("the_blob", "The Blob", Mythic, 350, 8.0, 35, 8000, "#424242"),
    // Secret
    unit!("golden_freddy", "Golden Freddy", Secret, 1983, 12.0, 120, 10000, "#ffd600"),
    unit!("nightmarionne", "Nightmarionne", Secret, 850, 10.0, 20, 15000, "#0a0a0a", Some(Ability::Slow)),
    unit!("shadow_bonnie", "Shadow Bonnie", Secret, 1200, 6.0, 15, 20000, "#1a1a1a"),
];

/// Read-only registry of unit definitions
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    units: &'static [UnitDef],
}

impl Catalog {
    pub fn standard() -> Self {
        Self {
            units: &STANDARD_UNITS,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'static UnitDef> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Units in table order (stable, used for gacha enumeration)
    pub fn units(&self) -> &'static [UnitDef] {
        self.units
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Per-difficulty multipliers applied to spawned enemies and rewards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyCoefficients {
    pub hp_mult: f64,
    pub speed_mult: f32,
    pub coin_mult: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
    BossRush,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Extreme,
        Difficulty::BossRush,
    ];

    pub fn coefficients(&self) -> DifficultyCoefficients {
        let (hp_mult, speed_mult, coin_mult) = match self {
            Difficulty::Easy => (0.8, 0.8, 1.0),
            Difficulty::Medium => (1.0, 1.0, 1.5),
            Difficulty::Hard => (1.5, 1.2, 2.5),
            Difficulty::Extreme => (2.5, 1.4, 4.0),
            Difficulty::BossRush => (5.0, 0.6, 6.0),
        };
        DifficultyCoefficients {
            hp_mult,
            speed_mult,
            coin_mult,
        }
    }

    /// Every enemy is a boss
    pub fn is_boss_rush(&self) -> bool {
        *self == Difficulty::BossRush
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Extreme => "Extreme",
            Difficulty::BossRush => "Boss Rush",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotionKind {
    /// Boosts non-Common gacha weights
    Luck,
    /// Multiplies kill rewards
    Money,
    /// Shortens the gacha reveal delay
    Speed,
}

impl PotionKind {
    pub const ALL: [PotionKind; 3] = [PotionKind::Luck, PotionKind::Money, PotionKind::Speed];

    pub fn base_cost(&self) -> u64 {
        match self {
            PotionKind::Luck => 250,
            PotionKind::Money => 350,
            PotionKind::Speed => 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PotionTier {
    One,
    Two,
    Three,
}

impl PotionTier {
    pub const ALL: [PotionTier; 3] = [PotionTier::One, PotionTier::Two, PotionTier::Three];

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(PotionTier::One),
            2 => Some(PotionTier::Two),
            3 => Some(PotionTier::Three),
            _ => None,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            PotionTier::One => 1,
            PotionTier::Two => 2,
            PotionTier::Three => 3,
        }
    }
}

/// Effect granted by drinking a potion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotionEffect {
    pub multiplier: f64,
    pub duration_ms: u64,
}

/// Effect table lookup (total over the fixed kind x tier table)
pub fn potion_effect(kind: PotionKind, tier: PotionTier) -> PotionEffect {
    let (multiplier, duration_ms) = match (kind, tier) {
        (PotionKind::Luck, PotionTier::One) => (1.2, 30_000),
        (PotionKind::Luck, PotionTier::Two) => (1.5, 60_000),
        (PotionKind::Luck, PotionTier::Three) => (2.5, 120_000),
        (PotionKind::Money, PotionTier::One) => (1.5, 60_000),
        (PotionKind::Money, PotionTier::Two) => (2.0, 120_000),
        (PotionKind::Money, PotionTier::Three) => (4.0, 240_000),
        (PotionKind::Speed, PotionTier::One) => (0.7, 30_000),
        (PotionKind::Speed, PotionTier::Two) => (0.4, 60_000),
        (PotionKind::Speed, PotionTier::Three) => (0.1, 120_000),
    };
    PotionEffect {
        multiplier,
        duration_ms,
    }
}

/// Purchase price of a potion: floor(base * 2.5^(tier - 1))
pub fn potion_cost(kind: PotionKind, tier: PotionTier) -> u64 {
    let growth = POTION_TIER_GROWTH.powi(tier.level() as i32 - 1);
    (kind.base_cost() as f64 * growth).floor() as u64
}

/// Speed multipliers that can be unlocked, with their price
pub const SPEED_TIERS: [(u32, u64); 3] = [(1, 0), (2, 300), (3, 500)];

/// Unlock price of a speed multiplier, `None` if no such tier exists
pub fn speed_cost(multiplier: u32) -> Option<u64> {
    SPEED_TIERS
        .iter()
        .find(|(speed, _)| *speed == multiplier)
        .map(|(_, cost)| *cost)
}
