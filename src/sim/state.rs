//! Game state and core simulation types
//!
//! Everything that survives a save/reload is a plain serialized field here.
//! Per-tick entities (enemies, projectiles) and phase timers are
//! `#[serde(skip)]` and come back empty/idle on load.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{Difficulty, PotionKind, PotionTier};
use super::path::GridPos;
use crate::consts::*;
use crate::settings::Preferences;

pub type EntityId = u32;

/// Top-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No difficulty chosen yet
    #[default]
    AwaitingDifficulty,
    /// Between waves, waiting for the player to start the next one
    Idle,
    /// Countdown before the wave spawns; towers may still be placed
    Prep,
    /// Enemies on the path, resolver running
    WaveActive,
    /// Final wave cleared
    Victory,
    /// Health reached zero
    Defeat,
}

impl Phase {
    /// Run over: no more logic ticks until a restart
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Defeat)
    }
}

/// Enemy class tag (visual/reward weighting; only `Boss` changes behavior)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyClass {
    Human,
    Zombie,
    Nightmare,
    Boss,
}

impl EnemyClass {
    /// Health removed from the base when this enemy gets through
    pub fn base_damage(&self) -> u32 {
        match self {
            EnemyClass::Boss => BOSS_BASE_DAMAGE,
            _ => ENEMY_BASE_DAMAGE,
        }
    }
}

/// Where an enemy is in its life on the path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Still walking up to the first waypoint (negative fraction); untargetable
    NotYetVisible,
    /// On the visible path
    Active,
    /// Killed or reached the base; dropped at the end of the tick
    Removed,
}

/// Position along the path: segment index + fraction along that segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPos {
    pub segment: usize,
    pub fraction: f32,
}

/// An enemy entity
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: EntityId,
    pub class: EnemyClass,
    pub max_hp: u32,
    /// May dip below zero between the firing and death steps of a tick
    pub hp: i64,
    /// Effective speed this tick (post-slow)
    pub speed: f32,
    pub base_speed: f32,
    pub pos: PathPos,
    /// Ticks of slow remaining (0 = unaffected)
    pub slow_ticks: u32,
    pub lifecycle: Lifecycle,
}

impl Enemy {
    #[inline]
    pub fn is_boss(&self) -> bool {
        self.class == EnemyClass::Boss
    }

    #[inline]
    pub fn is_targetable(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }
}

/// A placed tower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    pub id: EntityId,
    pub unit_id: String,
    pub pos: GridPos,
    pub level: u32,
    /// Tick of the last shot; reset on load
    #[serde(skip)]
    pub last_fired: u64,
}

/// Cosmetic shot trail; damage is applied when the tower fires
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub start: Vec2,
    pub end: Vec2,
    pub start_tick: u64,
    pub lifetime: u64,
    pub color: &'static str,
}

impl Projectile {
    pub fn is_expired(&self, tick: u64) -> bool {
        tick.saturating_sub(self.start_tick) >= self.lifetime
    }
}

/// A running potion buff; expiry is wall-clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PotionKind,
    pub tier: PotionTier,
    pub multiplier: f64,
    /// Unix time in milliseconds
    pub expires_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotionCount {
    pub kind: PotionKind,
    pub tier: PotionTier,
    pub count: u32,
}

/// Potions owned, per kind and tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotionStock {
    entries: Vec<PotionCount>,
}

impl PotionStock {
    pub fn count(&self, kind: PotionKind, tier: PotionTier) -> u32 {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.tier == tier)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    pub fn add(&mut self, kind: PotionKind, tier: PotionTier) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.kind == kind && e.tier == tier)
        {
            Some(entry) => entry.count += 1,
            None => self.entries.push(PotionCount {
                kind,
                tier,
                count: 1,
            }),
        }
    }

    /// Remove one potion; false if none were left
    pub fn take(&mut self, kind: PotionKind, tier: PotionTier) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| e.kind == kind && e.tier == tier && e.count > 0)
        {
            Some(entry) => {
                entry.count -= 1;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PotionCount> {
        self.entries.iter().filter(|e| e.count > 0)
    }
}

fn starting_inventory() -> BTreeSet<String> {
    BTreeSet::from([STARTER_UNIT.to_string()])
}

fn starting_speeds() -> BTreeSet<u32> {
    BTreeSet::from([1])
}

/// Complete session state (the host owns the only writable copy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Base health, 0 means defeat
    pub health: u32,
    pub coins: u64,
    /// Current wave number (0 before the first wave)
    pub wave: u32,
    /// Chosen once per session
    pub difficulty: Option<Difficulty>,
    /// Owned unit ids
    pub inventory: BTreeSet<String>,
    pub potions: PotionStock,
    pub effects: Vec<ActiveEffect>,
    /// Placed towers (sorted by id for determinism)
    pub towers: Vec<Tower>,
    /// Current speed multiplier
    pub speed: u32,
    pub unlocked_speeds: BTreeSet<u32>,
    pub has_won: bool,
    pub is_game_over: bool,
    pub preferences: Preferences,
    /// Current phase
    #[serde(skip)]
    pub phase: Phase,
    /// Prep countdown (seconds remaining)
    #[serde(skip)]
    pub prep_remaining: u32,
    /// Live enemies (sorted by id for determinism)
    #[serde(skip)]
    pub enemies: Vec<Enemy>,
    #[serde(skip)]
    pub projectiles: Vec<Projectile>,
    /// Logic tick counter, restarts at 0 on load and restart
    #[serde(skip)]
    pub tick: u64,
    /// Next entity ID
    next_id: EntityId,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// A fresh session awaiting a difficulty choice
    pub fn new() -> Self {
        Self {
            health: STARTING_HEALTH,
            coins: STARTING_COINS,
            wave: 0,
            difficulty: None,
            inventory: starting_inventory(),
            potions: PotionStock::default(),
            effects: Vec::new(),
            towers: Vec::new(),
            speed: 1,
            unlocked_speeds: starting_speeds(),
            has_won: false,
            is_game_over: false,
            preferences: Preferences::default(),
            phase: Phase::AwaitingDifficulty,
            prep_remaining: 0,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            tick: 0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn is_wave_active(&self) -> bool {
        self.phase == Phase::WaveActive
    }

    #[inline]
    pub fn is_prep_phase(&self) -> bool {
        self.phase == Phase::Prep
    }

    /// Multiplier of the running effect of `kind`, 1.0 if none
    pub fn effect_multiplier(&self, kind: PotionKind) -> f64 {
        self.effects
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.multiplier)
            .unwrap_or(1.0)
    }

    /// Like [`Self::effect_multiplier`], ignoring effects expired at `now_ms`
    /// that the sweep has not pruned yet
    pub fn effect_multiplier_at(&self, kind: PotionKind, now_ms: u64) -> f64 {
        self.effects
            .iter()
            .find(|e| e.kind == kind && e.expires_at_ms > now_ms)
            .map(|e| e.multiplier)
            .unwrap_or(1.0)
    }

    pub fn tower(&self, id: EntityId) -> Option<&Tower> {
        self.towers.iter().find(|t| t.id == id)
    }

    pub fn tower_at(&self, pos: GridPos) -> Option<&Tower> {
        self.towers.iter().find(|t| t.pos == pos)
    }

    /// Drop all transient state and derive the resting phase from the
    /// persisted flags. Used after load and by restarts.
    pub fn reset_transient(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.prep_remaining = 0;
        self.tick = 0;
        for tower in &mut self.towers {
            tower.last_fired = 0;
        }
        let max_tower_id = self.towers.iter().map(|t| t.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_tower_id + 1);
        self.phase = self.resting_phase();
    }

    /// Phase implied by the persisted flags when nothing is in flight
    pub fn resting_phase(&self) -> Phase {
        if self.is_game_over {
            Phase::Defeat
        } else if self.has_won {
            Phase::Victory
        } else if self.difficulty.is_none() {
            Phase::AwaitingDifficulty
        } else {
            Phase::Idle
        }
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.towers.sort_by_key(|t| t.id);
    }
}
