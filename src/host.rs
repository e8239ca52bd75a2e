//! Frame-driven session host
//!
//! `GameHost` owns the one writable `GameState`. Player actions and frames
//! are the only ways in, and both run to completion before returning, so a
//! tick batch never interleaves with an action. Each frame:
//! 1. effect sweep (1 s trigger): prune expired potion effects
//! 2. prep countdown (1 s trigger, only during prep): count down, then spawn
//! 3. tick batch from the scheduler
//! 4. autosave if any persisted field changed

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::gacha::{self, PullResult, PullSize};
use crate::consts::ADMIN_COIN_GRANT;
use crate::persistence::{self, PersistenceError};
use crate::platform::{Clock, Periodic, Storage, SystemClock};
use crate::sim::{
    self, ActionError, ActiveEffect, AdminCommand, BatchOutcome, Catalog, Difficulty, EntityId, GameState,
    GridPos, Path, Phase, PotionKind, PotionTier, PrepProgress, PullOutcome, Rarity,
    TickScheduler, WaveStart,
};

const SECOND: Duration = Duration::from_secs(1);

/// What one frame did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub batch: BatchOutcome,
    /// Last prep countdown step taken this frame
    pub prep: Option<PrepProgress>,
    /// Potion effects pruned by the sweep
    pub effects_expired: usize,
}

pub struct GameHost<C: Clock = SystemClock> {
    state: GameState,
    catalog: Catalog,
    path: Path,
    scheduler: TickScheduler,
    prep_timer: Periodic,
    effect_sweep: Periodic,
    clock: C,
    storage: Option<Box<dyn Storage>>,
    last_saved: Option<String>,
    rng: Pcg32,
    shut_down: bool,
}

impl<C: Clock> GameHost<C> {
    /// Fresh session with no persistence
    pub fn new(clock: C) -> Self {
        let seed = clock.now().as_nanos() as u64;
        Self {
            state: GameState::new(),
            catalog: Catalog::standard(),
            path: Path::standard(),
            scheduler: TickScheduler::new(),
            prep_timer: Periodic::new(SECOND),
            effect_sweep: Periodic::new(SECOND),
            clock,
            storage: None,
            last_saved: None,
            rng: Pcg32::seed_from_u64(seed),
            shut_down: false,
        }
    }

    /// Session restored from `storage` (or fresh), autosaving back to it
    pub fn with_storage(clock: C, storage: Box<dyn Storage>) -> Self {
        let mut host = Self::new(clock);
        host.state = persistence::load(storage.as_ref());
        host.last_saved = persistence::to_json(&host.state).ok();
        host.storage = Some(storage);
        host
    }

    /// Reseed the gacha RNG
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Prep countdown trigger is armed
    pub fn is_prep_timer_active(&self) -> bool {
        self.prep_timer.is_active()
    }

    /// Run one frame at the clock's current time
    pub fn frame_now(&mut self) -> FrameReport {
        let now = self.clock.now();
        self.frame(now)
    }

    /// Run one frame at `now`
    pub fn frame(&mut self, now: Duration) -> FrameReport {
        let mut report = FrameReport::default();
        if self.shut_down {
            return report;
        }

        if !self.effect_sweep.is_active() {
            self.effect_sweep.start(now);
        }
        if self.effect_sweep.poll(now) > 0 {
            report.effects_expired = sim::prune_effects(&mut self.state, self.clock.now_ms());
        }

        self.sync_prep_timer(now);
        for _ in 0..self.prep_timer.poll(now) {
            match sim::prep_second(&mut self.state) {
                Ok(progress) => {
                    report.prep = Some(progress);
                    if matches!(progress, PrepProgress::Spawned { .. }) {
                        self.prep_timer.cancel();
                        break;
                    }
                }
                Err(_) => {
                    self.prep_timer.cancel();
                    break;
                }
            }
        }

        report.batch = self
            .scheduler
            .run_frame(now, &mut self.state, &self.catalog, &self.path);

        self.autosave();
        report
    }

    /// Stop both triggers and write a final save. Later frames do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.prep_timer.cancel();
        self.effect_sweep.cancel();
        self.autosave();
        self.shut_down = true;
        log::info!("Session host shut down");
    }

    /// Frame timestamps may come from a different timeline than the clock
    /// (rAF time vs Unix time), so the countdown is only armed here
    fn sync_prep_timer(&mut self, now: Duration) {
        if self.state.phase == Phase::Prep {
            if !self.prep_timer.is_active() {
                self.prep_timer.start(now);
            }
        } else if self.prep_timer.is_active() {
            self.prep_timer.cancel();
        }
    }

    fn autosave(&mut self) {
        let Some(storage) = self.storage.as_deref() else {
            return;
        };
        let json = match persistence::to_json(&self.state) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Autosave skipped: {}", e);
                return;
            }
        };
        if self.last_saved.as_deref() == Some(json.as_str()) {
            return;
        }
        match storage.set(persistence::SAVE_KEY, &json) {
            Ok(()) => self.last_saved = Some(json),
            Err(e) => log::warn!("Autosave failed: {}", e),
        }
    }

    /// Run a validate-then-commit action, then drop a stale countdown and save
    fn act<T>(
        &mut self,
        name: &str,
        action: impl FnOnce(&mut GameState, &Catalog, &Path) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        if self.shut_down {
            return Err(ActionError::WrongPhase);
        }
        let result = action(&mut self.state, &self.catalog, &self.path);
        match &result {
            Ok(_) => self.commit(),
            Err(e) => log::debug!("{} rejected: {}", name, e),
        }
        result
    }

    /// Same as `act` for actions that cannot be rejected
    fn act_infallible(&mut self, name: &str, action: impl FnOnce(&mut GameState)) {
        if self.shut_down {
            log::debug!("{} ignored after shutdown", name);
            return;
        }
        action(&mut self.state);
        self.commit();
    }

    fn commit(&mut self) {
        if self.state.phase != Phase::Prep {
            self.prep_timer.cancel();
        }
        self.autosave();
    }

    // --- Player actions ---

    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), ActionError> {
        self.act("select_difficulty", |s, _, _| sim::select_difficulty(s, difficulty))
    }

    pub fn start_wave(&mut self) -> Result<WaveStart, ActionError> {
        self.act("start_wave", |s, _, _| sim::start_wave(s))
    }

    pub fn skip_prep(&mut self) -> Result<usize, ActionError> {
        self.act("skip_prep", |s, _, _| sim::skip_prep(s))
    }

    pub fn place_tower(&mut self, unit_id: &str, pos: GridPos) -> Result<EntityId, ActionError> {
        self.act("place_tower", |s, c, p| sim::place_tower(s, c, p, unit_id, pos))
    }

    pub fn upgrade_tower(&mut self, tower_id: EntityId) -> Result<u64, ActionError> {
        self.act("upgrade_tower", |s, c, _| sim::upgrade_tower(s, c, tower_id))
    }

    pub fn sell_tower(&mut self, tower_id: EntityId) -> Result<u64, ActionError> {
        self.act("sell_tower", |s, c, _| sim::sell_tower(s, c, tower_id))
    }

    pub fn sell_unit(&mut self, unit_id: &str) -> Result<u64, ActionError> {
        self.act("sell_unit", |s, c, _| sim::sell_unit(s, c, unit_id))
    }

    /// Apply unit ids rolled elsewhere
    pub fn resolve_pull(&mut self, unit_ids: &[&str]) -> Result<PullOutcome, ActionError> {
        self.act("resolve_pull", |s, c, _| Ok(sim::resolve_pull(s, c, unit_ids)))
    }

    /// Pay for a pull and roll it with the host RNG
    pub fn pull(&mut self, size: PullSize) -> Result<PullResult, ActionError> {
        let now_ms = self.clock.now_ms();
        let mut rng = self.rng.clone();
        let result = self.act("pull", |s, c, _| gacha::pull(s, c, size, &mut rng, now_ms));
        self.rng = rng;
        result
    }

    pub fn buy_potion(&mut self, kind: PotionKind, tier: PotionTier) -> Result<u64, ActionError> {
        self.act("buy_potion", |s, _, _| sim::buy_potion(s, kind, tier))
    }

    pub fn use_potion(&mut self, kind: PotionKind, tier: PotionTier) -> Result<ActiveEffect, ActionError> {
        let now_ms = self.clock.now_ms();
        self.act("use_potion", |s, _, _| sim::use_potion(s, kind, tier, now_ms))
    }

    pub fn buy_speed(&mut self, multiplier: u32) -> Result<u64, ActionError> {
        self.act("buy_speed", |s, _, _| sim::buy_speed(s, multiplier))
    }

    pub fn select_speed(&mut self, multiplier: u32) -> Result<(), ActionError> {
        self.act("select_speed", |s, _, _| sim::select_speed(s, multiplier))
    }

    pub fn toggle_auto_sell(&mut self, rarity: Rarity) -> bool {
        self.act("toggle_auto_sell", |s, _, _| Ok(sim::toggle_auto_sell(s, rarity)))
            .unwrap_or(false)
    }

    pub fn set_auto_skip_prep(&mut self, enabled: bool) {
        self.act_infallible("set_auto_skip_prep", |s| sim::set_auto_skip_prep(s, enabled));
    }

    pub fn give_up(&mut self) {
        self.act_infallible("give_up", sim::give_up);
    }

    pub fn continue_after_victory(&mut self) -> Result<(), ActionError> {
        self.act("continue_after_victory", |s, _, _| sim::continue_after_victory(s))
    }

    /// Restart the night; the tick clock starts over with it
    pub fn restart_shift(&mut self) {
        self.act_infallible("restart_shift", sim::restart_shift);
        self.scheduler.reset();
    }

    /// Wipe the session and its save
    pub fn reset_session(&mut self) {
        if let Some(storage) = self.storage.as_deref() {
            if let Err(e) = persistence::clear(storage) {
                log::warn!("Could not clear save: {}", e);
            }
        }
        self.last_saved = None;
        self.scheduler.reset();
        self.act_infallible("reset_session", sim::reset_session);
    }
}

impl<C: Clock> GameHost<C> {
    // --- Terminal overrides ---

    pub fn admin_grant_coins(&mut self, amount: u64) -> u64 {
        self.act_infallible("admin_grant_coins", |s| {
            sim::admin_grant_coins(s, amount);
        });
        self.state.coins
    }

    /// Write the save now, even if nothing changed since the last one
    pub fn save_now(&mut self) -> Result<(), PersistenceError> {
        let Some(storage) = self.storage.as_deref() else {
            return Err(PersistenceError::Storage("no storage attached".to_string()));
        };
        persistence::save(storage, &self.state)?;
        self.last_saved = persistence::to_json(&self.state).ok();
        log::info!("Manual save written");
        Ok(())
    }

    /// Run a terminal code; returns the command it matched
    pub fn run_admin_command(&mut self, code: &str) -> Option<AdminCommand> {
        let command = AdminCommand::parse(code)?;
        match command {
            AdminCommand::GrantCoins => {
                self.admin_grant_coins(ADMIN_COIN_GRANT);
            }
            AdminCommand::Reset => self.reset_session(),
            AdminCommand::Save => {
                if let Err(e) = self.save_now() {
                    log::warn!("Manual save failed: {}", e);
                }
            }
        }
        Some(command)
    }
}

impl<C: Clock> Drop for GameHost<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
