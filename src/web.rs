//! Browser bindings
//!
//! A page drives the session from `requestAnimationFrame` by calling
//! `frame(performance.now())` and wires its buttons to the action methods.
//! Rejected actions return `false`; the reason is logged at debug level.

use std::time::Duration;

use wasm_bindgen::prelude::*;

use crate::gacha::PullSize;
use crate::host::GameHost;
use crate::persistence;
use crate::platform::{self, LocalStorage, SystemClock};
use crate::sim::{Difficulty, GridPos, PotionKind, PotionTier};

#[wasm_bindgen]
pub struct WebSession {
    host: GameHost<SystemClock>,
}

#[wasm_bindgen]
impl WebSession {
    /// Restore the saved session from LocalStorage
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebSession {
        platform::init_logging();
        log::info!("Night Shift TD starting...");
        WebSession {
            host: GameHost::with_storage(SystemClock, Box::new(LocalStorage)),
        }
    }

    /// Advance one animation frame; `timestamp_ms` is the rAF timestamp
    pub fn frame(&mut self, timestamp_ms: f64) -> u32 {
        let now = Duration::from_secs_f64(timestamp_ms.max(0.0) / 1000.0);
        self.host.frame(now).batch.ticks_run
    }

    /// 0 = Easy .. 4 = Boss Rush
    pub fn select_difficulty(&mut self, index: usize) -> bool {
        Difficulty::ALL
            .get(index)
            .is_some_and(|d| self.host.select_difficulty(*d).is_ok())
    }

    pub fn start_wave(&mut self) -> bool {
        self.host.start_wave().is_ok()
    }

    pub fn skip_prep(&mut self) -> bool {
        self.host.skip_prep().is_ok()
    }

    pub fn place_tower(&mut self, unit_id: &str, x: i32, y: i32) -> bool {
        self.host.place_tower(unit_id, GridPos::new(x, y)).is_ok()
    }

    pub fn upgrade_tower(&mut self, tower_id: u32) -> bool {
        self.host.upgrade_tower(tower_id).is_ok()
    }

    pub fn sell_tower(&mut self, tower_id: u32) -> bool {
        self.host.sell_tower(tower_id).is_ok()
    }

    pub fn sell_unit(&mut self, unit_id: &str) -> bool {
        self.host.sell_unit(unit_id).is_ok()
    }

    /// Roll 1-3 units; returns the rolled ids
    pub fn pull(&mut self, count: u32) -> Vec<String> {
        let size = match count {
            1 => PullSize::Single,
            2 => PullSize::Double,
            _ => PullSize::Triple,
        };
        self.host
            .pull(size)
            .map(|r| r.units.iter().map(|id| id.to_string()).collect())
            .unwrap_or_default()
    }

    /// kind: 0 = Luck, 1 = Money, 2 = Speed; tier 1-3
    pub fn buy_potion(&mut self, kind: usize, tier: u8) -> bool {
        match potion(kind, tier) {
            Some((kind, tier)) => self.host.buy_potion(kind, tier).is_ok(),
            None => false,
        }
    }

    pub fn use_potion(&mut self, kind: usize, tier: u8) -> bool {
        match potion(kind, tier) {
            Some((kind, tier)) => self.host.use_potion(kind, tier).is_ok(),
            None => false,
        }
    }

    pub fn buy_speed(&mut self, multiplier: u32) -> bool {
        self.host.buy_speed(multiplier).is_ok()
    }

    pub fn select_speed(&mut self, multiplier: u32) -> bool {
        self.host.select_speed(multiplier).is_ok()
    }

    pub fn set_auto_skip_prep(&mut self, enabled: bool) {
        self.host.set_auto_skip_prep(enabled);
    }

    pub fn give_up(&mut self) {
        self.host.give_up();
    }

    pub fn continue_after_victory(&mut self) -> bool {
        self.host.continue_after_victory().is_ok()
    }

    /// Terminal code ("freddy", "reset", "save"); false if unrecognised
    pub fn admin_command(&mut self, code: &str) -> bool {
        self.host.run_admin_command(code).is_some()
    }

    pub fn restart_shift(&mut self) {
        self.host.restart_shift();
    }

    pub fn reset_session(&mut self) {
        self.host.reset_session();
    }

    pub fn health(&self) -> u32 {
        self.host.state().health
    }

    pub fn coins(&self) -> f64 {
        self.host.state().coins as f64
    }

    pub fn wave(&self) -> u32 {
        self.host.state().wave
    }

    pub fn enemy_count(&self) -> usize {
        self.host.state().enemies.len()
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.host.state().phase)
    }

    /// Persisted snapshot as JSON
    pub fn snapshot(&self) -> String {
        persistence::to_json(self.host.state()).unwrap_or_default()
    }

    /// Stop timers and write a final save (page unload)
    pub fn shutdown(&mut self) {
        self.host.shutdown();
    }
}

fn potion(kind: usize, tier: u8) -> Option<(PotionKind, PotionTier)> {
    Some((*PotionKind::ALL.get(kind)?, PotionTier::from_level(tier)?))
}
