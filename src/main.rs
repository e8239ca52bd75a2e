//! Night Shift TD entry point
//!
//! Native builds run a headless demo session on a simulated clock; the
//! browser entry point lives in the library (`web::WebSession`).

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::Duration;

    use night_shift_td::GameHost;
    use night_shift_td::gacha::PullSize;
    use night_shift_td::platform::{self, FileStorage, ManualClock};
    use night_shift_td::sim::{Difficulty, GridPos, Phase, WaveStart};

    /// ~60 Hz animation frames
    const FRAME: Duration = Duration::from_millis(16);
    /// Safety cap on simulated frames (~2 hours of play)
    const MAX_FRAMES: u64 = 450_000;

    /// Cells beside the standard path, in build order
    const BUILD_SITES: [GridPos; 8] = [
        GridPos::new(2, 4),
        GridPos::new(4, 3),
        GridPos::new(7, 3),
        GridPos::new(7, 7),
        GridPos::new(4, 7),
        GridPos::new(6, 9),
        GridPos::new(9, 1),
        GridPos::new(6, 10),
    ];

    pub fn run() {
        platform::init_logging();
        log::info!("Night Shift TD (headless) starting...");

        let save_dir = std::env::var_os("NIGHT_SHIFT_SAVE_DIR")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("night-shift-td"));
        let clock = ManualClock::new(Duration::from_secs(1_700_000_000));
        let mut host = GameHost::with_storage(clock, Box::new(FileStorage::new(save_dir)));

        if matches!(host.state().phase, Phase::Defeat | Phase::Victory) {
            log::info!("Previous run finished; starting a new one");
            host.reset_session();
        }
        if host.state().difficulty.is_none() {
            let _ = host.select_difficulty(Difficulty::Easy);
        }
        host.set_auto_skip_prep(true);

        for frame in 0..MAX_FRAMES {
            host.clock().advance(FRAME);
            let report = host.frame_now();
            if report.batch.defeated {
                log::info!("Defeated on wave {}", host.state().wave);
                break;
            }

            if host.state().phase != Phase::Idle {
                continue;
            }
            spend(&mut host);
            match host.start_wave() {
                Ok(WaveStart::Victory) => {
                    log::info!("Victory after {} frames", frame);
                    break;
                }
                Ok(_) => log::info!(
                    "Wave {} | health {} | coins {} | towers {}",
                    host.state().wave,
                    host.state().health,
                    host.state().coins,
                    host.state().towers.len()
                ),
                Err(e) => {
                    log::warn!("Could not start wave: {}", e);
                    break;
                }
            }
        }

        let state = host.state();
        println!(
            "Finished: wave {}, health {}, coins {}, {} units owned",
            state.wave,
            state.health,
            state.coins,
            state.inventory.len()
        );
        host.shutdown();
    }

    /// Between waves: build, upgrade, then gamble the change
    fn spend(host: &mut GameHost<ManualClock>) {
        let unit = strongest_owned(host);
        for site in BUILD_SITES {
            if host.state().tower_at(site).is_none() && host.place_tower(&unit, site).is_err() {
                break;
            }
        }

        let ids: Vec<_> = host.state().towers.iter().map(|t| t.id).collect();
        for id in ids {
            while host.upgrade_tower(id).is_ok() {}
        }

        if host.state().coins >= 1_000 {
            if let Ok(result) = host.pull(PullSize::Triple) {
                log::info!("Pulled {:?}", result.units);
            }
        }
    }

    fn strongest_owned(host: &GameHost<ManualClock>) -> String {
        let catalog = host.catalog();
        host.state()
            .inventory
            .iter()
            .filter_map(|id| catalog.get(id))
            .max_by_key(|u| u.damage * 100 / u.fire_rate.max(1))
            .map(|u| u.id.to_string())
            .unwrap_or_else(|| night_shift_td::consts::STARTER_UNIT.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::WebSession, this is just to satisfy the compiler
}
