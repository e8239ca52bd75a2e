//! Frame-to-tick scheduling
//!
//! Animation frames arrive at whatever rate the host manages; logic ticks are
//! fixed-duration. Each frame turns the elapsed time into a whole number of
//! ticks, carries the remainder forward, and caps the batch size:
//! - at most `MAX_TICKS_PER_FRAME` ticks per frame
//! - a backlog over `OVERLOAD_TICKS` (tab suspended, debugger pause) is dropped
//!   and the reference clock jumps to now
//!
//! Times are `Duration`s since an arbitrary host epoch, so tick arithmetic is
//! exact integer nanoseconds.

use std::time::Duration;

use super::catalog::Catalog;
use super::combat::{BatchOutcome, run_batch};
use super::path::Path;
use super::state::GameState;
use crate::consts::*;

/// Ticks to run for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramePlan {
    pub ticks: u32,
    /// Ticks that were due but dropped by the overload policy
    pub discarded: u64,
}

/// Fixed logic tick length at `speed`x
pub fn tick_interval(speed: u32) -> Duration {
    Duration::from_micros(TICK_INTERVAL_MICROS) / speed.max(1)
}

/// Tracks the last processed instant across frames
#[derive(Debug, Clone, Default)]
pub struct TickScheduler {
    reference: Option<Duration>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self { reference: None }
    }

    /// Last instant consumed by ticks, `None` before the first frame
    pub fn reference(&self) -> Option<Duration> {
        self.reference
    }

    /// Forget the reference clock; the next frame starts a fresh timeline
    pub fn reset(&mut self) {
        self.reference = None;
    }

    /// Work out how many ticks the frame at `now` owes, advancing the clock
    pub fn plan(&mut self, now: Duration, speed: u32) -> FramePlan {
        let Some(reference) = self.reference else {
            self.reference = Some(now);
            return FramePlan::default();
        };

        let interval = tick_interval(speed);
        let elapsed = now.saturating_sub(reference);
        let due = (elapsed.as_nanos() / interval.as_nanos()) as u64;
        if due == 0 {
            return FramePlan::default();
        }

        if due > OVERLOAD_TICKS {
            // Too far behind to catch up; the skipped time is lost
            self.reference = Some(now);
            let discarded = due - MAX_TICKS_PER_FRAME as u64;
            log::warn!("Tick backlog of {} discarded ({} ticks run)", discarded, MAX_TICKS_PER_FRAME);
            return FramePlan {
                ticks: MAX_TICKS_PER_FRAME,
                discarded,
            };
        }

        self.reference = Some(reference + interval * due as u32);
        let ticks = (due as u32).min(MAX_TICKS_PER_FRAME);
        FramePlan {
            ticks,
            discarded: due - ticks as u64,
        }
    }

    /// Plan the frame at `now` and run its ticks against `state`.
    ///
    /// The clock advances every frame; ticks only run while the session has a
    /// live wave or projectiles, so an idle session never builds a backlog.
    pub fn run_frame(
        &mut self,
        now: Duration,
        state: &mut GameState,
        catalog: &Catalog,
        path: &Path,
    ) -> BatchOutcome {
        let plan = self.plan(now, state.speed);
        if plan.ticks == 0 {
            return BatchOutcome::default();
        }
        run_batch(state, catalog, path, plan.ticks)
    }
}
