//! Time sources and periodic triggers
//!
//! Simulation code never reads the clock itself; the host reads a [`Clock`]
//! once per frame and passes the instant down.

use std::cell::Cell;
use std::time::Duration;

/// Source of wall-clock time (since the Unix epoch)
pub trait Clock {
    fn now(&self) -> Duration;

    /// Unix time in milliseconds
    fn now_ms(&self) -> u64 {
        self.now().as_millis() as u64
    }
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now(&self) -> Duration {
        Duration::from_secs_f64(js_sys::Date::now().max(0.0) / 1000.0)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now(&self) -> Duration {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new(start: Duration) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Cancelable fixed-period trigger, polled once per frame
#[derive(Debug, Clone)]
pub struct Periodic {
    period: Duration,
    next_due: Option<Duration>,
}

impl Periodic {
    /// A stopped trigger
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    /// Arm the trigger; the first firing is one period after `now`
    pub fn start(&mut self, now: Duration) {
        self.next_due = Some(now + self.period);
    }

    /// Stop firing. Polls after this return 0 until restarted.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Number of periods that elapsed since the last poll
    pub fn poll(&mut self, now: Duration) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };
        let mut fired = 0;
        while due <= now {
            fired += 1;
            due += self.period;
        }
        self.next_due = Some(due);
        fired
    }
}
