//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging setup
//! - Wall-clock time and 1 s periodic triggers
//! - Storage (LocalStorage on web, files on native)

pub mod storage;
pub mod time;

pub use storage::{MemoryStorage, Storage, StorageError};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use time::{Clock, ManualClock, Periodic, SystemClock};

/// Install the logger for this platform. Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Install the logger for this platform. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
