//! Save/load of the session snapshot
//!
//! The snapshot is the serde form of [`GameState`] wrapped in a versioned
//! envelope. Transient fields are skipped on save and rebuilt on load, so a
//! reload always lands in a resting phase with nothing in flight.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::{Storage, StorageError};
use crate::sim::GameState;

/// Storage key of the session snapshot
pub const SAVE_KEY: &str = "night_shift_td_save";

/// Current envelope version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug)]
pub enum PersistenceError {
    /// Backend failed to read or write
    Storage(String),
    /// Snapshot text is not a valid save
    Json(serde_json::Error),
    /// Snapshot was written by an incompatible version
    Version { found: u32, expected: u32 },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Storage(msg) => write!(f, "storage error: {}", msg),
            PersistenceError::Json(e) => write!(f, "malformed save: {}", e),
            PersistenceError::Version { found, expected } => {
                write!(f, "save version {} (expected {})", found, expected)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Json(e)
    }
}

impl From<StorageError> for PersistenceError {
    fn from(e: StorageError) -> Self {
        PersistenceError::Storage(e.to_string())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a GameState,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    state: GameState,
}

/// Serialize the persisted part of `state`
pub fn to_json(state: &GameState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&EnvelopeRef {
        version: SAVE_VERSION,
        state,
    })?)
}

/// Parse a snapshot, rebuilding transient state
pub fn decode(text: &str) -> Result<GameState, PersistenceError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    if envelope.version != SAVE_VERSION {
        return Err(PersistenceError::Version {
            found: envelope.version,
            expected: SAVE_VERSION,
        });
    }
    let mut state = envelope.state;
    state.reset_transient();
    state.normalize_order();
    Ok(state)
}

/// Parse a snapshot, falling back to a new session if it is unusable
pub fn from_json(text: &str) -> GameState {
    match decode(text) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Discarding saved session: {}", e);
            GameState::new()
        }
    }
}

/// Write the snapshot under [`SAVE_KEY`]
pub fn save(storage: &dyn Storage, state: &GameState) -> Result<(), PersistenceError> {
    let json = to_json(state)?;
    storage.set(SAVE_KEY, &json)?;
    log::debug!("Session saved ({} bytes)", json.len());
    Ok(())
}

/// Load the saved session, or a new one if nothing usable is stored
pub fn load(storage: &dyn Storage) -> GameState {
    match storage.get(SAVE_KEY) {
        Ok(Some(text)) => {
            let state = from_json(&text);
            log::info!("Loaded session at wave {}", state.wave);
            state
        }
        Ok(None) => GameState::new(),
        Err(e) => {
            log::warn!("Could not read saved session: {}", e);
            GameState::new()
        }
    }
}

/// Delete the saved session
pub fn clear(storage: &dyn Storage) -> Result<(), PersistenceError> {
    storage.remove(SAVE_KEY)?;
    log::info!("Saved session cleared");
    Ok(())
}
