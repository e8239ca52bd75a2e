//! Session phase transitions
//!
//! ```text
//! AwaitingDifficulty -> Idle -> Prep -> WaveActive -> Idle -> ... -> Victory
//!                                           \-> Defeat (health hits 0)
//! ```
//!
//! `WaveActive -> Idle` and `-> Defeat` happen inside the combat tick; the
//! rest are driven from here by player actions and the 1 s prep countdown.

use super::catalog::Difficulty;
use super::economy::ActionError;
use super::state::{GameState, Phase};
use super::wave::{generate_wave, wave_title};
use crate::consts::*;

/// Result of asking for the next wave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveStart {
    /// Countdown running for `wave`
    Prep { wave: u32 },
    /// Auto-skip was on; `wave` spawned immediately
    Spawned { wave: u32, enemies: usize },
    /// The final wave was already cleared
    Victory,
}

/// Result of one prep countdown second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepProgress {
    Counting { remaining: u32 },
    Spawned { wave: u32, enemies: usize },
}

/// Choose the difficulty (once per session)
pub fn select_difficulty(state: &mut GameState, difficulty: Difficulty) -> Result<(), ActionError> {
    if state.difficulty.is_some() {
        return Err(ActionError::DifficultyAlreadyChosen);
    }
    state.difficulty = Some(difficulty);
    state.phase = Phase::Idle;
    log::info!("Difficulty set to {}", difficulty.as_str());
    Ok(())
}

/// Advance the wave counter and enter prep, or declare victory past the
/// final wave
pub fn start_wave(state: &mut GameState) -> Result<WaveStart, ActionError> {
    if state.difficulty.is_none() {
        return Err(ActionError::DifficultyNotChosen);
    }
    if state.is_game_over || !matches!(state.phase, Phase::Idle | Phase::Victory) {
        return Err(ActionError::WrongPhase);
    }

    let next_wave = state.wave + 1;
    if next_wave > VICTORY_WAVE {
        state.has_won = true;
        state.phase = Phase::Victory;
        log::info!("Survived all {} nights", VICTORY_WAVE);
        return Ok(WaveStart::Victory);
    }

    state.wave = next_wave;
    state.phase = Phase::Prep;
    state.prep_remaining = PREP_TIME_SECONDS;
    log::info!("Wave {}: {}", next_wave, wave_title(next_wave));

    if state.preferences.auto_skip_prep {
        let enemies = spawn_wave(state);
        return Ok(WaveStart::Spawned {
            wave: next_wave,
            enemies,
        });
    }
    Ok(WaveStart::Prep { wave: next_wave })
}

/// One second of prep countdown; spawns the wave when it runs out
pub fn prep_second(state: &mut GameState) -> Result<PrepProgress, ActionError> {
    if state.phase != Phase::Prep {
        return Err(ActionError::WrongPhase);
    }
    if state.preferences.auto_skip_prep || state.prep_remaining <= 1 {
        let enemies = spawn_wave(state);
        return Ok(PrepProgress::Spawned {
            wave: state.wave,
            enemies,
        });
    }
    state.prep_remaining -= 1;
    Ok(PrepProgress::Counting {
        remaining: state.prep_remaining,
    })
}

/// Skip the rest of the countdown
pub fn skip_prep(state: &mut GameState) -> Result<usize, ActionError> {
    if state.phase != Phase::Prep {
        return Err(ActionError::WrongPhase);
    }
    Ok(spawn_wave(state))
}

fn spawn_wave(state: &mut GameState) -> usize {
    let difficulty = state.difficulty.unwrap_or_default();
    state.enemies = generate_wave(state.wave, difficulty);
    state.prep_remaining = 0;
    state.phase = Phase::WaveActive;
    log::info!("Wave {} spawned ({} enemies)", state.wave, state.enemies.len());
    state.enemies.len()
}

/// Start the night over, keeping towers, inventory, coins and potions
pub fn restart_shift(state: &mut GameState) {
    state.health = STARTING_HEALTH;
    state.wave = 0;
    state.is_game_over = false;
    state.has_won = false;
    state.reset_transient();
    log::info!("Shift restarted");
}

/// Wipe everything back to a new session
pub fn reset_session(state: &mut GameState) {
    *state = GameState::new();
    log::info!("Session reset");
}

/// Surrender the current run
pub fn give_up(state: &mut GameState) {
    state.health = 0;
    state.is_game_over = true;
    state.enemies.clear();
    state.projectiles.clear();
    state.prep_remaining = 0;
    state.phase = Phase::Defeat;
    log::info!("Gave up on wave {}", state.wave);
}

/// Terminal override commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Credit [`ADMIN_COIN_GRANT`] coins
    GrantCoins,
    /// Full session reset
    Reset,
    /// Write the save immediately
    Save,
}

impl AdminCommand {
    /// Case-insensitive; anything else is not a command
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "freddy" => Some(AdminCommand::GrantCoins),
            "reset" => Some(AdminCommand::Reset),
            "save" => Some(AdminCommand::Save),
            _ => None,
        }
    }
}

/// Dismiss the victory screen and keep playing
pub fn continue_after_victory(state: &mut GameState) -> Result<(), ActionError> {
    if state.phase != Phase::Victory {
        return Err(ActionError::WrongPhase);
    }
    state.has_won = false;
    state.phase = Phase::Idle;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Lifecycle;

    fn ready(difficulty: Difficulty) -> GameState {
        let mut state = GameState::new();
        select_difficulty(&mut state, difficulty).unwrap();
        state
    }

    #[test]
    fn test_difficulty_chosen_once() {
        let mut state = GameState::new();
        assert_eq!(start_wave(&mut state), Err(ActionError::DifficultyNotChosen));
        select_difficulty(&mut state, Difficulty::Hard).unwrap();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(
            select_difficulty(&mut state, Difficulty::Easy),
            Err(ActionError::DifficultyAlreadyChosen)
        );
        assert_eq!(state.difficulty, Some(Difficulty::Hard));
    }

    #[test]
    fn test_start_wave_enters_prep() {
        let mut state = ready(Difficulty::Medium);
        assert_eq!(start_wave(&mut state), Ok(WaveStart::Prep { wave: 1 }));
        assert_eq!(state.wave, 1);
        assert_eq!(state.phase, Phase::Prep);
        assert_eq!(state.prep_remaining, PREP_TIME_SECONDS);
        assert!(state.enemies.is_empty());
        assert_eq!(start_wave(&mut state), Err(ActionError::WrongPhase));
    }

    #[test]
    fn test_prep_countdown_spawns_at_end() {
        let mut state = ready(Difficulty::Medium);
        start_wave(&mut state).unwrap();
        for expected in (1..PREP_TIME_SECONDS).rev() {
            assert_eq!(
                prep_second(&mut state),
                Ok(PrepProgress::Counting { remaining: expected })
            );
        }
        assert_eq!(
            prep_second(&mut state),
            Ok(PrepProgress::Spawned { wave: 1, enemies: 8 })
        );
        assert_eq!(state.phase, Phase::WaveActive);
        assert_eq!(state.prep_remaining, 0);
        assert_eq!(prep_second(&mut state), Err(ActionError::WrongPhase));
    }

    #[test]
    fn test_auto_skip_spawns_immediately() {
        let mut state = ready(Difficulty::Medium);
        state.preferences.auto_skip_prep = true;
        assert_eq!(
            start_wave(&mut state),
            Ok(WaveStart::Spawned { wave: 1, enemies: 8 })
        );
        assert!(state.is_wave_active());
        assert_eq!(state.enemies[1].lifecycle, Lifecycle::NotYetVisible);
    }

    #[test]
    fn test_skip_prep() {
        let mut state = ready(Difficulty::BossRush);
        assert_eq!(skip_prep(&mut state), Err(ActionError::WrongPhase));
        start_wave(&mut state).unwrap();
        assert_eq!(skip_prep(&mut state), Ok(2));
        assert!(state.enemies.iter().all(|e| e.is_boss()));
    }

    #[test]
    fn test_victory_past_final_wave() {
        let mut state = ready(Difficulty::Easy);
        state.wave = VICTORY_WAVE;
        assert_eq!(start_wave(&mut state), Ok(WaveStart::Victory));
        assert!(state.has_won);
        assert_eq!(state.phase, Phase::Victory);
        assert_eq!(state.wave, VICTORY_WAVE);

        continue_after_victory(&mut state).unwrap();
        assert!(!state.has_won);
        assert_eq!(state.phase, Phase::Idle);
        // Still past the final wave
        assert_eq!(start_wave(&mut state), Ok(WaveStart::Victory));
    }

    #[test]
    fn test_continue_requires_victory() {
        let mut state = ready(Difficulty::Easy);
        assert_eq!(continue_after_victory(&mut state), Err(ActionError::WrongPhase));
    }

    #[test]
    fn test_give_up_then_restart_shift() {
        let mut state = ready(Difficulty::Medium);
        state.coins = 1234;
        start_wave(&mut state).unwrap();
        skip_prep(&mut state).unwrap();
        state.tick = 99;

        give_up(&mut state);
        assert_eq!(state.phase, Phase::Defeat);
        assert_eq!(state.health, 0);
        assert!(state.enemies.is_empty());
        assert_eq!(start_wave(&mut state), Err(ActionError::WrongPhase));

        restart_shift(&mut state);
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.health, STARTING_HEALTH);
        assert_eq!(state.wave, 0);
        assert_eq!(state.tick, 0);
        assert_eq!(state.coins, 1234);
        assert_eq!(state.difficulty, Some(Difficulty::Medium));
    }

    #[test]
    fn test_reset_session() {
        let mut state = ready(Difficulty::Extreme);
        state.coins = 9;
        state.inventory.insert("bonnie".into());
        reset_session(&mut state);
        assert_eq!(state.phase, Phase::AwaitingDifficulty);
        assert_eq!(state.difficulty, None);
        assert_eq!(state.coins, STARTING_COINS);
        assert_eq!(state.inventory.len(), 1);
    }

    #[test]
    fn test_admin_command_parse() {
        assert_eq!(AdminCommand::parse("freddy"), Some(AdminCommand::GrantCoins));
        assert_eq!(AdminCommand::parse("FREDDY"), Some(AdminCommand::GrantCoins));
        assert_eq!(AdminCommand::parse(" Reset "), Some(AdminCommand::Reset));
        assert_eq!(AdminCommand::parse("save"), Some(AdminCommand::Save));
        assert_eq!(AdminCommand::parse("fredd"), None);
        assert_eq!(AdminCommand::parse(""), None);
    }
}
